//! Strategy - RSI zone classification and cross-timeframe consensus
//!
//! Each timeframe's latest RSI is mapped to a zone with strict thresholds
//! (a value exactly on a threshold is neutral). The consensus module then
//! counts agreeing zones across timeframes.

pub mod consensus;
pub use consensus::{render_report, Consensus, ConsensusEvaluator, TextMode, MIN_CONSENSUS};

use anyhow::{bail, Result};

use crate::types::Classification;

/// Default oversold threshold
pub const RSI_OVERSOLD: f64 = 30.0;
/// Default overbought threshold
pub const RSI_OVERBOUGHT: f64 = 70.0;

/// RSI zone boundaries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiThresholds {
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for RsiThresholds {
    fn default() -> Self {
        Self {
            oversold: RSI_OVERSOLD,
            overbought: RSI_OVERBOUGHT,
        }
    }
}

impl RsiThresholds {
    pub fn new(oversold: f64, overbought: f64) -> Result<Self> {
        if !(0.0..=100.0).contains(&oversold) || !(0.0..=100.0).contains(&overbought) {
            bail!(
                "RSI thresholds must lie in [0, 100] (oversold={}, overbought={})",
                oversold,
                overbought
            );
        }
        if oversold >= overbought {
            bail!(
                "oversold threshold {} must be below overbought threshold {}",
                oversold,
                overbought
            );
        }
        Ok(Self {
            oversold,
            overbought,
        })
    }

    /// Classify one RSI value
    pub fn classify(&self, rsi: f64) -> Classification {
        if rsi < self.oversold {
            Classification::Oversold
        } else if rsi > self.overbought {
            Classification::Overbought
        } else {
            Classification::Neutral
        }
    }
}

/// Classify with the default 30/70 thresholds
pub fn classify(rsi: f64) -> Classification {
    RsiThresholds::default().classify(rsi)
}
