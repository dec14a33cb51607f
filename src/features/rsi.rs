//! RSI (Relative Strength Index) with Wilder's smoothing
//!
//! The first value is seeded with the simple mean of the first `period`
//! gains/losses and lands at index `period`; every later value uses
//! `avg = (prev * (period - 1) + current) / period`.

use crate::error::AnalysisError;

/// Default RSI window
pub const RSI_PERIOD: usize = 14;

/// Stateless RSI calculator over a closing-price sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsiEngine {
    period: usize,
}

impl Default for RsiEngine {
    fn default() -> Self {
        Self::new(RSI_PERIOD)
    }
}

impl RsiEngine {
    /// `period` must be at least 1; config validation enforces this
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Minimum number of closes before a value can exist
    pub fn required_closes(&self) -> usize {
        self.period + 1
    }

    /// RSI aligned to `closes`: `None` before the window fills and wherever
    /// both averages are zero. Every close must be finite.
    pub fn series(&self, closes: &[f64]) -> Result<Vec<Option<f64>>, AnalysisError> {
        if let Some(i) = closes.iter().position(|c| !c.is_finite()) {
            return Err(AnalysisError::MalformedResponse(format!(
                "non-finite close {} at index {}",
                closes[i], i
            )));
        }
        if closes.len() < self.required_closes() {
            return Err(AnalysisError::InsufficientData {
                required: self.required_closes(),
                available: closes.len(),
            });
        }

        let period = self.period as f64;
        let mut out = vec![None; closes.len()];

        let (mut avg_gain, mut avg_loss) = (1..=self.period)
            .map(|i| split_change(closes[i] - closes[i - 1]))
            .fold((0.0, 0.0), |(g, l), (gain, loss)| (g + gain, l + loss));
        avg_gain /= period;
        avg_loss /= period;
        out[self.period] = rsi_from_averages(avg_gain, avg_loss);

        for i in (self.period + 1)..closes.len() {
            let (gain, loss) = split_change(closes[i] - closes[i - 1]);
            avg_gain = (avg_gain * (period - 1.0) + gain) / period;
            avg_loss = (avg_loss * (period - 1.0) + loss) / period;
            out[i] = rsi_from_averages(avg_gain, avg_loss);
        }

        Ok(out)
    }

    /// Last defined RSI value of the series
    pub fn latest(&self, closes: &[f64]) -> Result<f64, AnalysisError> {
        self.series(closes)?
            .into_iter()
            .rev()
            .flatten()
            .next()
            .ok_or(AnalysisError::NoPriceMovement)
    }
}

fn split_change(change: f64) -> (f64, f64) {
    if change > 0.0 {
        (change, 0.0)
    } else {
        (0.0, -change)
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        // Flat window has no defined RSI
        return if avg_gain == 0.0 { None } else { Some(100.0) };
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}
