//! Core types used throughout RsiBot
//!
//! Defines candles, timeframes, per-timeframe classifications and verdicts.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AnalysisError;

/// Supported timeframes, in their canonical report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    M1,
    M5,
    H1,
    H4,
    D1,
    W1,
    MN,
}

impl Timeframe {
    /// Every timeframe, smallest granularity first
    pub const ALL: [Timeframe; 7] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
        Timeframe::W1,
        Timeframe::MN,
    ];

    /// Candle granularity in seconds
    pub fn granularity_secs(&self) -> u64 {
        match self {
            Timeframe::M1 => 60,
            Timeframe::M5 => 5 * 60,
            Timeframe::H1 => 60 * 60,
            Timeframe::H4 => 4 * 60 * 60,
            Timeframe::D1 => 24 * 60 * 60,
            Timeframe::W1 => 7 * 24 * 60 * 60,
            Timeframe::MN => 30 * 24 * 60 * 60,
        }
    }

    /// Short label used in config and reports
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
            Timeframe::W1 => "W1",
            Timeframe::MN => "MN",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "M1" => Some(Timeframe::M1),
            "M5" => Some(Timeframe::M5),
            "H1" => Some(Timeframe::H1),
            "H4" => Some(Timeframe::H4),
            "D1" => Some(Timeframe::D1),
            "W1" => Some(Timeframe::W1),
            "MN" => Some(Timeframe::MN),
            _ => None,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One OHLC bar as delivered by the candle source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bar open time, seconds since epoch
    pub epoch: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite())
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.epoch, 0).single()
    }
}

/// Candles for one timeframe, oldest first, strictly increasing in time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Build a series, rejecting out-of-order, duplicated or non-finite bars
    pub fn new(candles: Vec<Candle>) -> Result<Self, AnalysisError> {
        if let Some(bad) = candles.iter().find(|c| !c.is_finite()) {
            return Err(AnalysisError::MalformedResponse(format!(
                "non-finite price in candle at epoch {}",
                bad.epoch
            )));
        }
        if let Some(pair) = candles.windows(2).find(|w| w[1].epoch <= w[0].epoch) {
            return Err(AnalysisError::MalformedResponse(format!(
                "candles not strictly increasing in time ({} then {})",
                pair[0].epoch, pair[1].epoch
            )));
        }
        Ok(Self { candles })
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Close prices in chronological order
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }
}

/// Qualitative state of one timeframe's latest RSI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Classification {
    Oversold,
    Overbought,
    Neutral,
    /// The timeframe could not be analyzed; carries the failure message
    Error(String),
}

impl Classification {
    pub fn is_error(&self) -> bool {
        matches!(self, Classification::Error(_))
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Oversold => write!(f, "Oversold"),
            Classification::Overbought => write!(f, "Overbought"),
            Classification::Neutral => write!(f, "Neutral"),
            Classification::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// One timeframe's result for a run
#[derive(Debug, Clone, PartialEq)]
pub struct TimeframeReading {
    pub timeframe: Timeframe,
    /// Latest RSI, absent when the timeframe failed
    pub rsi: Option<f64>,
    pub classification: Classification,
}

impl TimeframeReading {
    pub fn ok(timeframe: Timeframe, rsi: f64, classification: Classification) -> Self {
        Self {
            timeframe,
            rsi: Some(rsi),
            classification,
        }
    }

    pub fn failed(timeframe: Timeframe, error: &AnalysisError) -> Self {
        Self {
            timeframe,
            rsi: None,
            classification: Classification::Error(error.to_string()),
        }
    }
}

/// Cross-timeframe snapshot for one run, in configured timeframe order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisReport {
    pub symbol: String,
    readings: Vec<TimeframeReading>,
}

impl AnalysisReport {
    pub fn new(symbol: impl Into<String>, readings: Vec<TimeframeReading>) -> Self {
        Self {
            symbol: symbol.into(),
            readings,
        }
    }

    pub fn readings(&self) -> &[TimeframeReading] {
        &self.readings
    }

    pub fn get(&self, timeframe: Timeframe) -> Option<&TimeframeReading> {
        self.readings.iter().find(|r| r.timeframe == timeframe)
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.readings
            .iter()
            .filter(|r| r.classification.is_error())
            .count()
    }
}

/// Directional verdict across all timeframes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    BuySignal,
    SellSignal,
    NoConsensus,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::BuySignal => write!(f, "BUY"),
            Verdict::SellSignal => write!(f, "SELL"),
            Verdict::NoConsensus => write!(f, "NONE"),
        }
    }
}
