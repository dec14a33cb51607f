//! Error taxonomy
//!
//! `AnalysisError` failures stay local to one timeframe and end up as data in
//! the report. `NotifyError` is surfaced with the run outcome but never
//! changes the verdict.

use std::time::Duration;
use thiserror::Error;

/// Why a single timeframe could not produce an RSI reading
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Transport-level failure reaching the candle source
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// The candle source answered with an API error
    #[error("source rejected request ({code}): {message}")]
    SourceRejected { code: String, message: String },

    /// The reply could not be interpreted as a candle series
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error("insufficient data: need {required} closes, got {available}")]
    InsufficientData { required: usize, available: usize },

    /// Every RSI value in the series is undefined (prices never moved)
    #[error("no price movement in the RSI window")]
    NoPriceMovement,
}

/// Alert delivery failures
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("alert delivery failed: {0}")]
    DeliveryFailure(String),

    #[error("alert rejected (HTTP {status}): {description}")]
    Rejected { status: u16, description: String },

    #[error("missing credential: {0}")]
    MissingCredentials(&'static str),
}

impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        // Request URLs can embed credentials
        NotifyError::DeliveryFailure(e.without_url().to_string())
    }
}
