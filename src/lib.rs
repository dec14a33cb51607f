//! RsiBot Library
//!
//! Multi-timeframe RSI consensus alerts for a single Deriv instrument

pub mod analyzer;
pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod notify;
pub mod oracle;
pub mod pipeline;
pub mod strategy;
pub mod types;
