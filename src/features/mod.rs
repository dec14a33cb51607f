//! Feature Engine - Technical indicators computed from candle closes
//!
//! Currently only RSI (Wilder's smoothing), used to classify each timeframe.

pub mod rsi;

pub use rsi::{RsiEngine, RSI_PERIOD};
