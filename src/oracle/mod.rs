//! Oracle module - historical candle sources
//!
//! The analyzer only needs "N candles at this granularity"; how a source
//! subscribes, frames requests or closes connections stays behind
//! [`CandleSource`].

pub mod sources;

pub use sources::{CandleSource, DerivClient};
