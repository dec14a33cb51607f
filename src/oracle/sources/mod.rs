//! Candle source implementations (Deriv)

mod deriv;

pub use deriv::DerivClient;

use async_trait::async_trait;

use crate::error::AnalysisError;
use crate::types::CandleSeries;

/// Trait for historical candle providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Get the source name
    fn name(&self) -> &'static str;

    /// Fetch the most recent `count` candles, oldest first
    async fn fetch_candles(
        &self,
        symbol: &str,
        granularity_secs: u64,
        count: usize,
    ) -> Result<CandleSeries, AnalysisError>;
}
