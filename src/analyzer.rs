//! Multi-timeframe RSI analyzer
//!
//! Fetches candles for every configured timeframe concurrently, computes the
//! latest RSI and classifies it. Each timeframe fails on its own: errors
//! become `Classification::Error` entries and never stop the others. All
//! tasks are joined before the report is returned.

use futures_util::future::join_all;
use std::time::Duration;

use crate::error::AnalysisError;
use crate::features::RsiEngine;
use crate::oracle::CandleSource;
use crate::strategy::RsiThresholds;
use crate::types::{AnalysisReport, Timeframe, TimeframeReading};

pub struct MultiTimeframeAnalyzer<S> {
    source: S,
    symbol: String,
    timeframes: Vec<Timeframe>,
    candle_count: usize,
    rsi: RsiEngine,
    thresholds: RsiThresholds,
    request_timeout: Duration,
}

impl<S: CandleSource> MultiTimeframeAnalyzer<S> {
    pub fn new(source: S, symbol: impl Into<String>, timeframes: Vec<Timeframe>) -> Self {
        Self {
            source,
            symbol: symbol.into(),
            timeframes,
            candle_count: 200,
            rsi: RsiEngine::default(),
            thresholds: RsiThresholds::default(),
            request_timeout: Duration::from_secs(15),
        }
    }

    pub fn with_candle_count(mut self, count: usize) -> Self {
        self.candle_count = count;
        self
    }

    pub fn with_rsi(mut self, rsi: RsiEngine) -> Self {
        self.rsi = rsi;
        self
    }

    pub fn with_thresholds(mut self, thresholds: RsiThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframes(&self) -> &[Timeframe] {
        &self.timeframes
    }

    /// Analyze every timeframe; readings keep the configured order
    pub async fn analyze(&self) -> AnalysisReport {
        let readings = join_all(self.timeframes.iter().map(|&tf| self.analyze_timeframe(tf))).await;
        AnalysisReport::new(self.symbol.clone(), readings)
    }

    async fn analyze_timeframe(&self, timeframe: Timeframe) -> TimeframeReading {
        match self.latest_rsi(timeframe).await {
            Ok(rsi) => {
                let classification = self.thresholds.classify(rsi);
                tracing::debug!(
                    timeframe = %timeframe,
                    rsi = rsi,
                    zone = %classification,
                    "RSI computed"
                );
                TimeframeReading::ok(timeframe, rsi, classification)
            }
            Err(e) => {
                tracing::warn!(timeframe = %timeframe, error = %e, "⚠️ Timeframe analysis failed");
                TimeframeReading::failed(timeframe, &e)
            }
        }
    }

    async fn latest_rsi(&self, timeframe: Timeframe) -> Result<f64, AnalysisError> {
        let fetch = self.source.fetch_candles(
            &self.symbol,
            timeframe.granularity_secs(),
            self.candle_count,
        );
        let series = tokio::time::timeout(self.request_timeout, fetch)
            .await
            .map_err(|_| AnalysisError::Timeout(self.request_timeout))??;

        let closes = series.closes();
        let surplus = closes.len().saturating_sub(self.candle_count);
        if surplus > 0 {
            tracing::debug!(
                timeframe = %timeframe,
                requested = self.candle_count,
                received = closes.len(),
                "Source returned extra candles, keeping the most recent"
            );
        }

        self.rsi.latest(&closes[surplus..])
    }
}
