//! One analysis run: analyze → evaluate → render → deliver

use anyhow::{Context, Result};
use chrono::Utc;

use crate::analyzer::MultiTimeframeAnalyzer;
use crate::config::AppConfig;
use crate::error::NotifyError;
use crate::notify::{AlertSink, LogSink, TelegramSink};
use crate::oracle::{CandleSource, DerivClient};
use crate::strategy::{render_report, Consensus, ConsensusEvaluator, TextMode};
use crate::types::AnalysisReport;

/// Everything a run produced. A failed delivery leaves the verdict intact.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: AnalysisReport,
    pub consensus: Consensus,
    pub text: String,
    pub delivery: Result<(), NotifyError>,
}

pub struct Pipeline<S> {
    analyzer: MultiTimeframeAnalyzer<S>,
    evaluator: ConsensusEvaluator,
    sink: Box<dyn AlertSink>,
    include_timestamp: bool,
    text_mode: TextMode,
}

impl Pipeline<DerivClient> {
    /// Wire the Deriv source and the configured sink
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        config.validate_env()?;

        let analyzer = MultiTimeframeAnalyzer::new(
            DerivClient::from_config(&config.oracle),
            config.bot.symbol.clone(),
            config.timeframes()?,
        )
        .with_candle_count(config.bot.candle_count)
        .with_rsi(config.rsi_engine())
        .with_thresholds(config.thresholds()?)
        .with_request_timeout(config.request_timeout());

        let sink: Box<dyn AlertSink> = if config.bot.dry_run {
            Box::new(LogSink)
        } else {
            Box::new(
                TelegramSink::from_env(&config.notify)
                    .context("Failed to configure Telegram sink")?,
            )
        };

        Ok(Self::new(analyzer, sink)
            .with_timestamp(config.notify.include_timestamp)
            .with_text_mode(TextMode::from_parse_mode(&config.notify.parse_mode)))
    }
}

impl<S: CandleSource> Pipeline<S> {
    pub fn new(analyzer: MultiTimeframeAnalyzer<S>, sink: Box<dyn AlertSink>) -> Self {
        Self {
            analyzer,
            evaluator: ConsensusEvaluator::default(),
            sink,
            include_timestamp: false,
            text_mode: TextMode::default(),
        }
    }

    pub fn with_evaluator(mut self, evaluator: ConsensusEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_timestamp(mut self, include: bool) -> Self {
        self.include_timestamp = include;
        self
    }

    pub fn with_text_mode(mut self, mode: TextMode) -> Self {
        self.text_mode = mode;
        self
    }

    pub fn sink_name(&self) -> &'static str {
        self.sink.name()
    }

    pub async fn run(&self) -> RunOutcome {
        tracing::info!(
            symbol = %self.analyzer.symbol(),
            timeframes = self.analyzer.timeframes().len(),
            "🟡 Analyzing timeframes..."
        );

        let report = self.analyzer.analyze().await;
        let consensus = self.evaluator.evaluate(&report);
        tracing::info!(
            verdict = %consensus.verdict,
            oversold = consensus.oversold_count,
            overbought = consensus.overbought_count,
            errors = consensus.error_count,
            "🟢 Analysis complete"
        );

        let run_at = self.include_timestamp.then(Utc::now);
        let text = render_report(&report, &consensus, run_at, self.text_mode);

        let delivery = self.sink.deliver(&text).await;
        if let Err(e) = &delivery {
            tracing::error!(sink = %self.sink.name(), error = %e, "❌ Alert delivery failed");
        }

        RunOutcome {
            report,
            consensus,
            text,
            delivery,
        }
    }
}
