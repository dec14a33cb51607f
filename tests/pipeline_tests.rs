//! End-to-end tests for the consensus pipeline with scripted collaborators

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use rsibot::analyzer::MultiTimeframeAnalyzer;
    use rsibot::error::{AnalysisError, NotifyError};
    use rsibot::notify::AlertSink;
    use rsibot::oracle::CandleSource;
    use rsibot::pipeline::{Pipeline, RunOutcome};
    use rsibot::types::{Candle, CandleSeries, Classification, Timeframe, Verdict};

    // ============================================================================
    // Scripted collaborators
    // ============================================================================

    #[derive(Clone)]
    enum Script {
        Closes(Vec<f64>),
        Fail(AnalysisError),
        Hang,
    }

    type CallLog = Arc<Mutex<Vec<(String, u64, usize)>>>;

    /// Candle source answering per granularity from a fixed script
    #[derive(Default)]
    struct ScriptedSource {
        script: HashMap<u64, Script>,
        calls: CallLog,
    }

    impl ScriptedSource {
        fn with(mut self, tf: Timeframe, script: Script) -> Self {
            self.script.insert(tf.granularity_secs(), script);
            self
        }
    }

    #[async_trait]
    impl CandleSource for ScriptedSource {
        fn name(&self) -> &'static str {
            "Scripted"
        }

        async fn fetch_candles(
            &self,
            symbol: &str,
            granularity_secs: u64,
            count: usize,
        ) -> Result<CandleSeries, AnalysisError> {
            self.calls
                .lock()
                .unwrap()
                .push((symbol.to_string(), granularity_secs, count));

            match self.script.get(&granularity_secs).cloned() {
                Some(Script::Closes(closes)) => {
                    let candles = closes
                        .into_iter()
                        .enumerate()
                        .map(|(i, close)| Candle {
                            epoch: granularity_secs as i64 * i as i64,
                            open: close,
                            high: close,
                            low: close,
                            close,
                        })
                        .collect();
                    CandleSeries::new(candles)
                }
                Some(Script::Fail(e)) => Err(e),
                Some(Script::Hang) => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Err(AnalysisError::SourceUnavailable("woke up".into()))
                }
                None => Err(AnalysisError::SourceUnavailable("no script".into())),
            }
        }
    }

    /// Sink that records every alert and optionally fails
    #[derive(Clone, Default)]
    struct RecordingSink {
        sent: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl AlertSink for RecordingSink {
        fn name(&self) -> &'static str {
            "Recording"
        }

        async fn deliver(&self, text: &str) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(text.to_string());
            if self.fail {
                Err(NotifyError::Rejected {
                    status: 429,
                    description: "Too Many Requests: retry after 5".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn falling() -> Script {
        Script::Closes((0..200).map(|i| 1000.0 - i as f64).collect())
    }

    fn rising() -> Script {
        Script::Closes((0..200).map(|i| 1000.0 + i as f64).collect())
    }

    fn choppy() -> Script {
        Script::Closes(
            (0..200)
                .map(|i| if i % 2 == 0 { 1000.0 } else { 1001.0 })
                .collect(),
        )
    }

    async fn run(source: ScriptedSource, sink: RecordingSink) -> (RunOutcome, CallLog) {
        let calls = source.calls.clone();
        let analyzer = MultiTimeframeAnalyzer::new(source, "R_100", Timeframe::ALL.to_vec())
            .with_request_timeout(Duration::from_millis(200));
        let outcome = Pipeline::new(analyzer, Box::new(sink)).run().await;
        (outcome, calls)
    }

    // ============================================================================
    // Consensus
    // ============================================================================

    #[tokio::test]
    async fn two_oversold_timeframes_confirm_buy() {
        let source = ScriptedSource::default()
            .with(Timeframe::M1, falling())
            .with(Timeframe::M5, falling())
            .with(Timeframe::H1, choppy())
            .with(Timeframe::H4, choppy())
            .with(Timeframe::D1, choppy())
            .with(Timeframe::W1, choppy())
            .with(Timeframe::MN, choppy());
        let sink = RecordingSink::default();

        let (outcome, calls) = run(source, sink.clone()).await;

        assert_eq!(outcome.consensus.verdict, Verdict::BuySignal);
        assert_eq!(outcome.consensus.oversold_count, 2);
        assert_eq!(outcome.consensus.overbought_count, 0);
        assert_eq!(sink.sent.lock().unwrap().as_slice(), &[outcome.text.clone()]);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 7);
        assert!(calls.iter().all(|(symbol, _, count)| symbol == "R_100" && *count == 200));
    }

    #[tokio::test]
    async fn overbought_majority_confirms_sell() {
        let source = ScriptedSource::default()
            .with(Timeframe::M1, falling())
            .with(Timeframe::M5, rising())
            .with(Timeframe::H1, rising())
            .with(Timeframe::H4, rising())
            .with(Timeframe::D1, choppy())
            .with(Timeframe::W1, choppy())
            .with(Timeframe::MN, choppy());

        let (outcome, _) = run(source, RecordingSink::default()).await;

        assert_eq!(outcome.consensus.verdict, Verdict::SellSignal);
        assert!(outcome.text.starts_with("🚫 *SELL signal* confirmed"));
    }

    #[tokio::test]
    async fn single_votes_are_no_consensus() {
        let source = ScriptedSource::default()
            .with(Timeframe::M1, falling())
            .with(Timeframe::M5, rising())
            .with(Timeframe::H1, choppy())
            .with(Timeframe::H4, choppy())
            .with(Timeframe::D1, choppy())
            .with(Timeframe::W1, choppy())
            .with(Timeframe::MN, choppy());

        let (outcome, _) = run(source, RecordingSink::default()).await;

        assert_eq!(outcome.consensus.verdict, Verdict::NoConsensus);
        assert!(outcome.text.starts_with("🔍 *No clear consensus*"));
    }

    #[tokio::test]
    async fn simultaneous_consensus_prefers_buy() {
        let source = ScriptedSource::default()
            .with(Timeframe::M1, falling())
            .with(Timeframe::M5, falling())
            .with(Timeframe::H1, rising())
            .with(Timeframe::H4, rising())
            .with(Timeframe::D1, choppy())
            .with(Timeframe::W1, choppy())
            .with(Timeframe::MN, choppy());

        let (outcome, _) = run(source, RecordingSink::default()).await;

        assert_eq!(outcome.consensus.verdict, Verdict::BuySignal);
        assert_eq!(outcome.consensus.overbought_count, 2);
    }

    // ============================================================================
    // Failure isolation
    // ============================================================================

    #[tokio::test]
    async fn one_failed_timeframe_leaves_six_valid() {
        let source = ScriptedSource::default()
            .with(Timeframe::M1, falling())
            .with(Timeframe::M5, choppy())
            .with(Timeframe::H1, rising())
            .with(Timeframe::H4, Script::Fail(AnalysisError::SourceUnavailable("reset".into())))
            .with(Timeframe::D1, choppy())
            .with(Timeframe::W1, choppy())
            .with(Timeframe::MN, falling());

        let (outcome, _) = run(source, RecordingSink::default()).await;

        let report = &outcome.report;
        assert_eq!(report.len(), 7);
        assert_eq!(report.error_count(), 1);
        assert_eq!(
            report.readings().iter().filter(|r| r.rsi.is_some()).count(),
            6
        );
        assert!(report.get(Timeframe::H4).unwrap().classification.is_error());

        assert_eq!(outcome.consensus.verdict, Verdict::BuySignal);
        assert_eq!(outcome.consensus.error_count, 1);
        assert!(outcome
            .text
            .contains("📊 `H4` : RSI n/a → ❌ source unavailable: reset"));
    }

    #[tokio::test]
    async fn slow_timeframe_times_out_without_blocking_others() {
        let source = ScriptedSource::default()
            .with(Timeframe::M1, Script::Hang)
            .with(Timeframe::M5, falling())
            .with(Timeframe::H1, falling())
            .with(Timeframe::H4, choppy())
            .with(Timeframe::D1, choppy())
            .with(Timeframe::W1, Script::Closes(vec![1.0, 2.0, 3.0]))
            .with(Timeframe::MN, choppy());

        let (outcome, _) = run(source, RecordingSink::default()).await;

        assert_eq!(
            outcome.report.get(Timeframe::M1).unwrap().classification,
            Classification::Error(AnalysisError::Timeout(Duration::from_millis(200)).to_string())
        );
        assert_eq!(
            outcome.report.get(Timeframe::W1).unwrap().classification,
            Classification::Error("insufficient data: need 15 closes, got 3".into())
        );
        assert_eq!(outcome.consensus.verdict, Verdict::BuySignal);
    }

    #[tokio::test]
    async fn report_follows_configured_order() {
        let source = ScriptedSource::default()
            .with(Timeframe::M1, Script::Hang)
            .with(Timeframe::MN, Script::Fail(AnalysisError::NoPriceMovement));

        let (outcome, _) = run(source, RecordingSink::default()).await;

        let labels: Vec<String> = outcome
            .text
            .lines()
            .filter_map(|l| l.strip_prefix("📊 `"))
            .map(|l| l[..2].to_string())
            .collect();
        assert_eq!(labels, vec!["M1", "M5", "H1", "H4", "D1", "W1", "MN"]);
        assert_eq!(outcome.consensus.error_count, 7);
    }

    // ============================================================================
    // Delivery and idempotence
    // ============================================================================

    #[tokio::test]
    async fn delivery_failure_is_surfaced_but_verdict_stands() {
        let source = ScriptedSource::default()
            .with(Timeframe::M1, rising())
            .with(Timeframe::M5, rising());
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };

        let (outcome, _) = run(source, sink.clone()).await;

        assert_eq!(outcome.consensus.verdict, Verdict::SellSignal);
        assert!(matches!(
            outcome.delivery,
            Err(NotifyError::Rejected { status: 429, .. })
        ));
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn identical_inputs_give_identical_reports() {
        let build = || {
            ScriptedSource::default()
                .with(Timeframe::M1, falling())
                .with(Timeframe::M5, rising())
                .with(Timeframe::H1, choppy())
                .with(Timeframe::H4, Script::Fail(AnalysisError::SourceRejected {
                    code: "RateLimit".into(),
                    message: "You have reached the rate limit".into(),
                }))
                .with(Timeframe::D1, falling())
                .with(Timeframe::W1, choppy())
                .with(Timeframe::MN, choppy())
        };

        let (first, _) = run(build(), RecordingSink::default()).await;
        let (second, _) = run(build(), RecordingSink::default()).await;

        assert_eq!(first.consensus, second.consensus);
        assert_eq!(first.report, second.report);
        assert_eq!(first.text, second.text);
    }
}
