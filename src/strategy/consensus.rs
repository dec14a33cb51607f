//! Cross-timeframe consensus and Telegram report rendering

use chrono::{DateTime, Utc};
use std::fmt::Write as _;

use crate::types::{AnalysisReport, Classification, Verdict};

/// Minimum number of agreeing timeframes for a directional verdict
pub const MIN_CONSENSUS: usize = 2;

/// Aggregated zone counts and the resulting verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consensus {
    pub verdict: Verdict,
    pub oversold_count: usize,
    pub overbought_count: usize,
    pub error_count: usize,
}

impl Consensus {
    pub fn headline(&self, mode: TextMode) -> String {
        let (icon, label, suffix) = match self.verdict {
            Verdict::BuySignal => ("✅", "BUY signal", " confirmed"),
            Verdict::SellSignal => ("🚫", "SELL signal", " confirmed"),
            Verdict::NoConsensus => ("🔍", "No clear consensus", ""),
        };
        format!("{} {}{}", icon, mode.bold(label), suffix)
    }
}

/// Markup flavour of the rendered alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode {
    /// Telegram legacy Markdown
    #[default]
    Markdown,
    /// No markup, nothing escaped
    Plain,
}

impl TextMode {
    /// Map a Telegram `parse_mode`; anything but legacy Markdown renders plain
    pub fn from_parse_mode(parse_mode: &str) -> Self {
        if parse_mode.trim().eq_ignore_ascii_case("markdown") {
            TextMode::Markdown
        } else {
            TextMode::Plain
        }
    }

    fn bold(self, text: &str) -> String {
        match self {
            TextMode::Markdown => format!("*{}*", text),
            TextMode::Plain => text.to_string(),
        }
    }

    fn code(self, text: &str) -> String {
        match self {
            TextMode::Markdown => format!("`{}`", text),
            TextMode::Plain => text.to_string(),
        }
    }

    fn escape(self, text: &str) -> String {
        match self {
            TextMode::Markdown => escape_markdown(text),
            TextMode::Plain => text.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConsensusEvaluator {
    min_agreement: usize,
}

impl Default for ConsensusEvaluator {
    fn default() -> Self {
        Self::new(MIN_CONSENSUS)
    }
}

impl ConsensusEvaluator {
    pub fn new(min_agreement: usize) -> Self {
        Self { min_agreement }
    }

    pub fn min_agreement(&self) -> usize {
        self.min_agreement
    }

    pub fn evaluate(&self, report: &AnalysisReport) -> Consensus {
        self.evaluate_classifications(report.readings().iter().map(|r| &r.classification))
    }

    /// Buy is checked before sell, so buy wins when both reach the minimum
    pub fn evaluate_classifications<'a>(
        &self,
        classifications: impl IntoIterator<Item = &'a Classification>,
    ) -> Consensus {
        let (mut oversold, mut overbought, mut errors) = (0, 0, 0);
        for c in classifications {
            match c {
                Classification::Oversold => oversold += 1,
                Classification::Overbought => overbought += 1,
                Classification::Error(_) => errors += 1,
                Classification::Neutral => {}
            }
        }

        let verdict = if oversold >= self.min_agreement {
            Verdict::BuySignal
        } else if overbought >= self.min_agreement {
            Verdict::SellSignal
        } else {
            Verdict::NoConsensus
        };

        Consensus {
            verdict,
            oversold_count: oversold,
            overbought_count: overbought,
            error_count: errors,
        }
    }
}

/// Render the alert text
///
/// Lines follow the report's timeframe order. `run_at` adds a timestamp
/// footer; without it the output is a pure function of its inputs.
pub fn render_report(
    report: &AnalysisReport,
    consensus: &Consensus,
    run_at: Option<DateTime<Utc>>,
    mode: TextMode,
) -> String {
    let mut msg = String::new();
    let _ = writeln!(msg, "{}", consensus.headline(mode));
    let _ = writeln!(
        msg,
        "{} · oversold {} · overbought {} · errors {}",
        mode.code(&report.symbol),
        consensus.oversold_count,
        consensus.overbought_count,
        consensus.error_count
    );
    msg.push('\n');

    for reading in report.readings() {
        let value = match reading.rsi {
            Some(rsi) => format!("{:.2}", rsi),
            None => "n/a".to_string(),
        };
        let _ = writeln!(
            msg,
            "📊 {} : RSI {} → {}",
            mode.code(reading.timeframe.label()),
            value,
            zone_label(&reading.classification, mode)
        );
    }

    if let Some(ts) = run_at {
        let _ = write!(msg, "\n🕒 {}", ts.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    msg
}

fn zone_label(classification: &Classification, mode: TextMode) -> String {
    match classification {
        Classification::Oversold => "🔻 Oversold".to_string(),
        Classification::Overbought => "🔺 Overbought".to_string(),
        Classification::Neutral => "➖ Neutral".to_string(),
        Classification::Error(msg) => format!("❌ {}", mode.escape(msg)),
    }
}

/// Escape legacy-Markdown entity characters outside code spans
fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
