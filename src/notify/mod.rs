//! Alert delivery
//!
//! The rendered report is handed to an [`AlertSink`]. Delivery is best
//! effort: the verdict is already computed when a sink fails.

mod telegram;

pub use telegram::TelegramSink;

use async_trait::async_trait;

use crate::error::NotifyError;

/// Trait for alert destinations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Get the sink name
    fn name(&self) -> &'static str;

    /// Deliver one alert text
    async fn deliver(&self, text: &str) -> Result<(), NotifyError>;
}

/// Dry-run sink: logs the alert instead of sending it
#[derive(Debug, Clone, Default)]
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    fn name(&self) -> &'static str {
        "Log"
    }

    async fn deliver(&self, text: &str) -> Result<(), NotifyError> {
        tracing::info!(sink = %"Log", "📝 [DRY RUN] Alert not sent:\n{}", text);
        Ok(())
    }
}
