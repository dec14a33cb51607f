//! RsiBot entry point: one analysis run, then exit

use anyhow::{bail, Result};
use tracing::info;

use rsibot::config::AppConfig;
use rsibot::logging;
use rsibot::pipeline::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    logging::init(&config.logging);

    info!("🚀 RsiBot starting: {}", config);

    let pipeline = Pipeline::from_config(&config)?;
    let outcome = pipeline.run().await;

    info!(
        verdict = %outcome.consensus.verdict,
        sink = %pipeline.sink_name(),
        "📋 Run finished"
    );

    if let Err(e) = outcome.delivery {
        bail!("Alert delivery failed: {}", e);
    }

    info!("✅ Done");
    Ok(())
}
