//! Deriv WebSocket client for historical candles
//!
//! Opens one connection per request, sends a `ticks_history` request in
//! candle style and waits for the matching reply.
//!
//! Documentation: https://api.deriv.com/api-explorer#ticks_history

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::config::OracleConfig;
use crate::error::AnalysisError;
use crate::oracle::sources::CandleSource;
use crate::types::{Candle, CandleSeries};

pub const DERIV_WS_URL: &str = "wss://ws.derivws.com/websockets/v3";
pub const DERIV_APP_ID: u32 = 1089;

/// `ticks_history` request in candle style, never subscribing
#[derive(Debug, Clone, Serialize)]
struct TicksHistoryRequest<'a> {
    ticks_history: &'a str,
    style: &'static str,
    granularity: u64,
    count: usize,
    end: &'static str,
    subscribe: u8,
    req_id: u64,
}

/// Reply envelope; candles arrive top-level or nested under `history`
#[derive(Debug, Clone, Deserialize)]
struct DerivReply {
    candles: Option<Vec<DerivCandle>>,
    history: Option<DerivHistory>,
    error: Option<DerivApiError>,
    req_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct DerivHistory {
    candles: Option<Vec<DerivCandle>>,
}

#[derive(Debug, Clone, Deserialize)]
struct DerivApiError {
    code: String,
    message: String,
}

#[derive(Debug, Clone, Deserialize)]
struct DerivCandle {
    epoch: i64,
    #[serde(deserialize_with = "de_price")]
    open: f64,
    #[serde(deserialize_with = "de_price")]
    high: f64,
    #[serde(deserialize_with = "de_price")]
    low: f64,
    #[serde(deserialize_with = "de_price")]
    close: f64,
}

impl From<DerivCandle> for Candle {
    fn from(c: DerivCandle) -> Self {
        Candle {
            epoch: c.epoch,
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
        }
    }
}

/// Prices come as JSON numbers, occasionally as numeric strings; both must be finite
fn de_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Str(String),
    }

    let price = match Raw::deserialize(deserializer)? {
        Raw::Num(v) => v,
        Raw::Str(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom)?,
    };
    if !price.is_finite() {
        return Err(serde::de::Error::custom(format!("non-finite price {}", price)));
    }
    Ok(price)
}

#[derive(Debug)]
pub struct DerivClient {
    ws_url: String,
    app_id: u32,
    next_req_id: AtomicU64,
}

impl Default for DerivClient {
    fn default() -> Self {
        Self::new(DERIV_WS_URL, DERIV_APP_ID)
    }
}

impl DerivClient {
    pub fn new(ws_url: &str, app_id: u32) -> Self {
        Self {
            ws_url: ws_url.trim_end_matches('/').to_string(),
            app_id,
            next_req_id: AtomicU64::new(1),
        }
    }

    pub fn from_config(config: &OracleConfig) -> Self {
        Self::new(&config.ws_url, config.app_id)
    }

    fn endpoint(&self) -> String {
        format!("{}?app_id={}", self.ws_url, self.app_id)
    }

    /// Interpret one text frame. `None` means the frame is not our reply;
    /// a reply tagged with our `req_id` always yields a result.
    fn parse_reply(text: &str, req_id: u64) -> Option<Result<CandleSeries, AnalysisError>> {
        let reply: DerivReply = match serde_json::from_str(text) {
            Ok(reply) => reply,
            Err(e) => return Some(Err(AnalysisError::MalformedResponse(e.to_string()))),
        };

        if reply.req_id.is_some_and(|id| id != req_id) {
            return None;
        }

        if let Some(err) = reply.error {
            return Some(Err(AnalysisError::SourceRejected {
                code: err.code,
                message: err.message,
            }));
        }

        let ours = reply.req_id == Some(req_id);
        let candles = match reply.candles.or_else(|| reply.history.and_then(|h| h.candles)) {
            Some(candles) => candles,
            None if ours => {
                return Some(Err(AnalysisError::MalformedResponse(
                    "reply carries no candles".to_string(),
                )))
            }
            None => return None,
        };
        Some(CandleSeries::new(
            candles.into_iter().map(Candle::from).collect(),
        ))
    }
}

#[async_trait]
impl CandleSource for DerivClient {
    fn name(&self) -> &'static str {
        "Deriv"
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        granularity_secs: u64,
        count: usize,
    ) -> Result<CandleSeries, AnalysisError> {
        let req_id = self.next_req_id.fetch_add(1, Ordering::Relaxed);
        let request = serde_json::to_string(&TicksHistoryRequest {
            ticks_history: symbol,
            style: "candles",
            granularity: granularity_secs,
            count,
            end: "latest",
            subscribe: 0,
            req_id,
        })
        .map_err(|e| AnalysisError::SourceUnavailable(format!("failed to encode request: {}", e)))?;

        tracing::debug!(
            source = %"Deriv",
            url = %self.ws_url,
            symbol = %symbol,
            granularity = granularity_secs,
            req_id = req_id,
            "Connecting to Deriv WebSocket..."
        );

        let (mut ws, _) = connect_async(self.endpoint())
            .await
            .map_err(|e| AnalysisError::SourceUnavailable(e.to_string()))?;

        ws.send(Message::Text(request))
            .await
            .map_err(|e| AnalysisError::SourceUnavailable(e.to_string()))?;

        let result = loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    if let Some(result) = Self::parse_reply(&text, req_id) {
                        break result;
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = ws.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | None => {
                    break Err(AnalysisError::SourceUnavailable(
                        "connection closed before reply".to_string(),
                    ));
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => break Err(AnalysisError::SourceUnavailable(e.to_string())),
            }
        };

        let _ = ws.close(None).await;

        if let Ok(series) = &result {
            tracing::debug!(
                source = %"Deriv",
                symbol = %symbol,
                granularity = granularity_secs,
                count = series.len(),
                "✅ Candles received"
            );
        }

        result
    }
}
