use super::util::{endpoint_url, get_json};
use crate::core::{ProviderId, QuoteProvider};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use tracing::instrument;

/// Polygon.io aggregates.
///
/// Without a date the previous-day aggregate (`/v2/aggs/ticker/{symbol}/prev`) is
/// requested, otherwise the daily open/close for that date (`/v1/open-close`).
pub struct PolygonProvider {
    client: Client,
    base_url: String,
    api_key: String,
    adjusted: bool,
    date: Option<NaiveDate>,
}

impl PolygonProvider {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            adjusted: true,
            date: None,
        }
    }

    pub fn with_adjusted(mut self, adjusted: bool) -> Self {
        self.adjusted = adjusted;
        self
    }

    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.date = date;
        self
    }

    fn endpoint(&self, symbol: &str) -> Result<String> {
        match self.date {
            Some(date) => {
                let day = date.format("%Y-%m-%d").to_string();
                endpoint_url(&self.base_url, &["v1", "open-close", symbol, &day])
            }
            None => endpoint_url(&self.base_url, &["v2", "aggs", "ticker", symbol, "prev"]),
        }
    }
}

#[async_trait]
impl QuoteProvider for PolygonProvider {
    fn id(&self) -> ProviderId {
        ProviderId::PolygonIo
    }

    #[instrument(name = "PolygonFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_raw(&self, symbol: &str) -> Result<Value> {
        let url = self.endpoint(symbol)?;
        let adjusted = if self.adjusted { "true" } else { "false" };
        get_json(
            &self.client,
            &url,
            &[("adjusted", adjusted), ("apiKey", &self.api_key)],
        )
        .await
        .with_context(|| format!("Polygon.io request failed for {symbol}"))
    }
}
