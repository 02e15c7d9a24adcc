use super::util::{endpoint_url, get_json};
use crate::core::{ProviderId, QuoteProvider};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::instrument;

/// EOD Historical Data real-time endpoint. Symbols are suffixed with the exchange code.
pub struct EodhdProvider {
    client: Client,
    base_url: String,
    api_token: String,
    exchange: String,
    fmt: String,
}

impl EodhdProvider {
    pub fn new(client: Client, base_url: &str, api_token: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_token: api_token.to_string(),
            exchange: "US".to_string(),
            fmt: "json".to_string(),
        }
    }

    pub fn with_exchange(mut self, exchange: &str) -> Self {
        self.exchange = exchange.to_string();
        self
    }

    pub fn with_format(mut self, fmt: &str) -> Self {
        self.fmt = fmt.to_string();
        self
    }
}

#[async_trait]
impl QuoteProvider for EodhdProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Eodhd
    }

    #[instrument(name = "EodhdFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_raw(&self, symbol: &str) -> Result<Value> {
        let code = format!("{}.{}", symbol, self.exchange);
        let url = endpoint_url(&self.base_url, &["api", "real-time", &code])?;
        get_json(
            &self.client,
            &url,
            &[("api_token", &self.api_token), ("fmt", &self.fmt)],
        )
        .await
        .with_context(|| format!("EOD Historical Data request failed for {symbol}"))
    }
}
