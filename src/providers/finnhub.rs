use super::util::get_json;
use crate::core::{ProviderId, QuoteProvider};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::instrument;

pub struct FinnhubProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl FinnhubProvider {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl QuoteProvider for FinnhubProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Finnhub
    }

    #[instrument(name = "FinnhubFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_raw(&self, symbol: &str) -> Result<Value> {
        let url = format!("{}/api/v1/quote", self.base_url);
        get_json(
            &self.client,
            &url,
            &[("symbol", symbol), ("token", &self.api_key)],
        )
        .await
        .with_context(|| format!("Finnhub request failed for {symbol}"))
    }
}
