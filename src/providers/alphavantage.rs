use super::util::get_json;
use crate::core::{ProviderId, QuoteProvider};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::instrument;

/// AlphaVantage `GLOBAL_QUOTE` endpoint.
///
/// Values come back as strings keyed like `"02. open"` under `"Global Quote"`.
pub struct AlphaVantageProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    fn id(&self) -> ProviderId {
        ProviderId::AlphaVantage
    }

    #[instrument(name = "AlphaVantageFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_raw(&self, symbol: &str) -> Result<Value> {
        let url = format!("{}/query", self.base_url);
        get_json(
            &self.client,
            &url,
            &[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol),
                ("apikey", &self.api_key),
            ],
        )
        .await
        .with_context(|| format!("AlphaVantage request failed for {symbol}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::util::build_client;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_global_quote() {
        let mock_server = MockServer::start().await;
        let body = r#"{"Global Quote": {"01. symbol": "IBM", "05. price": "152.0"}}"#;
        Mock::given(method("GET"))
            .and(path("/query"))
            .and(query_param("function", "GLOBAL_QUOTE"))
            .and(query_param("symbol", "IBM"))
            .and(query_param("apikey", "demo"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = AlphaVantageProvider::new(build_client().unwrap(), &mock_server.uri(), "demo");
        let raw = provider.fetch_raw("IBM").await.unwrap();
        assert_eq!(raw["Global Quote"]["05. price"], "152.0");
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let provider = AlphaVantageProvider::new(build_client().unwrap(), &mock_server.uri(), "demo");
        let err = provider.fetch_raw("IBM").await.unwrap_err();
        assert_eq!(err.to_string(), "AlphaVantage request failed for IBM");
        assert!(format!("{err:#}").contains("HTTP error: 503 Service Unavailable"));
    }
}
