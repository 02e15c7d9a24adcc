use super::util::{endpoint_url, get_json};
use crate::core::{ProviderId, QuoteProvider};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::instrument;

/// Financial Modeling Prep quote endpoint. Responds with an array of quotes.
pub struct FmpProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl FmpProvider {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl QuoteProvider for FmpProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Fmp
    }

    #[instrument(name = "FmpFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_raw(&self, symbol: &str) -> Result<Value> {
        let url = endpoint_url(&self.base_url, &["api", "v3", "quote", symbol])?;
        get_json(&self.client, &url, &[("apikey", &self.api_key)])
            .await
            .with_context(|| format!("Financial Modeling Prep request failed for {symbol}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::util::build_client;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_quote_array() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/quote/MSFT"))
            .and(query_param("apikey", "fmp-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"[{"symbol": "MSFT", "price": 410.5}]"#),
            )
            .mount(&mock_server)
            .await;

        let provider = FmpProvider::new(build_client().unwrap(), &mock_server.uri(), "fmp-key");
        let raw = provider.fetch_raw("MSFT").await.unwrap();
        assert_eq!(raw[0]["price"], 410.5);
    }

    #[tokio::test]
    async fn test_empty_array_is_returned_as_is() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/quote/ZZZZ"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&mock_server)
            .await;

        let provider = FmpProvider::new(build_client().unwrap(), &mock_server.uri(), "fmp-key");
        let raw = provider.fetch_raw("ZZZZ").await.unwrap();
        assert_eq!(raw, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_symbol_is_a_single_path_segment() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/quote/BRK%2FB"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"symbol": "BRK/B"}]"#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = FmpProvider::new(build_client().unwrap(), &mock_server.uri(), "fmp-key");
        let raw = provider.fetch_raw("BRK/B").await.unwrap();
        assert_eq!(raw[0]["symbol"], "BRK/B");
    }
}
