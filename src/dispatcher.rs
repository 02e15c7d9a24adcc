//! Invocation entry point: resolves the ticker, runs the aggregator and delivers the result.

use crate::aggregator::Aggregator;
use crate::core::TickerPolicy;
use crate::core::config::normalize_symbol;
use crate::queue::QueuePublisher;
use anyhow::{Context, Result};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Trigger payload. Both fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InvocationEvent {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// JSON encoded body.
    pub body: String,
}

impl InvocationResponse {
    fn ok(body: String) -> Self {
        Self {
            status_code: 200,
            body,
        }
    }

    fn failure(message: &str) -> Self {
        Self {
            status_code: 500,
            body: json!({"error": message, "timestamp": timestamp()}).to_string(),
        }
    }
}

#[derive(Serialize)]
struct ResponseBody<'a> {
    timestamp: String,
    symbol: &'a str,
    data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataMode {
    #[default]
    Raw,
    Normalized,
}

pub enum Delivery {
    /// Return the data in the response body.
    Direct,
    /// Publish the data and return an acknowledgement.
    Queue(Arc<dyn QueuePublisher>),
}

pub struct Dispatcher {
    aggregator: Aggregator,
    mode: DataMode,
    delivery: Delivery,
}

impl Dispatcher {
    pub fn new(aggregator: Aggregator, mode: DataMode, delivery: Delivery) -> Self {
        Self {
            aggregator,
            mode,
            delivery,
        }
    }

    /// Handles a JSON encoded event. Malformed payloads become a 500 like any other failure.
    pub async fn handle_payload(&self, payload: &str, tickers: &TickerPolicy) -> InvocationResponse {
        match parse_event(payload) {
            Ok(event) => self.handle(event, tickers).await,
            Err(e) => {
                error!(error = %e, "Rejected invocation event");
                InvocationResponse::failure(&format!("{e:#}"))
            }
        }
    }

    /// Handles one invocation. Always produces a response; failures become a 500.
    pub async fn handle(&self, event: InvocationEvent, tickers: &TickerPolicy) -> InvocationResponse {
        let started = event.time.clone().unwrap_or_else(timestamp);
        info!("Starting financial data check at {}...", started);

        let response = match AssertUnwindSafe(self.run(&event, tickers))
            .catch_unwind()
            .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                error!(error = %e, "Check failed");
                InvocationResponse::failure(&format!("{e:#}"))
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(error = %message, "Check panicked");
                InvocationResponse::failure(&message)
            }
        };

        info!("Check complete at {}", timestamp());
        response
    }

    async fn run(&self, event: &InvocationEvent, tickers: &TickerPolicy) -> Result<InvocationResponse> {
        let symbol = resolve_symbol(event.symbol.as_deref(), tickers);

        let data = match self.mode {
            DataMode::Raw => serde_json::to_value(self.aggregator.fetch_raw(&symbol).await)?,
            DataMode::Normalized => {
                serde_json::to_value(self.aggregator.fetch_quotes(&symbol).await)?
            }
        };

        match &self.delivery {
            Delivery::Direct => {
                let body = ResponseBody {
                    timestamp: timestamp(),
                    symbol: &symbol,
                    data,
                };
                Ok(InvocationResponse::ok(serde_json::to_string(&body)?))
            }
            Delivery::Queue(publisher) => {
                let message = serde_json::to_string(&data)?;
                publisher
                    .publish(&message)
                    .await
                    .context("Failed to deliver quotes to queue")?;
                let sent_at = timestamp();
                info!(%symbol, "Sent to queue at {}", sent_at);
                Ok(InvocationResponse::ok(
                    json!({
                        "message": format!("Sent to queue at {sent_at}"),
                        "symbol": symbol,
                        "timestamp": sent_at,
                    })
                    .to_string(),
                ))
            }
        }
    }
}

/// Parses an invocation event. Blank input is an empty event.
pub fn parse_event(input: &str) -> Result<InvocationEvent> {
    if input.trim().is_empty() {
        debug!("Empty event, using defaults");
        return Ok(InvocationEvent::default());
    }
    serde_json::from_str(input).context("Failed to parse invocation event")
}

/// Uses the caller's symbol when it is non-blank, otherwise the policy default.
pub fn resolve_symbol(symbol: Option<&str>, tickers: &TickerPolicy) -> String {
    symbol
        .map(normalize_symbol)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| tickers.pick())
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("Pipeline panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("Pipeline panicked: {message}")
    } else {
        "Pipeline panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DEFAULT_TICKERS;
    use crate::core::{ProviderId, QuoteProvider};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct EchoProvider;

    #[async_trait]
    impl QuoteProvider for EchoProvider {
        fn id(&self) -> ProviderId {
            ProviderId::Finnhub
        }

        async fn fetch_raw(&self, symbol: &str) -> Result<Value> {
            Ok(json!({"symbol": symbol, "o": 1.0, "h": 2.0, "l": 0.5, "c": 1.5, "pc": 1.25}))
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        messages: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl QueuePublisher for RecordingPublisher {
        async fn publish(&self, message: &str) -> Result<()> {
            if self.fail {
                return Err(anyhow!("queue unavailable"));
            }
            self.messages.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    struct PanickingPublisher;

    #[async_trait]
    impl QueuePublisher for PanickingPublisher {
        async fn publish(&self, _message: &str) -> Result<()> {
            panic!("publisher bug");
        }
    }

    fn aggregator() -> Aggregator {
        Aggregator::new(vec![Arc::new(EchoProvider)], Duration::from_secs(1))
    }

    fn event(symbol: Option<&str>) -> InvocationEvent {
        InvocationEvent {
            symbol: symbol.map(str::to_string),
            time: Some("2025-01-15T00:00:00Z".to_string()),
        }
    }

    #[tokio::test]
    async fn test_direct_response_contains_raw_data() {
        let dispatcher = Dispatcher::new(aggregator(), DataMode::Raw, Delivery::Direct);
        let response = dispatcher
            .handle(event(Some("msft")), &TickerPolicy::default())
            .await;

        assert_eq!(response.status_code, 200);
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["symbol"], "MSFT");
        assert!(body["timestamp"].is_string());
        assert_eq!(body["data"]["finnhub"]["ok"], true);
        assert_eq!(body["data"]["finnhub"]["data"]["symbol"], "MSFT");
    }

    #[tokio::test]
    async fn test_direct_response_with_normalized_data() {
        let dispatcher = Dispatcher::new(aggregator(), DataMode::Normalized, Delivery::Direct);
        let response = dispatcher
            .handle(event(Some("AAPL")), &TickerPolicy::default())
            .await;

        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(
            body["data"]["finnhub"]["data"],
            json!({"open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5, "previous_close": 1.25})
        );
    }

    #[tokio::test]
    async fn test_missing_symbol_uses_policy() {
        let dispatcher = Dispatcher::new(aggregator(), DataMode::Raw, Delivery::Direct);

        let response = dispatcher
            .handle(InvocationEvent::default(), &TickerPolicy::Fixed("NVDA".into()))
            .await;
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["symbol"], "NVDA");

        let response = dispatcher
            .handle(event(Some("   ")), &TickerPolicy::random_from_defaults())
            .await;
        assert_eq!(response.status_code, 200);
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert!(DEFAULT_TICKERS.contains(&body["symbol"].as_str().unwrap()));
    }

    #[tokio::test]
    async fn test_queue_delivery_publishes_aggregate() {
        let publisher = Arc::new(RecordingPublisher::default());
        let dispatcher = Dispatcher::new(
            aggregator(),
            DataMode::Normalized,
            Delivery::Queue(publisher.clone()),
        );

        let response = dispatcher
            .handle(event(Some("TSLA")), &TickerPolicy::default())
            .await;
        assert_eq!(response.status_code, 200);
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert!(body["message"].as_str().unwrap().starts_with("Sent to queue at"));
        assert_eq!(body["symbol"], "TSLA");

        let messages = publisher.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        let published: Value = serde_json::from_str(&messages[0]).unwrap();
        assert_eq!(published["finnhub"]["data"]["close"], 1.5);
    }

    #[tokio::test]
    async fn test_publish_failure_becomes_500() {
        let publisher = Arc::new(RecordingPublisher {
            fail: true,
            ..Default::default()
        });
        let dispatcher = Dispatcher::new(aggregator(), DataMode::Raw, Delivery::Queue(publisher));

        let response = dispatcher
            .handle(event(Some("AAPL")), &TickerPolicy::default())
            .await;
        assert_eq!(response.status_code, 500);
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(
            body["error"],
            "Failed to deliver quotes to queue: queue unavailable"
        );
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_panic_becomes_500() {
        let dispatcher = Dispatcher::new(
            aggregator(),
            DataMode::Raw,
            Delivery::Queue(Arc::new(PanickingPublisher)),
        );

        let response = dispatcher
            .handle(event(Some("AAPL")), &TickerPolicy::default())
            .await;
        assert_eq!(response.status_code, 500);
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["error"], "Pipeline panicked: publisher bug");
    }

    #[tokio::test]
    async fn test_hanging_queue_becomes_500() {
        use crate::providers::util::build_client;
        use crate::queue::HttpQueuePublisher;
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
            .mount(&mock_server)
            .await;
        let publisher = HttpQueuePublisher::new(
            build_client().unwrap(),
            &mock_server.uri(),
            Duration::from_millis(200),
        );
        let dispatcher = Dispatcher::new(aggregator(), DataMode::Raw, Delivery::Queue(Arc::new(publisher)));

        let response = tokio::time::timeout(
            Duration::from_secs(5),
            dispatcher.handle(event(Some("AAPL")), &TickerPolicy::default()),
        )
        .await
        .expect("dispatcher did not respond");
        assert_eq!(response.status_code, 500);
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("Failed to deliver quotes to queue: Queue publish failed:")
        );
    }

    #[tokio::test]
    async fn test_malformed_payload_becomes_500() {
        let dispatcher = Dispatcher::new(aggregator(), DataMode::Raw, Delivery::Direct);

        let response = dispatcher
            .handle_payload(r#"{"symbol": 123}"#, &TickerPolicy::default())
            .await;
        assert_eq!(response.status_code, 500);
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("Failed to parse invocation event: ")
        );

        let response = dispatcher
            .handle_payload(r#"{"symbol": "nvda"}"#, &TickerPolicy::default())
            .await;
        assert_eq!(response.status_code, 200);
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["symbol"], "NVDA");
    }

    #[test]
    fn test_parse_event() {
        let event = parse_event(r#"{"symbol": "msft", "time": "2025-01-15T09:30:00Z"}"#).unwrap();
        assert_eq!(event.symbol.as_deref(), Some("msft"));
        assert_eq!(event.time.as_deref(), Some("2025-01-15T09:30:00Z"));

        let event = parse_event("  \n").unwrap();
        assert!(event.symbol.is_none());
        assert!(event.time.is_none());

        let err = parse_event("{not json").unwrap_err();
        assert_eq!(err.to_string(), "Failed to parse invocation event");
    }

    #[test]
    fn test_event_and_response_wire_format() {
        let event: InvocationEvent = serde_json::from_str(r#"{"time": "now"}"#).unwrap();
        assert!(event.symbol.is_none());
        assert_eq!(event.time.as_deref(), Some("now"));

        let response = InvocationResponse::ok("{}".to_string());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"statusCode": 200, "body": "{}"})
        );
    }

    #[test]
    fn test_resolve_symbol() {
        let policy = TickerPolicy::Fixed("GOOGL".into());
        assert_eq!(resolve_symbol(Some(" aapl "), &policy), "AAPL");
        assert_eq!(resolve_symbol(Some(""), &policy), "GOOGL");
        assert_eq!(resolve_symbol(None, &policy), "GOOGL");
    }
}
