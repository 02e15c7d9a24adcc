//! Downstream queue delivery.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, instrument};

#[async_trait]
pub trait QueuePublisher: Send + Sync {
    /// Publishes one JSON message. Delivery is attempted once.
    async fn publish(&self, message: &str) -> Result<()>;
}

/// Publishes messages by POSTing them to a queue endpoint.
pub struct HttpQueuePublisher {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpQueuePublisher {
    /// `timeout` bounds the whole request, response included.
    pub fn new(client: Client, url: &str, timeout: Duration) -> Self {
        Self {
            client,
            url: url.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl QueuePublisher for HttpQueuePublisher {
    #[instrument(name = "QueuePublish", skip(self, message), fields(bytes = message.len()))]
    async fn publish(&self, message: &str) -> Result<()> {
        debug!("Publishing message to {}", self.url);
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.timeout)
            .body(message.to_string())
            .send()
            .await
            .map_err(|e| anyhow!("Queue publish failed: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Queue publish failed: HTTP error: {}",
                response.status()
            ));
        }
        Ok(())
    }
}
