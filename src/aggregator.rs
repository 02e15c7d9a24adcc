//! Concurrent fan-out across the enabled providers for one symbol.

use crate::core::config::AppConfig;
use crate::core::{
    Credentials, ProviderId, ProviderOutcome, QuoteAggregate, QuoteProvider, RawAggregate,
};
use crate::normalize::normalize;
use crate::providers::{self, util::with_timeout};
use futures::future::join_all;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct Aggregator {
    providers: Vec<Arc<dyn QuoteProvider>>,
    timeout: Duration,
}

impl Aggregator {
    pub fn new(providers: Vec<Arc<dyn QuoteProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    /// Creates an aggregator over the providers that have a credential.
    pub fn from_config(config: &AppConfig, credentials: &Credentials, client: &Client) -> Self {
        let providers = providers::build_enabled(&config.providers, credentials, client);
        Self::new(providers, config.timeout())
    }

    pub fn enabled(&self) -> Vec<ProviderId> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    /// Queries every provider concurrently and collects the raw bodies.
    ///
    /// A failure, timeout or panic in one provider only affects its own entry.
    pub async fn fetch_raw(&self, symbol: &str) -> RawAggregate {
        let (ids, tasks): (Vec<_>, Vec<_>) = self
            .providers
            .iter()
            .map(|provider| {
                let provider = Arc::clone(provider);
                let symbol = symbol.to_string();
                let timeout = self.timeout;
                let id = provider.id();
                let task = tokio::spawn(async move {
                    with_timeout(provider.fetch_raw(&symbol), timeout).await
                });
                (id, task)
            })
            .unzip();

        debug!(providers = ?ids, symbol, "Fetching quotes");
        let joined = join_all(tasks).await;

        ids.into_iter()
            .zip(joined)
            .map(|(id, result)| {
                let outcome = match result {
                    Ok(fetched) => ProviderOutcome::from(fetched),
                    Err(e) => ProviderOutcome::Failure(format!("Provider task failed: {e}")),
                };
                if let ProviderOutcome::Failure(error) = &outcome {
                    warn!(provider = %id, %error, "Provider request failed");
                }
                (id, outcome)
            })
            .collect()
    }

    /// Like [`Aggregator::fetch_raw`], with each successful body normalized.
    pub async fn fetch_quotes(&self, symbol: &str) -> QuoteAggregate {
        normalize_all(self.fetch_raw(symbol).await)
    }
}

/// Normalizes every successful entry of a raw aggregate.
pub fn normalize_all(raw: RawAggregate) -> QuoteAggregate {
    raw.into_iter()
        .map(|(id, outcome)| {
            let normalized = match outcome {
                ProviderOutcome::Success(body) => {
                    let normalized = ProviderOutcome::from(normalize(id, &body));
                    if let ProviderOutcome::Failure(error) = &normalized {
                        warn!(provider = %id, %error, "Normalization failed");
                    }
                    normalized
                }
                ProviderOutcome::Failure(error) => ProviderOutcome::Failure(error),
            };
            (id, normalized)
        })
        .collect()
}
