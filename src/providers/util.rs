use anyhow::{Context, Result, anyhow};
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

pub const USER_AGENT: &str = concat!("stockpulse/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP client shared by every provider.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}

/// Appends `segments` to `base_url`, percent-encoding each one.
///
/// A symbol such as `BRK/B` stays a single path segment.
pub fn endpoint_url(base_url: &str, segments: &[&str]) -> Result<String> {
    let mut url = Url::parse(base_url).with_context(|| format!("Invalid base URL: {base_url}"))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("Base URL cannot carry a path: {base_url}"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.into())
}

/// Issues a single GET and parses the body as JSON.
///
/// Only a `200 OK` is accepted. `query` is appended to `url` and kept out of logs
/// since it carries the API key.
pub async fn get_json(client: &Client, url: &str, query: &[(&str, &str)]) -> Result<Value> {
    let request_url = Url::parse_with_params(url, query)
        .with_context(|| format!("Invalid request URL: {url}"))?;
    debug!("Requesting {}", url);

    let response = client
        .get(request_url)
        .send()
        .await
        .map_err(|e| anyhow!("Request error: {} URL: {}", e.without_url(), url))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(anyhow!("HTTP error: {} URL: {}", status, url));
    }

    let text = response
        .text()
        .await
        .context("Failed to get response text")?;

    serde_json::from_str(&text).map_err(|e| anyhow!("Failed to parse JSON response: {}", e))
}

/// Bounds an async operation by `timeout`.
///
/// # Parameters
/// - `operation`: Future producing the result
/// - `timeout`: Upper bound on how long the operation may run
///
/// # Returns
/// The operation's own result, or an error once the deadline passes
pub async fn with_timeout<Fut, T>(operation: Fut, timeout: Duration) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => {
            debug!("Operation timed out after {:?}", timeout);
            Err(anyhow!("Timed out after {}ms", timeout.as_millis()))
        }
    }
}
