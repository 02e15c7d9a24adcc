//! Quote abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    AlphaVantage,
    PolygonIo,
    Finnhub,
    Fmp,
    Eodhd,
}

impl ProviderId {
    pub const ALL: [ProviderId; 5] = [
        ProviderId::AlphaVantage,
        ProviderId::PolygonIo,
        ProviderId::Finnhub,
        ProviderId::Fmp,
        ProviderId::Eodhd,
    ];

    /// Environment variable holding the provider's secret.
    pub fn env_var(&self) -> &'static str {
        match self {
            ProviderId::AlphaVantage => "ALPHAVANTAGE_API_KEY",
            ProviderId::PolygonIo => "POLYGONIO_API_KEY",
            ProviderId::Finnhub => "FINNHUB_API_KEY",
            ProviderId::Fmp => "FMP_API_KEY",
            ProviderId::Eodhd => "EODHD_API_TOKEN",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderId::AlphaVantage => "https://www.alphavantage.co",
            ProviderId::PolygonIo => "https://api.polygon.io",
            ProviderId::Finnhub => "https://finnhub.io",
            ProviderId::Fmp => "https://financialmodelingprep.com",
            ProviderId::Eodhd => "https://eodhd.com",
        }
    }

    /// Human-readable name for logs and tables.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::AlphaVantage => "AlphaVantage",
            ProviderId::PolygonIo => "Polygon.io",
            ProviderId::Finnhub => "Finnhub",
            ProviderId::Fmp => "Financial Modeling Prep",
            ProviderId::Eodhd => "EOD Historical Data",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ProviderId::AlphaVantage => "alphavantage",
                ProviderId::PolygonIo => "polygonio",
                ProviderId::Finnhub => "finnhub",
                ProviderId::Fmp => "fmp",
                ProviderId::Eodhd => "eodhd",
            }
        )
    }
}

impl FromStr for ProviderId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "alphavantage" => Ok(ProviderId::AlphaVantage),
            "polygonio" | "polygon" => Ok(ProviderId::PolygonIo),
            "finnhub" => Ok(ProviderId::Finnhub),
            "fmp" => Ok(ProviderId::Fmp),
            "eodhd" => Ok(ProviderId::Eodhd),
            _ => Err(anyhow::anyhow!("Unknown provider: {}", s)),
        }
    }
}

/// Common quote record produced for every provider. Absent source fields are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedQuote {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub previous_close: f64,
}

/// Result of querying a single provider.
///
/// Serializes as `{"ok": true, "data": ...}` or `{"ok": false, "error": "..."}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutcome<T> {
    Success(T),
    Failure(String),
}

impl<T> ProviderOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ProviderOutcome::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ProviderOutcome::Success(data) => Some(data),
            ProviderOutcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ProviderOutcome::Success(_) => None,
            ProviderOutcome::Failure(e) => Some(e),
        }
    }
}

impl<T> From<Result<T>> for ProviderOutcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => ProviderOutcome::Success(data),
            Err(e) => ProviderOutcome::Failure(format!("{e:#}")),
        }
    }
}

impl<T: Serialize> Serialize for ProviderOutcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ProviderOutcome", 2)?;
        match self {
            ProviderOutcome::Success(data) => {
                state.serialize_field("ok", &true)?;
                state.serialize_field("data", data)?;
            }
            ProviderOutcome::Failure(error) => {
                state.serialize_field("ok", &false)?;
                state.serialize_field("error", error)?;
            }
        }
        state.end()
    }
}

/// Raw provider bodies keyed by provider, only for enabled providers.
pub type RawAggregate = BTreeMap<ProviderId, ProviderOutcome<Value>>;

/// Normalized quotes keyed by provider, only for enabled providers.
pub type QuoteAggregate = BTreeMap<ProviderId, ProviderOutcome<NormalizedQuote>>;

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Issues a single request for `symbol` and returns the parsed JSON body.
    async fn fetch_raw(&self, symbol: &str) -> Result<Value>;
}
