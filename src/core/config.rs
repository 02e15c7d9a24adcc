use anyhow::{Context, Result};
use chrono::NaiveDate;
use directories::ProjectDirs;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

use super::quote::ProviderId;

pub const FALLBACK_TICKER: &str = "AAPL";
pub const DEFAULT_TICKERS: [&str; 6] = ["AAPL", "GOOGL", "MSFT", "TSLA", "AMZN", "NVDA"];
pub const QUEUE_URL_ENV: &str = "QUOTE_QUEUE_URL";

/// How a ticker is chosen when the caller does not supply one.
///
/// A single symbol in the config file is fixed, a list is sampled per invocation.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum TickerPolicy {
    Fixed(String),
    Random(Vec<String>),
}

impl Default for TickerPolicy {
    fn default() -> Self {
        TickerPolicy::Fixed(FALLBACK_TICKER.to_string())
    }
}

impl TickerPolicy {
    pub fn random_from_defaults() -> Self {
        TickerPolicy::Random(DEFAULT_TICKERS.iter().map(|s| s.to_string()).collect())
    }

    pub fn pick(&self) -> String {
        self.pick_with(&mut rand::thread_rng())
    }

    pub fn pick_with<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let picked = match self {
            TickerPolicy::Fixed(symbol) => Some(symbol.as_str()),
            TickerPolicy::Random(candidates) => candidates.choose(rng).map(String::as_str),
        };
        picked
            .map(normalize_symbol)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| FALLBACK_TICKER.to_string())
    }
}

/// Trims and uppercases a caller supplied symbol.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct EndpointConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PolygonConfig {
    pub base_url: Option<String>,
    #[serde(default = "default_adjusted")]
    pub adjusted: bool,
    /// Fetch the open/close of a specific day instead of the previous aggregate.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

fn default_adjusted() -> bool {
    true
}

impl Default for PolygonConfig {
    fn default() -> Self {
        PolygonConfig {
            base_url: None,
            adjusted: default_adjusted(),
            date: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EodhdConfig {
    pub base_url: Option<String>,
    #[serde(default = "default_exchange")]
    pub exchange: String,
    #[serde(default = "default_fmt")]
    pub fmt: String,
}

fn default_exchange() -> String {
    "US".to_string()
}

fn default_fmt() -> String {
    "json".to_string()
}

impl Default for EodhdConfig {
    fn default() -> Self {
        EodhdConfig {
            base_url: None,
            exchange: default_exchange(),
            fmt: default_fmt(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub alphavantage: EndpointConfig,
    #[serde(default)]
    pub polygonio: PolygonConfig,
    #[serde(default)]
    pub finnhub: EndpointConfig,
    #[serde(default)]
    pub fmp: EndpointConfig,
    #[serde(default)]
    pub eodhd: EodhdConfig,
}

impl ProvidersConfig {
    pub fn base_url(&self, id: ProviderId) -> &str {
        let configured = match id {
            ProviderId::AlphaVantage => self.alphavantage.base_url.as_deref(),
            ProviderId::PolygonIo => self.polygonio.base_url.as_deref(),
            ProviderId::Finnhub => self.finnhub.base_url.as_deref(),
            ProviderId::Fmp => self.fmp.base_url.as_deref(),
            ProviderId::Eodhd => self.eodhd.base_url.as_deref(),
        };
        configured
            .map(|url| url.trim_end_matches('/'))
            .unwrap_or_else(|| id.default_base_url())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct QueueConfig {
    pub url: String,
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub default_ticker: TickerPolicy,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Emit normalized quotes instead of raw provider bodies.
    #[serde(default)]
    pub normalize: bool,
    #[serde(default)]
    pub queue: Option<QueueConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            default_ticker: TickerPolicy::default(),
            timeout_secs: default_timeout_secs(),
            normalize: false,
            queue: None,
        }
    }
}

impl AppConfig {
    /// Loads the config at the default location, falling back to defaults if absent.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "stockpulse", "stockpulse")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Queue destination, with the environment taking precedence over the file.
    pub fn queue_url(&self) -> Option<String> {
        std::env::var(QUEUE_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.queue.as_ref().map(|q| q.url.clone()))
    }
}
