pub mod alphavantage;
pub mod eodhd;
pub mod finnhub;
pub mod fmp;
pub mod polygon;
pub mod util;

use crate::core::config::ProvidersConfig;
use crate::core::{Credentials, ProviderId, QuoteProvider};
use reqwest::Client;
use std::sync::Arc;

pub use alphavantage::AlphaVantageProvider;
pub use eodhd::EodhdProvider;
pub use finnhub::FinnhubProvider;
pub use fmp::FmpProvider;
pub use polygon::PolygonProvider;

/// Builds a client for every provider that has a credential. The rest are skipped.
pub fn build_enabled(
    config: &ProvidersConfig,
    credentials: &Credentials,
    client: &Client,
) -> Vec<Arc<dyn QuoteProvider>> {
    ProviderId::ALL
        .into_iter()
        .filter_map(|id| {
            let key = credentials.get(id)?;
            let base_url = config.base_url(id);
            let provider: Arc<dyn QuoteProvider> = match id {
                ProviderId::AlphaVantage => {
                    Arc::new(AlphaVantageProvider::new(client.clone(), base_url, key))
                }
                ProviderId::PolygonIo => Arc::new(
                    PolygonProvider::new(client.clone(), base_url, key)
                        .with_adjusted(config.polygonio.adjusted)
                        .with_date(config.polygonio.date),
                ),
                ProviderId::Finnhub => Arc::new(FinnhubProvider::new(client.clone(), base_url, key)),
                ProviderId::Fmp => Arc::new(FmpProvider::new(client.clone(), base_url, key)),
                ProviderId::Eodhd => Arc::new(
                    EodhdProvider::new(client.clone(), base_url, key)
                        .with_exchange(&config.eodhd.exchange)
                        .with_format(&config.eodhd.fmt),
                ),
            };
            Some(provider)
        })
        .collect()
}
