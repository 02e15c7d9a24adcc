//! Core abstractions shared by providers, the aggregator and the dispatcher

pub mod config;
pub mod credentials;
pub mod log;
pub mod quote;

// Re-export main types for cleaner imports
pub use config::{AppConfig, TickerPolicy};
pub use credentials::Credentials;
pub use quote::{
    NormalizedQuote, ProviderId, ProviderOutcome, QuoteAggregate, QuoteProvider, RawAggregate,
};
