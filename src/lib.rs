pub mod aggregator;
pub mod cli;
pub mod core;
pub mod dispatcher;
pub mod normalize;
pub mod providers;
pub mod queue;

use crate::aggregator::Aggregator;
use crate::core::{AppConfig, Credentials};
use crate::dispatcher::{DataMode, Delivery, Dispatcher};
use crate::queue::HttpQueuePublisher;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    /// Fetch and display normalized quotes.
    Quote { symbol: Option<String>, json: bool },
    /// Handle one trigger event, optionally publishing to the queue.
    Invoke {
        event: Option<PathBuf>,
        publish: bool,
    },
}

/// Builds a dispatcher from configuration. `publish` selects queue delivery.
pub fn build_dispatcher(
    config: &AppConfig,
    credentials: &Credentials,
    publish: bool,
) -> Result<Dispatcher> {
    let client = providers::util::build_client()?;
    let aggregator = Aggregator::from_config(config, credentials, &client);

    let delivery = if publish {
        let url = config
            .queue_url()
            .context("Queue delivery requested but no queue destination is configured")?;
        Delivery::Queue(Arc::new(HttpQueuePublisher::new(
            client,
            &url,
            config.timeout(),
        )))
    } else {
        Delivery::Direct
    };

    let mode = if config.normalize {
        DataMode::Normalized
    } else {
        DataMode::Raw
    };
    Ok(Dispatcher::new(aggregator, mode, delivery))
}

/// Runs a command against an already loaded configuration.
pub async fn execute(
    command: AppCommand,
    config: &AppConfig,
    credentials: &Credentials,
) -> Result<()> {
    debug!(providers = ?credentials.enabled(), "Providers enabled");
    match command {
        AppCommand::Quote { symbol, json } => {
            let client = providers::util::build_client()?;
            let aggregator = Aggregator::from_config(config, credentials, &client);
            let symbol = dispatcher::resolve_symbol(symbol.as_deref(), &config.default_ticker);
            cli::quote::run(&aggregator, &symbol, json).await
        }
        AppCommand::Invoke { event, publish } => {
            let payload = cli::invoke::read_event(event.as_deref())?;
            let dispatcher = build_dispatcher(config, credentials, publish)?;
            cli::invoke::run(&dispatcher, &payload, &config.default_ticker).await
        }
    }
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    env_file: Option<&Path>,
) -> Result<()> {
    info!("stockpulse starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let credentials = Credentials::load(env_file);
    execute(command, &config, &credentials).await
}
