use crate::core::TickerPolicy;
use crate::dispatcher::Dispatcher;
use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

/// Reads a raw event payload from `source`, or stdin when it is absent or `-`.
pub fn read_event(source: Option<&Path>) -> Result<String> {
    match source {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event file: {}", path.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read event from stdin")?;
            Ok(buf)
        }
    }
}

pub async fn run(dispatcher: &Dispatcher, payload: &str, tickers: &TickerPolicy) -> Result<()> {
    let response = dispatcher.handle_payload(payload, tickers).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
