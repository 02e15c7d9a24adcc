use super::ui;
use crate::aggregator::Aggregator;
use crate::core::{ProviderId, ProviderOutcome, QuoteAggregate};
use anyhow::Result;
use comfy_table::Cell;
use tracing::warn;

/// Renders normalized quotes for one symbol as a table.
pub fn display_as_table(symbol: &str, quotes: &QuoteAggregate) -> String {
    let mut table = ui::new_styled_table();

    table.set_header(vec![
        ui::header_cell("Provider"),
        ui::header_cell("Open"),
        ui::header_cell("High"),
        ui::header_cell("Low"),
        ui::header_cell("Close"),
        ui::header_cell("Prev Close"),
        ui::header_cell("Change"),
    ]);

    let mut errors = Vec::new();
    for (id, outcome) in quotes {
        let mut row = vec![Cell::new(id.display_name())];
        match outcome {
            ProviderOutcome::Success(quote) => {
                row.extend([
                    ui::price_cell(quote.open),
                    ui::price_cell(quote.high),
                    ui::price_cell(quote.low),
                    ui::price_cell(quote.close),
                    ui::price_cell(quote.previous_close),
                ]);
                if quote.previous_close > 0.0 {
                    let change =
                        (quote.close - quote.previous_close) / quote.previous_close * 100.0;
                    row.push(ui::change_cell(change));
                } else {
                    row.push(ui::na_cell(false));
                }
            }
            ProviderOutcome::Failure(error) => {
                row.extend((0..6).map(|_| ui::na_cell(true)));
                errors.push(format!("{}: {}", id.display_name(), error));
            }
        }
        table.add_row(row);
    }

    let mut output = format!(
        "Quotes for {}\n\n",
        ui::style_text(symbol, ui::StyleType::Title)
    );
    output.push_str(&table.to_string());

    if !errors.is_empty() {
        output.push_str("\n\n");
        output.push_str(&ui::style_text(&errors.join("\n"), ui::StyleType::Error));
    }
    output
}

pub async fn run(aggregator: &Aggregator, symbol: &str, as_json: bool) -> Result<()> {
    if aggregator.enabled().is_empty() {
        let vars: Vec<&str> = ProviderId::ALL.iter().map(|id| id.env_var()).collect();
        warn!("No providers enabled");
        println!(
            "{}",
            ui::style_text(
                &format!("No provider credentials configured. Set one of: {}", vars.join(", ")),
                ui::StyleType::Subtle
            )
        );
        return Ok(());
    }

    let pb = ui::new_spinner(&format!("Fetching quotes for {symbol}..."));
    let quotes = aggregator.fetch_quotes(symbol).await;
    pb.finish_and_clear();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&quotes)?);
    } else {
        println!("{}", display_as_table(symbol, &quotes));
    }
    Ok(())
}
