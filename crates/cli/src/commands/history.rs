use super::context::StoreArgs;
use anyhow::Result;
use clap::Args;
use signal_engine_core::{AppConfig, Signal, SignalStore};

/// Arguments for the history command
#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Symbol whose history to show (overrides exchange.symbol)
    #[arg(long)]
    pub symbol: Option<String>,

    /// Number of signals to show (defaults to pipeline.history_limit)
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Database URL (overrides database.url)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Print signals as JSON
    #[arg(long)]
    pub json: bool,
}

fn format_price(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.5}"))
}

/// One table row: time, side, level, price, stop, target.
fn format_row(signal: &Signal) -> String {
    format!(
        "{:<10} {:<5} {:<7} {:>12} {:>12} {:>12}",
        signal.display_time(),
        signal.signal_type,
        signal.level,
        format!("{:.5}", signal.price),
        format_price(signal.stop_loss),
        format_price(signal.take_profit),
    )
}

/// Lists the most recent persisted signals, oldest first.
///
/// # Errors
/// Returns error if the store cannot be opened or read.
pub async fn run_history(mut config: AppConfig, args: HistoryArgs) -> Result<()> {
    if let Some(symbol) = &args.symbol {
        config.exchange.symbol.clone_from(symbol);
    }
    let limit = args.limit.unwrap_or(config.pipeline.history_limit);

    let store = StoreArgs {
        database_url: args.database_url.clone(),
        memory: false,
    }
    .build(&config)
    .await?;
    let signals = store.latest(limit).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&signals)?);
        return Ok(());
    }

    if signals.is_empty() {
        println!("No signals recorded for {}", config.exchange.symbol);
        return Ok(());
    }

    println!("Last {} signal(s) for {}", signals.len(), config.exchange.symbol);
    println!(
        "{:<10} {:<5} {:<7} {:>12} {:>12} {:>12}",
        "TIME", "SIDE", "LEVEL", "PRICE", "STOP", "TARGET"
    );
    for signal in &signals {
        println!("{}", format_row(signal));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_engine_core::{SignalLevel, SignalType};

    #[test]
    fn row_shows_bracket_when_present() {
        let signal = Signal::new(SignalType::Sell, SignalLevel::Medium, 0.18, 3_600_000)
            .with_bracket(0.19, 0.17);
        let row = format_row(&signal);

        assert!(row.starts_with("01:00:00"));
        assert!(row.contains("SELL"));
        assert!(row.contains("Medium"));
        assert!(row.contains("0.19000"));
        assert!(row.contains("0.17000"));
    }

    #[test]
    fn row_marks_missing_bracket() {
        let signal = Signal::new(SignalType::Buy, SignalLevel::Low, 0.2, 0);
        assert_eq!(format_row(&signal).matches(" -").count(), 2);
    }
}
