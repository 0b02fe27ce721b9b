use clap::{Parser, Subcommand};

mod commands;

use commands::{EvaluateArgs, GlobalOpts, HistoryArgs, RunArgs, TickArgs};

#[derive(Parser)]
#[command(name = "signal-engine")]
#[command(about = "Candle-driven trading signals from Bybit klines", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll candles on an interval and record new signals until stopped
    Run(RunArgs),
    /// Run a single evaluation pass and record the signal, if any
    Tick(TickArgs),
    /// Evaluate the current candles without recording anything
    Evaluate(EvaluateArgs),
    /// Show recently recorded signals
    History(HistoryArgs),
}

fn init_logging(log_file: Option<&std::path::Path>) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.log_file.as_deref())?;

    let config = cli.global.load_config()?;
    tracing::debug!(path = %cli.global.config.display(), "configuration loaded");

    match cli.command {
        Commands::Run(args) => commands::run_daemon(config, args).await?,
        Commands::Tick(args) => commands::run_tick(config, args).await?,
        Commands::Evaluate(args) => commands::run_evaluate(config, args).await?,
        Commands::History(args) => commands::run_history(config, args).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_options_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "signal-engine",
            "tick",
            "--symbol",
            "BTCUSDT",
            "--memory",
            "--config",
            "conf/Prod.toml",
            "--profile",
            "demo",
        ])
        .unwrap();

        assert_eq!(cli.global.config, std::path::PathBuf::from("conf/Prod.toml"));
        assert_eq!(cli.global.profile.as_deref(), Some("demo"));
        match cli.command {
            Commands::Tick(args) => {
                assert_eq!(args.source.symbol.as_deref(), Some("BTCUSDT"));
                assert!(args.store.memory);
                assert!(!args.json);
            }
            _ => panic!("expected tick"),
        }
    }

    #[test]
    fn memory_conflicts_with_database_url() {
        let result = Cli::try_parse_from([
            "signal-engine",
            "run",
            "--memory",
            "--database-url",
            "sqlite://x.db",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn history_limit_short_flag() {
        let cli = Cli::try_parse_from(["signal-engine", "history", "-n", "5", "--json"]).unwrap();
        match cli.command {
            Commands::History(args) => {
                assert_eq!(args.limit, Some(5));
                assert!(args.json);
            }
            _ => panic!("expected history"),
        }
    }

    #[test]
    fn default_config_path() {
        let cli = Cli::try_parse_from(["signal-engine", "evaluate", "--scan"]).unwrap();
        assert_eq!(cli.global.config, std::path::PathBuf::from("config/Config.toml"));
        assert!(cli.global.log_file.is_none());
    }
}
