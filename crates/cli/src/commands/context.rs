//! Wiring shared by every command: configuration, candle source, signal store.

use anyhow::{Context, Result};
use clap::Args;
use signal_engine_bybit::BybitCandleSource;
use signal_engine_core::{AppConfig, CandleSource, ConfigLoader, SignalStore};
use signal_engine_data::{CsvCandleSource, InMemorySignalStore, SqliteSignalStore};
use signal_engine_signals::SignalPipeline;
use signal_engine_strategy::build_evaluator;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Pipeline over whichever source and store the command line selected.
pub type DynPipeline = SignalPipeline<Arc<dyn CandleSource>, Arc<dyn SignalStore>>;

#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Config file path
    #[arg(short, long, global = true, default_value = "config/Config.toml")]
    pub config: PathBuf,

    /// Profile overlay, loaded from Config.<profile>.toml next to the config file
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Log to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

impl GlobalOpts {
    /// # Errors
    /// Returns error if a config file or environment override cannot be parsed.
    pub fn load_config(&self) -> Result<AppConfig> {
        match &self.profile {
            Some(profile) => ConfigLoader::load_with_profile(&self.config, profile),
            None => ConfigLoader::load(&self.config),
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Symbol to watch (overrides exchange.symbol)
    #[arg(long)]
    pub symbol: Option<String>,

    /// Bybit interval code, e.g. 1, 5, 60, D (overrides exchange.interval)
    #[arg(long)]
    pub interval: Option<String>,

    /// Replay candles from a CSV file instead of polling Bybit
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,
}

impl SourceArgs {
    /// Folds command-line overrides into the loaded config.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(symbol) = &self.symbol {
            config.exchange.symbol.clone_from(symbol);
        }
        if let Some(interval) = &self.interval {
            config.exchange.interval.clone_from(interval);
        }
    }

    /// # Errors
    /// Returns error if the Bybit client cannot be built.
    pub fn build(&self, config: &AppConfig) -> Result<Arc<dyn CandleSource>> {
        let source: Arc<dyn CandleSource> = match &self.csv {
            Some(path) => {
                let window = usize::try_from(config.exchange.limit)?;
                Arc::new(CsvCandleSource::new(path, &config.exchange.symbol).with_window(window))
            }
            None => Arc::new(BybitCandleSource::from_config(&config.exchange)?),
        };
        Ok(source)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Database URL (overrides database.url)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Keep signals in memory only; nothing survives the process
    #[arg(long, conflicts_with = "database_url")]
    pub memory: bool,
}

impl StoreArgs {
    /// # Errors
    /// Returns error if the database cannot be opened.
    pub async fn build(&self, config: &AppConfig) -> Result<Arc<dyn SignalStore>> {
        if self.memory {
            return Ok(Arc::new(InMemorySignalStore::new()));
        }

        let url = self.database_url.as_deref().unwrap_or(&config.database.url);
        ensure_sqlite_parent_dir(url)?;

        tracing::info!(url = %url, symbol = %config.exchange.symbol, "opening signal store");
        let store = SqliteSignalStore::connect(
            url,
            config.exchange.symbol.clone(),
            config.database.max_connections,
        )
        .await?;
        Ok(Arc::new(store))
    }
}

/// Builds the pipeline for `config` from the selected source and store.
///
/// # Errors
/// Returns error if the source or store cannot be built.
pub async fn build_pipeline(
    config: &AppConfig,
    source: &SourceArgs,
    store: &StoreArgs,
) -> Result<DynPipeline> {
    let candles = source.build(config)?;
    let signals = store.build(config).await?;
    let evaluator = build_evaluator(config);

    tracing::info!(
        symbol = %candles.symbol(),
        evaluator = evaluator.name(),
        lookback = evaluator.required_lookback(),
        "pipeline ready"
    );
    Ok(SignalPipeline::new(candles, signals, evaluator))
}

/// Creates the parent directory of a file-backed `SQLite` URL.
///
/// Non-`SQLite` and in-memory URLs are left alone.
///
/// # Errors
/// Returns error if the directory cannot be created.
pub fn ensure_sqlite_parent_dir(url: &str) -> Result<()> {
    let Some(file_path) = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
    else {
        return Ok(());
    };

    // drop connection options such as ?mode=rwc
    let file_path = file_path.split('?').next().unwrap_or_default();
    if file_path.is_empty() || file_path.starts_with(":memory:") {
        return Ok(());
    }

    if let Some(parent) = Path::new(file_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("cannot create database directory {}", parent.display())
            })?;
            tracing::debug!(dir = %parent.display(), "database directory ready");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_parent_of_sqlite_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested/deeper/signals.db");
        let url = format!("sqlite://{}?mode=rwc", db.display());

        ensure_sqlite_parent_dir(&url).unwrap();
        assert!(db.parent().unwrap().is_dir());
        assert!(!db.exists());
    }

    #[test]
    fn ignores_memory_and_foreign_urls() {
        ensure_sqlite_parent_dir("sqlite::memory:").unwrap();
        ensure_sqlite_parent_dir("sqlite://:memory:").unwrap();
        ensure_sqlite_parent_dir("postgres://localhost/signals").unwrap();
        ensure_sqlite_parent_dir("sqlite://signals.db").unwrap();
    }

    #[test]
    fn source_overrides_replace_config_values() {
        let mut config = AppConfig::default();
        let args = SourceArgs {
            symbol: Some("BTCUSDT".to_string()),
            interval: Some("5".to_string()),
            csv: None,
        };
        args.apply(&mut config);

        assert_eq!(config.exchange.symbol, "BTCUSDT");
        assert_eq!(config.exchange.interval, "5");
        assert_eq!(config.exchange.category, "linear");
    }

    #[test]
    fn csv_source_uses_config_symbol() {
        let config = AppConfig::default();
        let args = SourceArgs {
            csv: Some(PathBuf::from("candles.csv")),
            ..SourceArgs::default()
        };
        let source = args.build(&config).unwrap();
        assert_eq!(source.symbol(), "DOGEUSDT");
    }

    #[tokio::test]
    async fn memory_store_starts_empty() {
        let args = StoreArgs {
            database_url: None,
            memory: true,
        };
        let store = args.build(&AppConfig::default()).await.unwrap();
        assert!(store.latest(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sqlite_store_is_created_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("data/signals.db");
        let args = StoreArgs {
            database_url: Some(format!("sqlite://{}", db.display())),
            memory: false,
        };

        let store = args.build(&AppConfig::default()).await.unwrap();
        assert!(store.latest(1).await.unwrap().is_empty());
        assert!(db.exists());
    }
}
