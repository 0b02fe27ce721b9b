use anyhow::{Context, Result};
use async_trait::async_trait;
use signal_engine_core::{Signal, SignalStore};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// `SQLite`-backed signal history for one symbol.
///
/// Appends are plain inserts; the dedup gate upstream decides what is new.
#[derive(Clone)]
pub struct SqliteSignalStore {
    pool: SqlitePool,
    symbol: String,
}

impl SqliteSignalStore {
    /// Opens (creating if missing) the database at `database_url`.
    ///
    /// # Arguments
    ///
    /// * `database_url` - `SQLite` URL (e.g., `sqlite://data/signals.db`)
    /// * `symbol` - Symbol whose signals this store reads and writes
    /// * `max_connections` - Pool size
    ///
    /// # Errors
    ///
    /// Returns error if the URL is invalid, the connection fails, or the
    /// schema cannot be created.
    pub async fn connect(
        database_url: &str,
        symbol: impl Into<String>,
        max_connections: u32,
    ) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid database url: {database_url}"))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open {database_url}"))?;
        tracing::info!(url = %database_url, max_connections, "connected to signal database");

        Self::with_pool(pool, symbol).await
    }

    /// Creates an in-memory database for tests and dry runs.
    ///
    /// # Errors
    ///
    /// Returns error if connection fails.
    pub async fn in_memory(symbol: impl Into<String>) -> Result<Self> {
        // every connection to :memory: is a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::with_pool(pool, symbol).await
    }

    async fn with_pool(pool: SqlitePool, symbol: impl Into<String>) -> Result<Self> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS signals (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol      TEXT    NOT NULL,
                signal_type TEXT    NOT NULL,
                level       TEXT    NOT NULL,
                price       REAL    NOT NULL,
                time        INTEGER NOT NULL,
                stop_loss   REAL,
                take_profit REAL,
                created_at  INTEGER NOT NULL
            )
            ",
        )
        .execute(&pool)
        .await
        .context("failed to create signals table")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_signals_symbol_id ON signals (symbol, id)")
            .execute(&pool)
            .await?;

        let symbol = symbol.into();
        tracing::debug!(symbol = %symbol, "signal store ready");
        Ok(Self { pool, symbol })
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Number of stored signals for this symbol.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn count(&self) -> Result<i64> {
        let (count,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM signals WHERE symbol = ?1")
            .bind(&self.symbol)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

type SignalRow = (String, String, f64, i64, Option<f64>, Option<f64>);

#[async_trait]
impl SignalStore for SqliteSignalStore {
    async fn append(&self, signal: &Signal) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();

        sqlx::query(
            r"
            INSERT INTO signals (symbol, signal_type, level, price, time, stop_loss, take_profit, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(&self.symbol)
        .bind(signal.signal_type.as_str())
        .bind(signal.level.as_str())
        .bind(signal.price)
        .bind(signal.time)
        .bind(signal.stop_loss)
        .bind(signal.take_profit)
        .bind(now)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to insert signal for {}", self.symbol))?;

        Ok(())
    }

    async fn latest(&self, n: usize) -> Result<Vec<Signal>> {
        let limit = i64::try_from(n).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, SignalRow>(
            r"
            SELECT signal_type, level, price, time, stop_loss, take_profit
            FROM signals
            WHERE symbol = ?1
            ORDER BY id DESC
            LIMIT ?2
            ",
        )
        .bind(&self.symbol)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut signals = Vec::with_capacity(rows.len());
        for (signal_type, level, price, time, stop_loss, take_profit) in rows.into_iter().rev() {
            let mut signal = Signal::new(signal_type.parse()?, level.parse()?, price, time);
            signal.stop_loss = stop_loss;
            signal.take_profit = take_profit;
            signals.push(signal);
        }

        Ok(signals)
    }
}
