//! Signal persistence collaborators and an offline candle source.

pub mod csv_source;
pub mod memory;
pub mod sqlite;

pub use csv_source::{write_candles, CsvCandleSource};
pub use memory::InMemorySignalStore;
pub use sqlite::SqliteSignalStore;
