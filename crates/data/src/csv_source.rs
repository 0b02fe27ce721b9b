use anyhow::{Context, Result};
use async_trait::async_trait;
use csv::{Reader, Writer};
use signal_engine_core::{Candle, CandleSeries, CandleSource};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Replays candles from a CSV file with header `time,open,high,low,close,volume`.
///
/// The file is re-read on every fetch, so a file that another process keeps
/// appending to behaves like a live feed.
pub struct CsvCandleSource {
    path: PathBuf,
    symbol: String,
    window: Option<usize>,
}

impl CsvCandleSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, symbol: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            symbol: symbol.into(),
            window: None,
        }
    }

    /// Only the most recent `n` candles are returned per fetch.
    #[must_use]
    pub fn with_window(mut self, n: usize) -> Self {
        self.window = Some(n);
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and validates the file.
    ///
    /// Rows may be in any order; repeated timestamps keep the later row.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, a row does not parse, or a
    /// candle is malformed.
    pub fn load(&self) -> Result<CandleSeries> {
        let mut reader = Reader::from_path(&self.path)
            .with_context(|| format!("Failed to open CSV file: {}", self.path.display()))?;

        let mut candles = Vec::new();
        for (line, row) in reader.deserialize::<Candle>().enumerate() {
            // header is line 1
            let candle = row.with_context(|| {
                format!("{}: bad candle on line {}", self.path.display(), line + 2)
            })?;
            candles.push(candle);
        }

        let mut candles = CandleSeries::from_unsorted(candles)?.into_inner();
        if let Some(n) = self.window {
            let start = candles.len().saturating_sub(n);
            candles.drain(..start);
        }
        tracing::debug!(path = %self.path.display(), candles = candles.len(), "loaded candles");
        Ok(CandleSeries::new(candles)?)
    }
}

#[async_trait]
impl CandleSource for CsvCandleSource {
    async fn fetch_candles(&self) -> Result<CandleSeries> {
        self.load()
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }
}

/// Writes candles in the format [`CsvCandleSource`] reads, sorted by time.
///
/// # Errors
/// Returns error if the file cannot be created or writing fails.
pub fn write_candles(path: impl AsRef<Path>, candles: &[Candle]) -> Result<()> {
    let path = path.as_ref();
    let file =
        File::create(path).with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    let mut writer = Writer::from_writer(file);

    let mut sorted = candles.to_vec();
    sorted.sort_by_key(|c| c.time);

    // serialize writes the header from the first record's field names
    for candle in &sorted {
        writer.serialize(candle)?;
    }
    if sorted.is_empty() {
        writer.write_record(["time", "open", "high", "low", "close", "volume"])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn reads_and_sorts_rows() {
        let file = csv_file(
            "time,open,high,low,close,volume\n\
             120000,1.2,1.3,1.1,1.25,10\n\
             0,1.0,1.1,0.9,1.05,12\n\
             60000,1.05,1.2,1.0,1.2,8\n",
        );
        let source = CsvCandleSource::new(file.path(), "DOGEUSDT");
        let series = source.fetch_candles().await.unwrap();

        let times: Vec<i64> = series.iter().map(|c| c.time).collect();
        assert_eq!(times, vec![0, 60_000, 120_000]);
        assert_eq!(source.symbol(), "DOGEUSDT");
    }

    #[test]
    fn window_keeps_most_recent() {
        let file = csv_file(
            "time,open,high,low,close,volume\n\
             0,1,1,1,1,1\n\
             1,1,1,1,1,1\n\
             2,1,1,1,1,1\n",
        );
        let series = CsvCandleSource::new(file.path(), "X").with_window(2).load().unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.as_slice()[0].time, 1);
    }

    #[test]
    fn malformed_row_reports_line() {
        let file = csv_file("time,open,high,low,close,volume\n0,1,1,1,1,1\n1,abc,1,1,1,1\n");
        let err = CsvCandleSource::new(file.path(), "X").load().unwrap_err();
        assert!(format!("{err:#}").contains("line 3"));
    }

    #[test]
    fn invalid_envelope_is_rejected() {
        // high below close
        let file = csv_file("time,open,high,low,close,volume\n0,1,0.5,0.4,1,1\n");
        assert!(CsvCandleSource::new(file.path(), "X").load().is_err());
    }

    #[test]
    fn missing_file_is_error() {
        let source = CsvCandleSource::new("/nonexistent/candles.csv", "X");
        assert!(source.load().is_err());
    }

    #[test]
    fn write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candles.csv");
        let candles = vec![
            Candle::new(60_000, 2.0, 2.5, 1.5, 2.2, 30.0),
            Candle::new(0, 1.0, 1.5, 0.5, 1.2, 20.0),
        ];
        write_candles(&path, &candles).unwrap();

        let series = CsvCandleSource::new(&path, "X").load().unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.as_slice()[0], candles[1]);
    }
}
