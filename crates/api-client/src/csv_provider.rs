// In crates/api-client/src/csv_provider.rs

use std::io::Read;
use std::path::PathBuf;

use async_trait::async_trait;
use core_types::Bar;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::{BarRequest, normalize, timestamp_from_millis};
use crate::{Error, MarketDataProvider, Result};

#[derive(Debug, Deserialize)]
struct CsvRow {
    /// Milliseconds since the Unix epoch.
    timestamp: i64,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
}

/// Reads bars from a `timestamp,open,high,low,close,volume` file for offline runs.
///
/// The file holds a single series; the pair and timeframe of a request are
/// not checked against it, only the time range is applied.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    path: PathBuf,
}

impl CsvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads every row in the file, sorted by timestamp.
    pub fn load(&self) -> Result<Vec<Bar>> {
        let file = std::fs::File::open(&self.path)
            .map_err(|e| Error::CustomError(format!("failed to open {}: {}", self.path.display(), e)))?;
        read_bars(file)
    }
}

fn read_bars<R: Read>(reader: R) -> Result<Vec<Bar>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();
    for row in reader.deserialize::<CsvRow>() {
        let row = row?;
        bars.push(Bar {
            timestamp: timestamp_from_millis(row.timestamp)?,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }
    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

#[async_trait]
impl MarketDataProvider for CsvProvider {
    fn name(&self) -> &'static str {
        "csv"
    }

    async fn fetch_bars(&self, request: &BarRequest) -> core_types::Result<Vec<Bar>> {
        let provider = self.clone();
        let bars = tokio::task::spawn_blocking(move || provider.load())
            .await
            .map_err(|e| Error::CustomError(format!("CSV reader task failed: {}", e)))??;
        tracing::debug!(path = %self.path.display(), rows = bars.len(), "Loaded CSV bars.");
        Ok(normalize(bars, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn reads_rows_in_time_order() {
        let data = "timestamp,open,high,low,close,volume\n\
                    1704070800000,11,12,10.5,11.5,7\n\
                    1704067200000,10,11,9.5,10.5,3.25\n";
        let bars = read_bars(data.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, dec!(10.5));
        assert_eq!(bars[0].volume, dec!(3.25));
        assert!(bars[0].timestamp < bars[1].timestamp);
    }

    #[test]
    fn bad_number_is_a_csv_error() {
        let data = "timestamp,open,high,low,close,volume\n1704067200000,ten,11,9,10,1\n";
        assert!(matches!(read_bars(data.as_bytes()), Err(Error::CsvError(_))));
    }

    #[test]
    fn missing_file_is_reported() {
        let provider = CsvProvider::new("/definitely/not/here.csv");
        assert!(provider.load().is_err());
    }
}
