//! CSV file market data source.
//!
//! One file per symbol and timeframe: `<dir>/<SYMBOL>_<interval>.csv` with a
//! `timestamp,open,high,low,close,volume` header and timestamps formatted
//! `%Y-%m-%d %H:%M:%S`.

use crate::domain::error::EngineError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::data_port::{BarRange, MarketDataSource};
use chrono::NaiveDateTime;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvDataSource {
    base_path: PathBuf,
}

impl CsvDataSource {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn csv_path(&self, symbol: &str, interval_minutes: u32) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", symbol.to_uppercase(), interval_minutes))
    }
}

fn field<'a>(record: &'a csv::StringRecord, index: usize, name: &str) -> Result<&'a str, EngineError> {
    record.get(index).ok_or_else(|| EngineError::Data {
        reason: format!("missing {name} column"),
    })
}

fn number(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, EngineError> {
    field(record, index, name)?
        .trim()
        .parse()
        .map_err(|e| EngineError::Data {
            reason: format!("invalid {name} value: {e}"),
        })
}

impl MarketDataSource for CsvDataSource {
    fn get_bars(
        &self,
        symbol: &str,
        interval_minutes: u32,
        range: BarRange,
    ) -> Result<Vec<PriceBar>, EngineError> {
        let path = self.csv_path(symbol, interval_minutes);
        let content = fs::read_to_string(&path).map_err(|e| EngineError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| EngineError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let raw_ts = field(&record, 0, "timestamp")?;
            let timestamp = NaiveDateTime::parse_from_str(raw_ts.trim(), TIMESTAMP_FORMAT)
                .map_err(|e| EngineError::Data {
                    reason: format!("invalid timestamp {raw_ts:?}: {e}"),
                })?;

            if !range.contains(timestamp) {
                continue;
            }

            bars.push(PriceBar {
                timestamp,
                open: number(&record, 1, "open")?,
                high: number(&record, 2, "high")?,
                low: number(&record, 3, "low")?,
                close: number(&record, 4, "close")?,
                volume: number(&record, 5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        debug!(symbol, bars = bars.len(), path = %path.display(), "bars loaded");
        Ok(bars)
    }
}
