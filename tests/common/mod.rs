#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use edgetrader::domain::config::EngineConfig;
use edgetrader::domain::error::EngineError;
use edgetrader::domain::indicator::IndicatorPeriods;
pub use edgetrader::domain::ohlcv::PriceBar;
use edgetrader::ports::data_port::{BarRange, MarketDataSource};
use std::collections::HashMap;
use std::path::Path;

pub struct MockDataSource {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl MarketDataSource for MockDataSource {
    fn get_bars(
        &self,
        symbol: &str,
        _interval_minutes: u32,
        range: BarRange,
    ) -> Result<Vec<PriceBar>, EngineError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(EngineError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| range.contains(b.timestamp))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Five-minute bars starting 2024-03-04 00:00.
pub fn at(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 4)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::minutes(5 * i as i64)
}

/// Bar at slot `i` spanning close +/- 5 pips.
pub fn bar(i: usize, close: f64) -> PriceBar {
    PriceBar {
        timestamp: at(i),
        open: close,
        high: close + 0.0005,
        low: close - 0.0005,
        close,
        volume: 1000.0,
    }
}

pub fn series(start: usize, closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| bar(start + i, c))
        .collect()
}

/// Steady decline then a breakout: long entry on the 7th bar at 1.1050 with
/// stop 1.0960 and target 1.1185 under [`fast_config`].
pub const LONG_BREAKOUT: [f64; 7] = [1.1000, 1.0990, 1.0980, 1.0970, 1.0960, 1.0950, 1.1050];

/// Mirror image: short entry on the 7th bar at 1.0950, stop 1.1040, target
/// 1.0815.
pub const SHORT_BREAKDOWN: [f64; 7] = [1.1000, 1.1010, 1.1020, 1.1030, 1.1040, 1.1050, 1.0950];

/// Short periods so a handful of bars is enough history.
pub fn fast_config() -> EngineConfig {
    EngineConfig {
        periods: IndicatorPeriods {
            ema_fast: 2,
            ema_slow: 4,
            atr: 3,
        },
        ..EngineConfig::default()
    }
}

pub fn with_symbols(mut config: EngineConfig, symbols: &[&str]) -> EngineConfig {
    config.market.symbols = symbols.iter().map(|s| s.to_string()).collect();
    config
}

pub fn write_bars_csv(dir: &Path, symbol: &str, interval: u32, bars: &[PriceBar]) {
    let mut content = String::from("timestamp,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    std::fs::write(dir.join(format!("{symbol}_{interval}.csv")), content).unwrap();
}
