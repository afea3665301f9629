//! Market data source port.

use chrono::NaiveDateTime;

use crate::domain::error::EngineError;
use crate::domain::ohlcv::PriceBar;

/// Inclusive timestamp bounds; `None` leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BarRange {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl BarRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        BarRange {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start.is_none_or(|s| ts >= s) && self.end.is_none_or(|e| ts <= e)
    }
}

pub trait MarketDataSource {
    /// Bars for `symbol` on an `interval_minutes` timeframe, ordered by
    /// timestamp.
    fn get_bars(
        &self,
        symbol: &str,
        interval_minutes: u32,
        range: BarRange,
    ) -> Result<Vec<PriceBar>, EngineError>;
}
