//! Price bar representation and input validation.

use chrono::NaiveDateTime;

use super::error::EngineError;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    /// Rejects bars the engine cannot reason about: non-finite prices,
    /// an inverted range, open/close outside [low, high], negative volume.
    pub fn validate(&self) -> Result<(), String> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err("prices must be finite and positive".into());
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err("volume must be finite and non-negative".into());
        }
        if self.high < self.low {
            return Err(format!("high {} below low {}", self.high, self.low));
        }
        for (name, value) in [("open", self.open), ("close", self.close)] {
            if value < self.low || value > self.high {
                return Err(format!(
                    "{name} {value} outside range [{}, {}]",
                    self.low, self.high
                ));
            }
        }
        Ok(())
    }
}

/// Validates a whole series: non-empty, every bar well-formed, timestamps
/// strictly increasing.
pub fn validate_series(symbol: &str, bars: &[PriceBar]) -> Result<(), EngineError> {
    if bars.is_empty() {
        return Err(EngineError::EmptySeries {
            symbol: symbol.to_string(),
        });
    }

    for (index, bar) in bars.iter().enumerate() {
        bar.validate().map_err(|reason| EngineError::MalformedBar {
            symbol: symbol.to_string(),
            index,
            reason,
        })?;
    }

    if let Some(index) = bars
        .windows(2)
        .position(|w| w[1].timestamp <= w[0].timestamp)
    {
        return Err(EngineError::UnorderedBars {
            symbol: symbol.to_string(),
            timestamp: bars[index + 1].timestamp,
        });
    }

    Ok(())
}
