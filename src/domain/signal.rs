//! Edge-triggered EMA/VWAP entry signals with ATR-derived stops.
//!
//! Long state: fast EMA above slow EMA and close above VWAP. Short state is
//! the mirror. An entry fires only on the bar where a state turns on, so a
//! trend that persists for N bars produces exactly one entry.

use chrono::NaiveDateTime;
use std::fmt;

use super::indicator::IndicatorSet;
use super::instrument::Instrument;
use super::ohlcv::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short. Every mirrored formula multiplies by this.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub direction: Direction,
    pub timestamp: NaiveDateTime,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub atr_at_entry: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopParams {
    pub atr_sl_multiplier: f64,
    pub atr_tp_multiplier: f64,
}

impl Default for StopParams {
    fn default() -> Self {
        StopParams {
            atr_sl_multiplier: 2.0,
            atr_tp_multiplier: 3.0,
        }
    }
}

/// Per-bar state and entry flags over a whole window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryFlags {
    pub long_state: bool,
    pub short_state: bool,
    pub long_entry: bool,
    pub short_entry: bool,
}

fn states(bar: &PriceBar, ind: &IndicatorSet) -> (bool, bool) {
    let long = ind.ema_fast > ind.ema_slow && bar.close > ind.vwap;
    let short = ind.ema_fast < ind.ema_slow && bar.close < ind.vwap;
    (long, short)
}

/// The bar before the window counts as "state off" for both directions.
pub fn entry_flags(bars: &[PriceBar], indicators: &[IndicatorSet]) -> Vec<EntryFlags> {
    let mut prev = (false, false);
    bars.iter()
        .zip(indicators)
        .map(|(bar, ind)| {
            let (long, short) = states(bar, ind);
            let flags = EntryFlags {
                long_state: long,
                short_state: short,
                long_entry: long && !prev.0,
                short_entry: short && !prev.1,
            };
            prev = (long, short);
            flags
        })
        .collect()
}

/// (stop_loss, take_profit) around `entry`, rounded to the instrument's
/// quoted precision.
pub fn calculate_stops(
    entry: f64,
    atr: f64,
    direction: Direction,
    params: &StopParams,
    instrument: &Instrument,
) -> (f64, f64) {
    let sign = direction.sign();
    let sl = entry - sign * params.atr_sl_multiplier * atr;
    let tp = entry + sign * params.atr_tp_multiplier * atr;
    (instrument.round_price(sl), instrument.round_price(tp))
}

/// Signal for the most recent bar, if one fires there.
pub fn generate_signal(
    bars: &[PriceBar],
    indicators: &[IndicatorSet],
    params: &StopParams,
    instrument: &Instrument,
) -> Option<Signal> {
    let n = bars.len().min(indicators.len());
    if n == 0 {
        return None;
    }

    let (bar, ind) = (&bars[n - 1], &indicators[n - 1]);
    let (long, short) = states(bar, ind);
    let (prev_long, prev_short) = if n >= 2 {
        states(&bars[n - 2], &indicators[n - 2])
    } else {
        (false, false)
    };

    let direction = match (long && !prev_long, short && !prev_short) {
        (true, false) => Direction::Long,
        (false, true) => Direction::Short,
        _ => return None,
    };
    let atr = ind.atr?;

    let (stop_loss, take_profit) = calculate_stops(bar.close, atr, direction, params, instrument);
    Some(Signal {
        direction,
        timestamp: bar.timestamp,
        entry_price: bar.close,
        stop_loss,
        take_profit,
        atr_at_entry: atr,
    })
}
