//! Technical indicators for the EMA/VWAP entry model.
//!
//! - `IndicatorPeriods`: the three lookbacks the engine is configured with
//! - `IndicatorSet`: one bar's derived values
//! - `compute_indicators`: annotates a whole bar window, 1:1 with the input

pub mod atr;
pub mod ema;
pub mod vwap;

use crate::domain::error::Refusal;
use crate::domain::ohlcv::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorPeriods {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub atr: usize,
}

impl Default for IndicatorPeriods {
    fn default() -> Self {
        IndicatorPeriods {
            ema_fast: 9,
            ema_slow: 21,
            atr: 14,
        }
    }
}

impl IndicatorPeriods {
    /// Bars needed before a signal may be evaluated: max(slow, atr) + 1.
    pub fn required_bars(&self) -> usize {
        self.ema_slow.max(self.atr) + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSet {
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub vwap: f64,
    pub atr: Option<f64>,
}

pub fn compute_indicators(
    bars: &[PriceBar],
    periods: &IndicatorPeriods,
) -> Result<Vec<IndicatorSet>, Refusal> {
    let required = periods.required_bars();
    if bars.len() < required {
        return Err(Refusal::InsufficientHistory {
            bars: bars.len(),
            required,
        });
    }

    let fast = ema::calculate_ema(bars, periods.ema_fast);
    let slow = ema::calculate_ema(bars, periods.ema_slow);
    let vwap = vwap::calculate_vwap(bars);
    let atr = atr::calculate_atr(bars, periods.atr);

    Ok((0..bars.len())
        .map(|i| IndicatorSet {
            ema_fast: fast[i],
            ema_slow: slow[i],
            vwap: vwap[i],
            atr: atr[i],
        })
        .collect())
}
