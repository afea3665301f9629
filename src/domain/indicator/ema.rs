//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seeded with the first close, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Every bar carries a value; early values are not yet stable.

use crate::domain::ohlcv::PriceBar;

pub fn calculate_ema(bars: &[PriceBar], period: usize) -> Vec<f64> {
    if period == 0 || bars.is_empty() {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut values = Vec::with_capacity(bars.len());
    let mut ema = bars[0].close;
    values.push(ema);

    for bar in &bars[1..] {
        ema = bar.close * k + ema * (1.0 - k);
        values.push(ema);
    }

    values
}
