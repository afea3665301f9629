//! Running volume-weighted average price, anchored at the first bar of the
//! supplied window.
//!
//! VWAP[i] = Σ(TP[j] * V[j]) / Σ(V[j]) for j ≤ i, TP = (H + L + C) / 3.
//! Until any volume has traded the mean typical price stands in.

use crate::domain::ohlcv::PriceBar;

pub fn calculate_vwap(bars: &[PriceBar]) -> Vec<f64> {
    let mut values = Vec::with_capacity(bars.len());
    let mut pv_sum = 0.0;
    let mut volume_sum = 0.0;
    let mut tp_sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        let tp = bar.typical_price();
        pv_sum += tp * bar.volume;
        volume_sum += bar.volume;
        tp_sum += tp;

        let vwap = if volume_sum > 0.0 {
            pv_sum / volume_sum
        } else {
            tp_sum / (i + 1) as f64
        };
        values.push(vwap);
    }

    values
}
