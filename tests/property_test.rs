//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Sizing: lots always land inside [min_lot, max_lot]
//! 2. ATR is never negative
//! 3. Entries are edge-triggered: never on two consecutive bars
//! 4. Capital accounting: capital equals initial plus realized P&L
//! 5. Position cap and one-position-per-symbol hold through a replay

mod common;

use common::*;
use edgetrader::domain::backtest::{SymbolSeries, run_backtest};
use edgetrader::domain::engine::Engine;
use edgetrader::domain::indicator::atr::calculate_atr;
use edgetrader::domain::indicator::{IndicatorPeriods, compute_indicators};
use edgetrader::domain::risk::{RiskConfig, RiskGovernor};
use edgetrader::domain::signal::entry_flags;
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

/// Random walk of `len` bars around 1.1 with wicks on both sides.
fn arb_walk(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<PriceBar>> {
    prop::collection::vec((-0.003..0.003_f64, 0.0..0.001_f64, 0.0..0.001_f64, 0.0..5000.0_f64), len)
        .prop_map(|steps| {
            let mut close = 1.1;
            steps
                .into_iter()
                .enumerate()
                .map(|(i, (step, up, down, volume))| {
                    let open = close;
                    close = (close + step).max(0.5);
                    PriceBar {
                        timestamp: at(i),
                        open,
                        high: open.max(close) + up,
                        low: open.min(close) - down,
                        close,
                        volume,
                    }
                })
                .collect()
        })
}

fn arb_symbol() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["EURUSD", "GBPUSD", "USDJPY", "EURJPY", "AUDUSD"])
}

// ── 1. Sizing bounds ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn position_size_within_lot_bounds(
        capital in 1.0..1_000_000.0_f64,
        entry in 0.5..200.0_f64,
        distance in 0.00001..5.0_f64,
        symbol in arb_symbol(),
    ) {
        let mut governor = RiskGovernor::new(RiskConfig::default());
        governor.update_capital(capital);
        let size = governor.position_size(entry, entry - distance, symbol).unwrap();
        prop_assert!(size >= 0.01);
        prop_assert!(size <= 10.0);
    }

    #[test]
    fn zero_stop_distance_always_refused(entry in 0.5..200.0_f64, symbol in arb_symbol()) {
        let governor = RiskGovernor::new(RiskConfig::default());
        prop_assert!(governor.position_size(entry, entry, symbol).is_err());
    }
}

// ── 2. ATR non-negative ──────────────────────────────────────────────

proptest! {
    #[test]
    fn atr_never_negative(bars in arb_walk(1..120), period in 1usize..30) {
        let atr = calculate_atr(&bars, period);
        prop_assert_eq!(atr.len(), bars.len());
        for (i, value) in atr.iter().enumerate() {
            match value {
                Some(v) => {
                    prop_assert!(i + 1 >= period);
                    prop_assert!(*v >= 0.0);
                }
                None => prop_assert!(i + 1 < period),
            }
        }
    }
}

// ── 3. Edge-triggered entries ────────────────────────────────────────

proptest! {
    #[test]
    fn entries_never_fire_on_consecutive_bars(bars in arb_walk(30..150)) {
        let periods = IndicatorPeriods { ema_fast: 3, ema_slow: 8, atr: 5 };
        let indicators = compute_indicators(&bars, &periods).unwrap();
        let flags = entry_flags(&bars, &indicators);

        for w in flags.windows(2) {
            prop_assert!(!(w[0].long_entry && w[1].long_entry));
            prop_assert!(!(w[0].short_entry && w[1].short_entry));
            if w[1].long_entry {
                prop_assert!(!w[0].long_state);
            }
            if w[1].short_entry {
                prop_assert!(!w[0].short_state);
            }
        }
        for f in &flags {
            prop_assert!(!(f.long_state && f.short_state));
        }
    }
}

// ── 4. Capital accounting ────────────────────────────────────────────

proptest! {
    #[test]
    fn capital_is_initial_plus_realized_pnl(
        pnls in prop::collection::vec(-100.0..100.0_f64, 0..50),
    ) {
        let mut governor = RiskGovernor::new(RiskConfig {
            max_drawdown_fraction: 1.0,
            ..RiskConfig::default()
        });
        let mut expected = 10_000.0;
        let mut peak = expected;
        for pnl in pnls {
            governor.open_position().unwrap();
            governor.close_position(pnl);
            expected += pnl;
            peak = f64::max(peak, expected);
            prop_assert_eq!(governor.capital(), expected);
            prop_assert_eq!(governor.state().high_water_mark, peak);
            prop_assert_eq!(governor.state().open_position_count, 0);
        }
    }

    #[test]
    fn open_count_never_exceeds_max(attempts in 0usize..20, max in 1usize..6) {
        let mut governor = RiskGovernor::new(RiskConfig {
            max_open_positions: max,
            ..RiskConfig::default()
        });
        let granted = (0..attempts).filter(|_| governor.open_position().is_ok()).count();
        prop_assert_eq!(granted, attempts.min(max));
        prop_assert!(governor.state().open_position_count <= max);
    }
}

// ── 5. Replay invariants ─────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn replay_respects_caps_and_accounting(
        eur in arb_walk(20..80),
        gbp in arb_walk(20..80),
        aud in arb_walk(20..80),
        max_open in 1usize..3,
    ) {
        let mut config = fast_config();
        config.risk.max_open_positions = max_open;
        let mut engine = Engine::new(config);
        let series = vec![
            SymbolSeries::new("EURUSD", eur),
            SymbolSeries::new("GBPUSD", gbp),
            SymbolSeries::new("AUDUSD", aud),
        ];

        let result = run_backtest(&mut engine, &series).unwrap();

        prop_assert!(engine.ledger().open_count() <= max_open);
        prop_assert_eq!(
            engine.ledger().open_count(),
            engine.governor().state().open_position_count
        );
        let expected = result.trades.iter().fold(10_000.0, |acc, t| acc + t.pnl);
        prop_assert_eq!(result.final_capital, expected);
        for t in &result.trades {
            prop_assert!(t.exit_time > t.entry_time);
            prop_assert!(t.size >= 0.01 && t.size <= 10.0);
        }
    }
}
