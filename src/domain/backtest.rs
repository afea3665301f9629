//! Historical replay through the live engine.
//!
//! Bars for every symbol are merged into one timeline; at each timestamp the
//! engine sees, per symbol, the history up to and including that bar, exactly
//! as a live poll would have.

use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap};
use tracing::info;

use super::engine::{CycleOutcome, Engine, trailing_window};
use super::error::EngineError;
use super::metrics::{EquityPoint, TradeStatistics};
use super::ohlcv::{PriceBar, validate_series};
use super::position::TradeRecord;
use crate::ports::data_port::{BarRange, MarketDataSource};

#[derive(Debug, Clone)]
pub struct SymbolSeries {
    pub symbol: String,
    pub bars: Vec<PriceBar>,
    index: HashMap<NaiveDateTime, usize>,
}

impl SymbolSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Self {
        let index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.timestamp, i))
            .collect();
        SymbolSeries {
            symbol: symbol.into(),
            bars,
            index,
        }
    }

    pub fn bar_index(&self, timestamp: NaiveDateTime) -> Option<usize> {
        self.index.get(&timestamp).copied()
    }
}

/// Sorted, de-duplicated timestamps across all series.
pub fn build_unified_timeline(series: &[SymbolSeries]) -> Vec<NaiveDateTime> {
    let unique: BTreeSet<NaiveDateTime> = series
        .iter()
        .flat_map(|s| s.bars.iter().map(|bar| bar.timestamp))
        .collect();
    unique.into_iter().collect()
}

pub fn load_series(
    source: &dyn MarketDataSource,
    symbols: &[String],
    interval_minutes: u32,
    range: BarRange,
) -> Result<Vec<SymbolSeries>, EngineError> {
    symbols
        .iter()
        .map(|symbol| {
            let bars = source.get_bars(symbol, interval_minutes, range)?;
            Ok(SymbolSeries::new(symbol.clone(), bars))
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
    pub statistics: TradeStatistics,
    pub final_capital: f64,
    pub signals: usize,
    pub refusals: usize,
    /// Positions still open when the data ran out.
    pub open_at_end: usize,
}

/// Replays `series` bar by bar. Equity is realized capital, sampled once per
/// timeline step after every symbol has been evaluated.
pub fn run_backtest(engine: &mut Engine, series: &[SymbolSeries]) -> Result<BacktestResult, EngineError> {
    for s in series {
        validate_series(&s.symbol, &s.bars)?;
    }

    let timeline = build_unified_timeline(series);
    let lookback = engine.config().market.lookback_bars;
    let mut equity_curve = Vec::with_capacity(timeline.len());
    let mut signals = 0;
    let mut refusals = 0;

    info!(
        symbols = series.len(),
        steps = timeline.len(),
        "backtest started"
    );

    for &timestamp in &timeline {
        for s in series {
            let Some(idx) = s.bar_index(timestamp) else {
                continue;
            };
            let window = trailing_window(&s.bars[..=idx], lookback);
            let report = engine.evaluate(&s.symbol, window)?;

            if report.signal.is_some() {
                signals += 1;
            }
            if matches!(report.outcome, CycleOutcome::Refused(_)) && report.signal.is_some() {
                refusals += 1;
            }
        }
        equity_curve.push(EquityPoint {
            timestamp,
            equity: engine.governor().capital(),
        });
    }

    let statistics = engine.statistics(&equity_curve);
    let result = BacktestResult {
        trades: engine.ledger().trades().to_vec(),
        equity_curve,
        final_capital: engine.governor().capital(),
        statistics,
        signals,
        refusals,
        open_at_end: engine.ledger().open_count(),
    };

    info!(
        trades = result.trades.len(),
        final_capital = result.final_capital,
        total_return = result.statistics.total_return,
        max_drawdown = result.statistics.max_drawdown,
        "backtest finished"
    );
    Ok(result)
}
