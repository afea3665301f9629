//! Per-symbol evaluation cycle: exits first, then indicators, signal, risk
//! gate and (maybe) a new paper position.
//!
//! The engine performs no I/O of its own. `run_cycle` pulls bars from a
//! [`MarketDataSource`] and pushes accepted intents to an [`OrderSink`], but
//! a failure in either is reported per symbol and never aborts the cycle.

use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::config::EngineConfig;
use super::error::{EngineError, Refusal};
use super::indicator::compute_indicators;
use super::instrument::Instrument;
use super::ledger::PositionLedger;
use super::metrics::{EquityPoint, TradeStatistics};
use super::ohlcv::{PriceBar, validate_series};
use super::order::OrderIntent;
use super::position::TradeRecord;
use super::risk::RiskGovernor;
use super::signal::{Signal, generate_signal};
use crate::ports::data_port::{BarRange, MarketDataSource};
use crate::ports::order_port::OrderSink;

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The latest bar was already evaluated for this symbol.
    Stale,
    NoSignal,
    Opened(OrderIntent),
    Refused(Refusal),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    /// Trades closed by the latest bar, before any entry was considered.
    pub closed: Vec<TradeRecord>,
    pub signal: Option<Signal>,
    pub outcome: CycleOutcome,
}

/// Everything that happened during one pass over the configured symbols.
#[derive(Debug, Default)]
pub struct CycleSummary {
    pub reports: Vec<CycleReport>,
    pub errors: Vec<(String, EngineError)>,
}

impl CycleSummary {
    pub fn opened(&self) -> impl Iterator<Item = &OrderIntent> {
        self.reports.iter().filter_map(|r| match &r.outcome {
            CycleOutcome::Opened(intent) => Some(intent),
            _ => None,
        })
    }
}

pub fn trailing_window(bars: &[PriceBar], lookback: usize) -> &[PriceBar] {
    if lookback == 0 || bars.len() <= lookback {
        bars
    } else {
        &bars[bars.len() - lookback..]
    }
}

#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    governor: RiskGovernor,
    ledger: PositionLedger,
    last_evaluated: HashMap<String, NaiveDateTime>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let governor = RiskGovernor::new(config.risk.clone());
        Engine {
            config,
            governor,
            ledger: PositionLedger::new(),
            last_evaluated: HashMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn governor(&self) -> &RiskGovernor {
        &self.governor
    }

    /// For callers syncing capital from a reported account balance.
    pub fn governor_mut(&mut self) -> &mut RiskGovernor {
        &mut self.governor
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    pub fn statistics(&self, equity_curve: &[EquityPoint]) -> TradeStatistics {
        TradeStatistics::compute(
            self.config.risk.initial_capital,
            self.governor.capital(),
            self.ledger.trades(),
            equity_curve,
        )
    }

    /// Runs one evaluation for `symbol` against its bar window. Only invalid
    /// input is an `Err`; every recoverable refusal comes back inside the
    /// report.
    pub fn evaluate(&mut self, symbol: &str, bars: &[PriceBar]) -> Result<CycleReport, EngineError> {
        validate_series(symbol, bars)?;
        let latest = &bars[bars.len() - 1];

        let mut report = CycleReport {
            symbol: symbol.to_string(),
            timestamp: latest.timestamp,
            closed: Vec::new(),
            signal: None,
            outcome: CycleOutcome::NoSignal,
        };

        if self
            .last_evaluated
            .get(symbol)
            .is_some_and(|seen| *seen >= latest.timestamp)
        {
            report.outcome = CycleOutcome::Stale;
            return Ok(report);
        }
        self.last_evaluated
            .insert(symbol.to_string(), latest.timestamp);

        report.closed = self.ledger.update(symbol, latest, &mut self.governor);

        let indicators = match compute_indicators(bars, &self.config.periods) {
            Ok(ind) => ind,
            Err(refusal) => {
                debug!(symbol, %refusal, "skipping cycle");
                report.outcome = CycleOutcome::Refused(refusal);
                return Ok(report);
            }
        };

        let instrument = Instrument::from_symbol(symbol);
        let Some(signal) = generate_signal(bars, &indicators, &self.config.stops, &instrument)
        else {
            return Ok(report);
        };
        info!(
            symbol,
            direction = %signal.direction,
            entry = signal.entry_price,
            stop_loss = signal.stop_loss,
            take_profit = signal.take_profit,
            atr = signal.atr_at_entry,
            "entry signal"
        );
        report.signal = Some(signal.clone());
        report.outcome = self.try_open(symbol, &signal);
        Ok(report)
    }

    fn try_open(&mut self, symbol: &str, signal: &Signal) -> CycleOutcome {
        if self.ledger.has_open(symbol) {
            let refusal = Refusal::DuplicatePosition {
                symbol: symbol.to_string(),
            };
            warn!(symbol, %refusal, "signal ignored");
            return CycleOutcome::Refused(refusal);
        }

        let sizing = self.governor.size_and_gate(signal, symbol);
        if let Some(refusal) = sizing.refusal {
            return CycleOutcome::Refused(refusal);
        }

        match self.ledger.open_position(
            &mut self.governor,
            symbol,
            signal.direction,
            signal.entry_price,
            sizing.size,
            signal.stop_loss,
            signal.take_profit,
            signal.timestamp,
        ) {
            Ok(_) => CycleOutcome::Opened(OrderIntent::from_signal(symbol, signal, sizing.size)),
            Err(refusal) => CycleOutcome::Refused(refusal),
        }
    }

    /// One pass over the configured symbols in their configured order.
    pub fn run_cycle(
        &mut self,
        source: &dyn MarketDataSource,
        mut sink: Option<&mut dyn OrderSink>,
        range: BarRange,
    ) -> CycleSummary {
        let mut summary = CycleSummary::default();
        let symbols = self.config.market.symbols.clone();
        let interval = self.config.market.timeframe_minutes;
        let lookback = self.config.market.lookback_bars;

        for symbol in symbols {
            let bars = match source.get_bars(&symbol, interval, range) {
                Ok(bars) => bars,
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "no data this cycle");
                    summary.errors.push((symbol, e));
                    continue;
                }
            };

            let report = match self.evaluate(&symbol, trailing_window(&bars, lookback)) {
                Ok(report) => report,
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "bars rejected");
                    summary.errors.push((symbol, e));
                    continue;
                }
            };

            if let (CycleOutcome::Opened(intent), Some(sink)) = (&report.outcome, sink.as_mut()) {
                if let Err(e) = sink.submit(intent) {
                    warn!(symbol = %symbol, error = %e, "order sink rejected intent");
                    summary.errors.push((symbol.clone(), e));
                }
            }
            summary.reports.push(report);
        }

        summary
    }
}

/// Engine behind a single mutex. Every evaluation holds the lock for its
/// whole duration, so the position-count check and increment cannot
/// interleave between callers.
#[derive(Debug, Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<Engine>>,
}

impl SharedEngine {
    pub fn new(engine: Engine) -> Self {
        SharedEngine {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    pub fn evaluate(&self, symbol: &str, bars: &[PriceBar]) -> Result<CycleReport, EngineError> {
        self.with(|engine| engine.evaluate(symbol, bars))
    }
}
