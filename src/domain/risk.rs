//! Position sizing and entry gating against the account's risk budget.
//!
//! The governor is the sole owner of [`RiskState`]. The ledger reports
//! realized P&L through [`RiskGovernor::close_position`] and never touches
//! capital directly.

use tracing::{debug, info, warn};

use super::error::Refusal;
use super::instrument::{Instrument, round_to};
use super::signal::Signal;

#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    pub risk_fraction: f64,
    pub initial_capital: f64,
    pub max_open_positions: usize,
    pub max_drawdown_fraction: f64,
    pub min_lot: f64,
    pub max_lot: f64,
    pub lot_unit_size: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskConfig {
            risk_fraction: 0.01,
            initial_capital: 10_000.0,
            max_open_positions: 3,
            max_drawdown_fraction: 0.5,
            min_lot: 0.01,
            max_lot: 10.0,
            lot_unit_size: 100_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskState {
    pub capital: f64,
    pub high_water_mark: f64,
    pub open_position_count: usize,
    pub max_position_count: usize,
    pub max_drawdown_fraction: f64,
}

impl RiskState {
    /// Capital below which new entries halt.
    pub fn drawdown_floor(&self) -> f64 {
        self.high_water_mark * (1.0 - self.max_drawdown_fraction)
    }

    /// Fractional decline of capital from its peak.
    pub fn drawdown(&self) -> f64 {
        if self.high_water_mark > 0.0 {
            ((self.high_water_mark - self.capital) / self.high_water_mark).max(0.0)
        } else {
            0.0
        }
    }
}

/// Result of sizing a signal. `size` is zero whenever sizing itself failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Sizing {
    pub size: f64,
    pub accepted: bool,
    pub refusal: Option<Refusal>,
}

#[derive(Debug, Clone)]
pub struct RiskGovernor {
    config: RiskConfig,
    state: RiskState,
}

impl RiskGovernor {
    pub fn new(config: RiskConfig) -> Self {
        let state = RiskState {
            capital: config.initial_capital,
            high_water_mark: config.initial_capital,
            open_position_count: 0,
            max_position_count: config.max_open_positions,
            max_drawdown_fraction: config.max_drawdown_fraction,
        };
        info!(
            risk_fraction = config.risk_fraction,
            capital = config.initial_capital,
            "risk governor initialised"
        );
        RiskGovernor { config, state }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn state(&self) -> &RiskState {
        &self.state
    }

    pub fn capital(&self) -> f64 {
        self.state.capital
    }

    /// Lots to trade so that hitting the stop loses `capital * risk_fraction`.
    ///
    /// Rounded to 0.01 lots, then clamped to `[min_lot, max_lot]`.
    pub fn position_size(&self, entry: f64, stop_loss: f64, symbol: &str) -> Result<f64, Refusal> {
        let pip_size = Instrument::from_symbol(symbol).pip_size;
        let risk_amount = self.state.capital * self.config.risk_fraction;
        let stop_distance_pips = (entry - stop_loss).abs() / pip_size;
        if stop_distance_pips == 0.0 {
            return Err(Refusal::ZeroStopDistance { entry });
        }

        let value_per_pip = pip_size * self.config.lot_unit_size;
        let lots = round_to(risk_amount / (stop_distance_pips * value_per_pip), 2);
        let lots = lots.clamp(self.config.min_lot, self.config.max_lot);

        debug!(symbol, lots, risk_amount, stop_distance_pips, "position size");
        Ok(lots)
    }

    /// Entry gate: position-count cap, then the drawdown halt.
    pub fn can_open(&self) -> Result<(), Refusal> {
        let s = &self.state;
        if s.open_position_count >= s.max_position_count {
            return Err(Refusal::PositionCountExceeded {
                open: s.open_position_count,
                max: s.max_position_count,
            });
        }
        let floor = s.drawdown_floor();
        if s.capital < floor {
            return Err(Refusal::DrawdownHalt {
                capital: s.capital,
                floor,
            });
        }
        Ok(())
    }

    pub fn size_and_gate(&self, signal: &Signal, symbol: &str) -> Sizing {
        let size = match self.position_size(signal.entry_price, signal.stop_loss, symbol) {
            Ok(size) => size,
            Err(refusal) => {
                warn!(symbol, %refusal, "signal rejected");
                return Sizing {
                    size: 0.0,
                    accepted: false,
                    refusal: Some(refusal),
                };
            }
        };

        match self.can_open() {
            Ok(()) => Sizing {
                size,
                accepted: true,
                refusal: None,
            },
            Err(refusal) => {
                warn!(symbol, %refusal, "entry gated");
                Sizing {
                    size,
                    accepted: false,
                    refusal: Some(refusal),
                }
            }
        }
    }

    /// Check-and-increment in one step; the count only moves if the gate
    /// passes.
    pub fn open_position(&mut self) -> Result<(), Refusal> {
        self.can_open()?;
        self.state.open_position_count += 1;
        info!(
            open = self.state.open_position_count,
            max = self.state.max_position_count,
            "position slot taken"
        );
        Ok(())
    }

    pub fn close_position(&mut self, pnl: f64) {
        self.state.open_position_count = self.state.open_position_count.saturating_sub(1);
        let capital = self.state.capital + pnl;
        self.update_capital(capital);
        info!(
            pnl,
            open = self.state.open_position_count,
            "position slot released"
        );
    }

    /// Sets capital (e.g. from a reported account balance) and raises the
    /// high-water mark if exceeded.
    pub fn update_capital(&mut self, capital: f64) {
        self.state.capital = capital;
        self.state.high_water_mark = self.state.high_water_mark.max(capital);
        debug!(
            capital,
            high_water_mark = self.state.high_water_mark,
            "capital updated"
        );
    }
}
