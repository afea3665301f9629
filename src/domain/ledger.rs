//! Paper position ledger: open set, closed log and trade records.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use tracing::info;

use super::error::Refusal;
use super::ohlcv::PriceBar;
use super::position::{Exit, Position, TradeRecord};
use super::risk::RiskGovernor;
use super::signal::Direction;

#[derive(Debug, Clone, Default)]
pub struct PositionLedger {
    open: BTreeMap<String, Position>,
    closed: Vec<Position>,
    trades: Vec<TradeRecord>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_open(&self, symbol: &str) -> bool {
        self.open.contains_key(symbol)
    }

    pub fn open_position_for(&self, symbol: &str) -> Option<&Position> {
        self.open.get(symbol)
    }

    /// Open positions, optionally restricted to one symbol.
    pub fn open_positions(&self, symbol: Option<&str>) -> Vec<&Position> {
        self.open
            .values()
            .filter(|p| symbol.is_none_or(|s| p.symbol == s))
            .collect()
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn closed_positions(&self) -> &[Position] {
        &self.closed
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    /// Opens a position after the governor grants a slot. Fails without side
    /// effects on a duplicate symbol or a gate refusal.
    #[allow(clippy::too_many_arguments)]
    pub fn open_position(
        &mut self,
        governor: &mut RiskGovernor,
        symbol: &str,
        direction: Direction,
        entry_price: f64,
        size: f64,
        stop_loss: f64,
        take_profit: f64,
        entry_time: NaiveDateTime,
    ) -> Result<&Position, Refusal> {
        if self.has_open(symbol) {
            return Err(Refusal::DuplicatePosition {
                symbol: symbol.to_string(),
            });
        }
        governor.open_position()?;

        info!(
            symbol,
            %direction,
            size,
            entry_price,
            stop_loss,
            take_profit,
            "paper position opened"
        );
        let position = Position::new(
            symbol,
            direction,
            entry_price,
            size,
            stop_loss,
            take_profit,
            entry_time,
        );
        Ok(self.open.entry(symbol.to_string()).or_insert(position))
    }

    /// Checks open positions on `symbol` against `bar`, closing those whose
    /// stop or target was hit. Transitions are computed over a snapshot of the
    /// open set and then applied in one pass.
    pub fn update(
        &mut self,
        symbol: &str,
        bar: &PriceBar,
        governor: &mut RiskGovernor,
    ) -> Vec<TradeRecord> {
        let exits: Vec<(String, Exit)> = self
            .open
            .iter()
            .filter(|(_, p)| p.symbol == symbol)
            .filter_map(|(key, p)| p.check_exit(bar).map(|exit| (key.clone(), exit)))
            .collect();

        let lot_unit_size = governor.config().lot_unit_size;
        let mut closed = Vec::with_capacity(exits.len());
        for (key, exit) in exits {
            let Some(mut position) = self.open.remove(&key) else {
                continue;
            };
            position.close(exit, lot_unit_size);
            governor.close_position(position.realized_pnl);

            info!(
                symbol = %position.symbol,
                status = %position.status,
                exit_price = exit.price,
                pnl = position.realized_pnl,
                capital = governor.capital(),
                "paper position closed"
            );

            if let Some(record) = TradeRecord::from_closed(&position) {
                self.trades.push(record.clone());
                closed.push(record);
            }
            self.closed.push(position);
        }
        closed
    }
}
