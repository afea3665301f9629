//! Simulated positions and their exit transitions.

use chrono::NaiveDateTime;
use std::fmt;

use super::ohlcv::PriceBar;
use super::signal::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionStatus {
    Open,
    StopLoss,
    TakeProfit,
}

impl PositionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PositionStatus::Open => "open",
            PositionStatus::StopLoss => "stop_loss",
            PositionStatus::TakeProfit => "take_profit",
        }
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A terminal transition computed for a position on one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exit {
    pub status: PositionStatus,
    pub price: f64,
    pub time: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub size: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub entry_time: NaiveDateTime,
    pub status: PositionStatus,
    pub exit_price: Option<f64>,
    pub exit_time: Option<NaiveDateTime>,
    pub realized_pnl: f64,
}

impl Position {
    pub fn new(
        symbol: &str,
        direction: Direction,
        entry_price: f64,
        size: f64,
        stop_loss: f64,
        take_profit: f64,
        entry_time: NaiveDateTime,
    ) -> Self {
        Position {
            symbol: symbol.to_string(),
            direction,
            entry_price,
            size,
            stop_loss,
            take_profit,
            entry_time,
            status: PositionStatus::Open,
            exit_price: None,
            exit_time: None,
            realized_pnl: 0.0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    pub fn stop_hit(&self, bar: &PriceBar) -> bool {
        match self.direction {
            Direction::Long => bar.low <= self.stop_loss,
            Direction::Short => bar.high >= self.stop_loss,
        }
    }

    pub fn target_hit(&self, bar: &PriceBar) -> bool {
        match self.direction {
            Direction::Long => bar.high >= self.take_profit,
            Direction::Short => bar.low <= self.take_profit,
        }
    }

    /// Exit triggered by `bar`, if any. The stop is checked first, so a bar
    /// spanning both levels closes at the stop. Bars at or before entry are
    /// ignored.
    pub fn check_exit(&self, bar: &PriceBar) -> Option<Exit> {
        if !self.is_open() || bar.timestamp <= self.entry_time {
            return None;
        }
        let (status, price) = if self.stop_hit(bar) {
            (PositionStatus::StopLoss, self.stop_loss)
        } else if self.target_hit(bar) {
            (PositionStatus::TakeProfit, self.take_profit)
        } else {
            return None;
        };
        Some(Exit {
            status,
            price,
            time: bar.timestamp,
        })
    }

    /// sign * (exit - entry) * size * lot_unit_size
    pub fn pnl_at(&self, exit_price: f64, lot_unit_size: f64) -> f64 {
        self.direction.sign() * (exit_price - self.entry_price) * self.size * lot_unit_size
    }

    pub fn close(&mut self, exit: Exit, lot_unit_size: f64) {
        self.realized_pnl = self.pnl_at(exit.price, lot_unit_size);
        self.exit_price = Some(exit.price);
        self.exit_time = Some(exit.time);
        self.status = exit.status;
    }
}

/// Flat record appended to the trade log on every close.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub symbol: String,
    pub direction: Direction,
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    pub size: f64,
    pub pnl: f64,
    pub status: PositionStatus,
}

impl TradeRecord {
    /// `None` while the position is still open.
    pub fn from_closed(position: &Position) -> Option<Self> {
        Some(TradeRecord {
            symbol: position.symbol.clone(),
            direction: position.direction,
            entry_time: position.entry_time,
            exit_time: position.exit_time?,
            entry_price: position.entry_price,
            exit_price: position.exit_price?,
            size: position.size,
            pnl: position.realized_pnl,
            status: position.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn long_position() -> Position {
        Position::new("EURUSD", Direction::Long, 1.09000, 1.0, 1.08900, 1.09150, at(9))
    }

    fn short_position() -> Position {
        Position::new("EURUSD", Direction::Short, 1.09000, 1.0, 1.09100, 1.08850, at(9))
    }

    fn bar(hour: u32, high: f64, low: f64, close: f64) -> PriceBar {
        PriceBar {
            timestamp: at(hour),
            open: close,
            high,
            low,
            close,
            volume: 100.0,
        }
    }

    #[test]
    fn long_stop_loss_example() {
        let mut pos = long_position();
        let exit = pos.check_exit(&bar(10, 1.09000, 1.08800, 1.08850)).unwrap();
        assert_eq!(exit.status, PositionStatus::StopLoss);
        assert_eq!(exit.price, 1.08900);

        pos.close(exit, 100_000.0);
        assert!(pos.realized_pnl < 0.0);
        assert!((pos.realized_pnl + 100.0).abs() < 1e-6);
        assert!(!pos.is_open());
    }

    #[test]
    fn long_take_profit_example() {
        let mut pos = long_position();
        let exit = pos.check_exit(&bar(10, 1.09200, 1.09000, 1.09150)).unwrap();
        assert_eq!(exit.status, PositionStatus::TakeProfit);
        assert_eq!(exit.price, 1.09150);

        pos.close(exit, 100_000.0);
        assert!(pos.realized_pnl > 0.0);
        assert!((pos.realized_pnl - 150.0).abs() < 1e-6);
    }

    #[test]
    fn stop_wins_when_bar_spans_both_levels() {
        let pos = long_position();
        let exit = pos.check_exit(&bar(10, 1.09200, 1.08800, 1.09000)).unwrap();
        assert_eq!(exit.status, PositionStatus::StopLoss);

        let pos = short_position();
        let exit = pos.check_exit(&bar(10, 1.09200, 1.08800, 1.09000)).unwrap();
        assert_eq!(exit.status, PositionStatus::StopLoss);
    }

    #[test]
    fn short_exits_are_mirrored() {
        let pos = short_position();
        let stop = pos.check_exit(&bar(10, 1.09100, 1.09000, 1.09050)).unwrap();
        assert_eq!(stop.status, PositionStatus::StopLoss);
        assert!(pos.pnl_at(stop.price, 100_000.0) < 0.0);

        let target = pos.check_exit(&bar(10, 1.09000, 1.08850, 1.08900)).unwrap();
        assert_eq!(target.status, PositionStatus::TakeProfit);
        assert!((pos.pnl_at(target.price, 100_000.0) - 150.0).abs() < 1e-6);
    }

    #[test]
    fn no_exit_inside_range() {
        let pos = long_position();
        assert!(pos.check_exit(&bar(10, 1.09100, 1.08950, 1.09050)).is_none());
    }

    #[test]
    fn entry_bar_is_ignored() {
        let pos = long_position();
        assert!(pos.check_exit(&bar(9, 1.09200, 1.08800, 1.09000)).is_none());
    }

    #[test]
    fn closed_position_does_not_exit_again() {
        let mut pos = long_position();
        let exit = pos.check_exit(&bar(10, 1.09200, 1.09000, 1.09150)).unwrap();
        pos.close(exit, 100_000.0);
        assert!(pos.check_exit(&bar(11, 1.09200, 1.08000, 1.08500)).is_none());
    }

    #[test]
    fn trade_record_from_closed_position() {
        let mut pos = long_position();
        assert!(TradeRecord::from_closed(&pos).is_none());

        let exit = pos.check_exit(&bar(10, 1.09200, 1.09000, 1.09150)).unwrap();
        pos.close(exit, 100_000.0);
        let record = TradeRecord::from_closed(&pos).unwrap();
        assert_eq!(record.symbol, "EURUSD");
        assert_eq!(record.status, PositionStatus::TakeProfit);
        assert_eq!(record.exit_time, at(10));
        assert_eq!(record.pnl, pos.realized_pnl);
    }

    #[test]
    fn status_strings() {
        assert_eq!(PositionStatus::StopLoss.to_string(), "stop_loss");
        assert_eq!(PositionStatus::TakeProfit.to_string(), "take_profit");
    }
}
