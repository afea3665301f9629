//! Order intents handed to the execution side, and the fills it reports.

use chrono::NaiveDateTime;

use super::signal::{Direction, Signal};

#[derive(Debug, Clone, PartialEq)]
pub struct OrderIntent {
    pub symbol: String,
    pub direction: Direction,
    pub size: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub timestamp: NaiveDateTime,
}

impl OrderIntent {
    pub fn from_signal(symbol: &str, signal: &Signal, size: f64) -> Self {
        OrderIntent {
            symbol: symbol.to_string(),
            direction: signal.direction,
            size,
            entry_price: signal.entry_price,
            stop_loss: signal.stop_loss,
            take_profit: signal.take_profit,
            timestamp: signal.timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub order_id: u64,
    pub symbol: String,
    pub size: f64,
    pub price: f64,
}
