//! Paper order sink: acknowledges every intent with a fill at the signal's
//! entry price and keeps the intents for inspection.

use tracing::info;

use crate::domain::error::EngineError;
use crate::domain::order::{Fill, OrderIntent};
use crate::ports::order_port::OrderSink;

#[derive(Debug, Default)]
pub struct PaperOrderSink {
    next_id: u64,
    submitted: Vec<OrderIntent>,
}

impl PaperOrderSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> &[OrderIntent] {
        &self.submitted
    }
}

impl OrderSink for PaperOrderSink {
    fn submit(&mut self, intent: &OrderIntent) -> Result<Fill, EngineError> {
        if !(intent.size > 0.0) {
            return Err(EngineError::Order {
                reason: format!("non-positive size {} for {}", intent.size, intent.symbol),
            });
        }

        self.next_id += 1;
        self.submitted.push(intent.clone());
        info!(
            order_id = self.next_id,
            symbol = %intent.symbol,
            direction = %intent.direction,
            size = intent.size,
            price = intent.entry_price,
            stop_loss = intent.stop_loss,
            take_profit = intent.take_profit,
            "paper order filled"
        );

        Ok(Fill {
            order_id: self.next_id,
            symbol: intent.symbol.clone(),
            size: intent.size,
            price: intent.entry_price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::Direction;
    use chrono::NaiveDate;

    fn intent(size: f64) -> OrderIntent {
        OrderIntent {
            symbol: "EURUSD".into(),
            direction: Direction::Long,
            size,
            entry_price: 1.09,
            stop_loss: 1.089,
            take_profit: 1.0915,
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 4)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn fills_at_entry_price_with_increasing_ids() {
        let mut sink = PaperOrderSink::new();
        let first = sink.submit(&intent(1.0)).unwrap();
        let second = sink.submit(&intent(0.5)).unwrap();

        assert_eq!(first.order_id, 1);
        assert_eq!(second.order_id, 2);
        assert_eq!(first.price, 1.09);
        assert_eq!(second.size, 0.5);
        assert_eq!(sink.submitted().len(), 2);
    }

    #[test]
    fn rejects_zero_size() {
        let mut sink = PaperOrderSink::new();
        assert!(matches!(
            sink.submit(&intent(0.0)),
            Err(EngineError::Order { .. })
        ));
        assert!(sink.submitted().is_empty());
    }
}
