//! Order execution port.

use crate::domain::error::EngineError;
use crate::domain::order::{Fill, OrderIntent};

pub trait OrderSink {
    /// Places the order and reports the fill, or why it was rejected.
    fn submit(&mut self, intent: &OrderIntent) -> Result<Fill, EngineError>;
}
