//! Trade report port.

use crate::domain::error::EngineError;
use crate::domain::position::TradeRecord;

/// Port for writing the closed-trade log.
pub trait ReportPort {
    fn write_trades(&self, trades: &[TradeRecord], output_path: &str) -> Result<(), EngineError>;
}
