//! CSV trade-log writer.

use crate::adapters::csv_adapter::TIMESTAMP_FORMAT;
use crate::domain::error::EngineError;
use crate::domain::position::TradeRecord;
use crate::ports::report_port::ReportPort;

pub struct CsvTradeReport;

const HEADER: [&str; 9] = [
    "symbol",
    "direction",
    "entry_time",
    "exit_time",
    "entry_price",
    "exit_price",
    "size",
    "pnl",
    "status",
];

impl ReportPort for CsvTradeReport {
    fn write_trades(&self, trades: &[TradeRecord], output_path: &str) -> Result<(), EngineError> {
        let to_io = |e: csv::Error| EngineError::Io(std::io::Error::other(e));
        let mut wtr = csv::Writer::from_path(output_path).map_err(to_io)?;

        wtr.write_record(HEADER).map_err(to_io)?;
        for t in trades {
            wtr.write_record([
                t.symbol.clone(),
                t.direction.to_string(),
                t.entry_time.format(TIMESTAMP_FORMAT).to_string(),
                t.exit_time.format(TIMESTAMP_FORMAT).to_string(),
                format!("{:.5}", t.entry_price),
                format!("{:.5}", t.exit_price),
                format!("{:.2}", t.size),
                format!("{:.2}", t.pnl),
                t.status.to_string(),
            ])
            .map_err(to_io)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
