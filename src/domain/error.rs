//! Domain error types.

use chrono::NaiveDateTime;

/// Why a cycle declined to open a position for a symbol.
///
/// None of these are fatal: the cycle carries on with the next symbol and
/// the same symbol is evaluated again on the next bar.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Refusal {
    #[error("insufficient history: have {bars} bars, need {required}")]
    InsufficientHistory { bars: usize, required: usize },

    #[error("stop-loss equals entry price {entry}")]
    ZeroStopDistance { entry: f64 },

    #[error("position already open for {symbol}")]
    DuplicatePosition { symbol: String },

    #[error("drawdown halt: capital {capital:.2} below floor {floor:.2}")]
    DrawdownHalt { capital: f64, floor: f64 },

    #[error("max open positions reached: {open}/{max}")]
    PositionCountExceeded { open: usize, max: usize },
}

/// Top-level error type for edgetrader.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("empty bar series for {symbol}")]
    EmptySeries { symbol: String },

    #[error("malformed bar {index} for {symbol}: {reason}")]
    MalformedBar {
        symbol: String,
        index: usize,
        reason: String,
    },

    #[error("bars for {symbol} not strictly ordered at {timestamp}")]
    UnorderedBars {
        symbol: String,
        timestamp: NaiveDateTime,
    },

    #[error(transparent)]
    Refused(#[from] Refusal),

    #[error("market data error: {reason}")]
    Data { reason: String },

    #[error("order rejected: {reason}")]
    Order { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&EngineError> for std::process::ExitCode {
    fn from(err: &EngineError) -> Self {
        let code: u8 = match err {
            EngineError::Io(_) => 1,
            EngineError::ConfigParse { .. } | EngineError::ConfigInvalid { .. } => 2,
            EngineError::Data { .. } => 3,
            EngineError::EmptySeries { .. }
            | EngineError::MalformedBar { .. }
            | EngineError::UnorderedBars { .. } => 4,
            EngineError::Refused(_) | EngineError::Order { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
