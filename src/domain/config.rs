//! Engine configuration: defaults, loading through a [`ConfigPort`], and
//! validation of every field before the engine runs.

use std::path::PathBuf;

use crate::domain::error::EngineError;
use crate::domain::indicator::IndicatorPeriods;
use crate::domain::risk::RiskConfig;
use crate::domain::signal::StopParams;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub struct MarketConfig {
    /// Evaluated in this order every cycle.
    pub symbols: Vec<String>,
    pub timeframe_minutes: u32,
    pub data_dir: PathBuf,
    /// Trailing window handed to the engine each cycle; 0 = whole history.
    pub lookback_bars: usize,
}

const MINUTES_PER_WEEK: usize = 7 * 24 * 60;

/// One week of bars at `timeframe_minutes`, never fewer than `periods` need.
pub fn default_lookback(timeframe_minutes: u32, periods: &IndicatorPeriods) -> usize {
    let week = MINUTES_PER_WEEK / (timeframe_minutes.max(1) as usize);
    week.max(periods.required_bars())
}

impl Default for MarketConfig {
    fn default() -> Self {
        MarketConfig {
            symbols: vec!["EURUSD".into(), "GBPUSD".into(), "USDJPY".into()],
            timeframe_minutes: 5,
            data_dir: PathBuf::from("data"),
            lookback_bars: default_lookback(5, &IndicatorPeriods::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub periods: IndicatorPeriods,
    pub stops: StopParams,
    pub risk: RiskConfig,
    pub market: MarketConfig,
    pub poll_interval_secs: u64,
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            periods: IndicatorPeriods::default(),
            stops: StopParams::default(),
            risk: RiskConfig::default(),
            market: MarketConfig::default(),
            poll_interval_secs: 60,
            log_level: "info".into(),
        }
    }
}

impl EngineConfig {
    /// Reads every recognised key, falling back to defaults, then validates.
    pub fn from_port(port: &dyn ConfigPort) -> Result<Self, EngineError> {
        let d = EngineConfig::default();

        let periods = IndicatorPeriods {
            ema_fast: get_count(port, "strategy", "ema_fast_period", d.periods.ema_fast)?,
            ema_slow: get_count(port, "strategy", "ema_slow_period", d.periods.ema_slow)?,
            atr: get_count(port, "strategy", "atr_period", d.periods.atr)?,
        };
        let stops = StopParams {
            atr_sl_multiplier: port.get_double(
                "strategy",
                "atr_sl_multiplier",
                d.stops.atr_sl_multiplier,
            )?,
            atr_tp_multiplier: port.get_double(
                "strategy",
                "atr_tp_multiplier",
                d.stops.atr_tp_multiplier,
            )?,
        };
        let risk = RiskConfig {
            risk_fraction: port.get_double("risk", "risk_fraction", d.risk.risk_fraction)?,
            initial_capital: port.get_double("risk", "initial_capital", d.risk.initial_capital)?,
            max_open_positions: get_count(
                port,
                "risk",
                "max_open_positions",
                d.risk.max_open_positions,
            )?,
            max_drawdown_fraction: port.get_double(
                "risk",
                "max_drawdown_fraction",
                d.risk.max_drawdown_fraction,
            )?,
            min_lot: port.get_double("risk", "min_lot", d.risk.min_lot)?,
            max_lot: port.get_double("risk", "max_lot", d.risk.max_lot)?,
            lot_unit_size: port.get_double("risk", "lot_unit_size", d.risk.lot_unit_size)?,
        };
        let timeframe_minutes = get_count(
            port,
            "market",
            "timeframe",
            d.market.timeframe_minutes as usize,
        )? as u32;
        let market = MarketConfig {
            symbols: port
                .get_list("market", "symbols")
                .unwrap_or(d.market.symbols),
            timeframe_minutes,
            data_dir: port
                .get_string("market", "data_dir")
                .map(PathBuf::from)
                .unwrap_or(d.market.data_dir),
            lookback_bars: get_count(
                port,
                "market",
                "lookback_bars",
                default_lookback(timeframe_minutes, &periods),
            )?,
        };

        let config = EngineConfig {
            periods,
            stops,
            risk,
            market,
            poll_interval_secs: get_count(
                port,
                "paper",
                "poll_interval_secs",
                d.poll_interval_secs as usize,
            )? as u64,
            log_level: port
                .get_string("logging", "log_level")
                .unwrap_or(d.log_level),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        validate_periods(&self.periods)?;
        validate_stops(&self.stops)?;
        validate_risk(&self.risk)?;
        validate_market(&self.market)?;
        validate_lookback(self.market.lookback_bars, &self.periods)?;
        Ok(())
    }
}

fn get_count(
    port: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, EngineError> {
    let value = port.get_int(section, key, default as i64)?;
    usize::try_from(value).map_err(|_| invalid(section, key, "must be non-negative"))
}

fn invalid(section: &str, key: &str, reason: &str) -> EngineError {
    EngineError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_periods(p: &IndicatorPeriods) -> Result<(), EngineError> {
    for (key, value) in [
        ("ema_fast_period", p.ema_fast),
        ("ema_slow_period", p.ema_slow),
        ("atr_period", p.atr),
    ] {
        if value == 0 {
            return Err(invalid("strategy", key, "period must be at least 1"));
        }
    }
    if p.ema_fast >= p.ema_slow {
        return Err(invalid(
            "strategy",
            "ema_fast_period",
            "must be shorter than ema_slow_period",
        ));
    }
    Ok(())
}

fn validate_stops(s: &StopParams) -> Result<(), EngineError> {
    if !(s.atr_sl_multiplier > 0.0) {
        return Err(invalid("strategy", "atr_sl_multiplier", "must be positive"));
    }
    if !(s.atr_tp_multiplier > 0.0) {
        return Err(invalid("strategy", "atr_tp_multiplier", "must be positive"));
    }
    Ok(())
}

fn validate_risk(r: &RiskConfig) -> Result<(), EngineError> {
    if !(r.risk_fraction > 0.0 && r.risk_fraction < 1.0) {
        return Err(invalid("risk", "risk_fraction", "must be between 0 and 1"));
    }
    if !(r.initial_capital > 0.0) {
        return Err(invalid("risk", "initial_capital", "must be positive"));
    }
    if r.max_open_positions == 0 {
        return Err(invalid("risk", "max_open_positions", "must be at least 1"));
    }
    if !(r.max_drawdown_fraction > 0.0 && r.max_drawdown_fraction <= 1.0) {
        return Err(invalid(
            "risk",
            "max_drawdown_fraction",
            "must be in (0, 1]",
        ));
    }
    if !(r.min_lot > 0.0) {
        return Err(invalid("risk", "min_lot", "must be positive"));
    }
    if !(r.max_lot >= r.min_lot) {
        return Err(invalid("risk", "max_lot", "must not be below min_lot"));
    }
    if !(r.lot_unit_size > 0.0) {
        return Err(invalid("risk", "lot_unit_size", "must be positive"));
    }
    Ok(())
}

fn validate_market(m: &MarketConfig) -> Result<(), EngineError> {
    if m.symbols.is_empty() {
        return Err(invalid("market", "symbols", "at least one symbol is required"));
    }
    let mut seen = std::collections::HashSet::new();
    for symbol in &m.symbols {
        if !seen.insert(symbol.to_uppercase()) {
            return Err(invalid("market", "symbols", "duplicate symbol"));
        }
    }
    if m.timeframe_minutes == 0 {
        return Err(invalid("market", "timeframe", "must be at least 1 minute"));
    }
    Ok(())
}

fn validate_lookback(lookback: usize, periods: &IndicatorPeriods) -> Result<(), EngineError> {
    let required = periods.required_bars();
    if lookback != 0 && lookback < required {
        return Err(invalid(
            "market",
            "lookback_bars",
            &format!("must be 0 or at least {required} bars"),
        ));
    }
    Ok(())
}
