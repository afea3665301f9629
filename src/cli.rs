//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvDataSource;
use crate::adapters::csv_report::CsvTradeReport;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::paper_order_sink::PaperOrderSink;
use crate::domain::backtest::{BacktestResult, load_series, run_backtest};
use crate::domain::config::EngineConfig;
use crate::domain::engine::{CycleOutcome, CycleReport, Engine, trailing_window};
use crate::domain::error::EngineError;
use crate::domain::metrics::{EquityPoint, TradeStatistics};
use crate::domain::position::TradeRecord;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{BarRange, MarketDataSource};
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "edgetrader", about = "EMA/VWAP signal engine with ATR risk management")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay CSV history through the engine
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Comma-separated symbols, overriding [market] symbols
        #[arg(long)]
        symbol: Option<String>,
        /// Trade log CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Poll CSV files and paper trade on each new bar
    Paper {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Stop after this many cycles; runs until killed otherwise
        #[arg(long)]
        cycles: Option<u64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Evaluate the latest bar of one symbol and print the outcome
    Signal {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Load and validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data_dir,
            symbol,
            output,
        } => run_backtest_command(&config, data_dir, symbol.as_deref(), output.as_deref()),
        Command::Paper {
            config,
            data_dir,
            cycles,
            output,
        } => run_paper(&config, data_dir, cycles, output.as_deref()),
        Command::Signal {
            config,
            symbol,
            data_dir,
        } => run_signal(&config, &symbol, data_dir),
        Command::Validate { config } => run_validate(&config),
    }
}

/// `RUST_LOG` wins over the configured level. Safe to call more than once.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn fail(err: &EngineError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        fail(&EngineError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    })
}

/// Loads, applies command-line overrides, and re-validates.
pub fn build_engine_config(
    adapter: &dyn ConfigPort,
    data_dir: Option<PathBuf>,
    symbols: Option<&str>,
) -> Result<EngineConfig, EngineError> {
    let mut config = EngineConfig::from_port(adapter)?;
    if let Some(dir) = data_dir {
        config.market.data_dir = dir;
    }
    if let Some(raw) = symbols {
        config.market.symbols = parse_symbols(raw);
    }
    config.validate()?;
    Ok(config)
}

pub fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn prepare(
    config_path: &Path,
    data_dir: Option<PathBuf>,
    symbols: Option<&str>,
) -> Result<EngineConfig, ExitCode> {
    let adapter = load_config(config_path)?;
    let config = build_engine_config(&adapter, data_dir, symbols).map_err(|e| fail(&e))?;
    init_logging(&config.log_level);
    Ok(config)
}

pub fn backtest_pipeline(
    source: &dyn MarketDataSource,
    config: EngineConfig,
) -> Result<BacktestResult, EngineError> {
    let series = load_series(
        source,
        &config.market.symbols,
        config.market.timeframe_minutes,
        BarRange::all(),
    )?;
    let mut engine = Engine::new(config);
    run_backtest(&mut engine, &series)
}

fn run_backtest_command(
    config_path: &Path,
    data_dir: Option<PathBuf>,
    symbols: Option<&str>,
    output: Option<&Path>,
) -> ExitCode {
    let config = match prepare(config_path, data_dir, symbols) {
        Ok(c) => c,
        Err(code) => return code,
    };
    info!(
        symbols = ?config.market.symbols,
        data_dir = %config.market.data_dir.display(),
        "loading history"
    );

    let source = CsvDataSource::new(config.market.data_dir.clone());
    let result = match backtest_pipeline(&source, config) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    print_statistics(&result.statistics);
    println!("Signals:            {}", result.signals);
    println!("Refused entries:    {}", result.refusals);
    println!("Open at end:        {}", result.open_at_end);

    write_trades(&result.trades, output)
}

fn write_trades(trades: &[TradeRecord], output: Option<&Path>) -> ExitCode {
    let Some(path) = output else {
        return ExitCode::SUCCESS;
    };
    match CsvTradeReport.write_trades(trades, &path.to_string_lossy()) {
        Ok(()) => {
            eprintln!("Trade log written to {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

pub fn print_statistics(stats: &TradeStatistics) {
    println!("Initial capital:    {:.2}", stats.initial_capital);
    println!("Final capital:      {:.2}", stats.final_capital);
    println!("Total return:       {:.2}%", stats.total_return);
    println!("Total trades:       {}", stats.total_trades);
    println!("Winning trades:     {}", stats.winning_trades);
    println!("Losing trades:      {}", stats.losing_trades);
    println!("Win rate:           {:.2}%", stats.win_rate);
    println!("Average P&L:        {:.2}", stats.average_profit);
    println!("Best trade:         {:.2}", stats.max_profit);
    println!("Worst trade:        {:.2}", stats.max_loss);
    println!("Max drawdown:       {:.2}%", stats.max_drawdown * 100.0);
}

fn describe(report: &CycleReport) -> String {
    match &report.outcome {
        CycleOutcome::Stale => "no new bar".to_string(),
        CycleOutcome::NoSignal => "no signal".to_string(),
        CycleOutcome::Opened(intent) => format!(
            "{} {:.2} lots @ {:.5} (SL {:.5}, TP {:.5})",
            intent.direction, intent.size, intent.entry_price, intent.stop_loss, intent.take_profit
        ),
        CycleOutcome::Refused(refusal) => format!("refused: {refusal}"),
    }
}

/// Stale polls evaluated nothing and add no point to the curve.
pub fn equity_point(report: &CycleReport, capital: f64) -> Option<EquityPoint> {
    if matches!(report.outcome, CycleOutcome::Stale) {
        return None;
    }
    Some(EquityPoint {
        timestamp: report.timestamp,
        equity: capital,
    })
}

fn run_paper(
    config_path: &Path,
    data_dir: Option<PathBuf>,
    cycles: Option<u64>,
    output: Option<&Path>,
) -> ExitCode {
    let config = match prepare(config_path, data_dir, None) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let poll = Duration::from_secs(config.poll_interval_secs);
    let source = CsvDataSource::new(config.market.data_dir.clone());
    let mut engine = Engine::new(config);
    let mut sink = PaperOrderSink::new();
    let mut equity_curve = Vec::new();

    info!(poll_secs = poll.as_secs(), "paper trading started");
    let mut cycle = 0u64;
    loop {
        cycle += 1;
        let summary = engine.run_cycle(&source, Some(&mut sink), BarRange::all());
        for report in &summary.reports {
            for trade in &report.closed {
                println!(
                    "{} closed {} {} pnl {:.2}",
                    report.timestamp, trade.symbol, trade.status, trade.pnl
                );
            }
            if let Some(point) = equity_point(report, engine.governor().capital()) {
                println!("{} {} {}", report.timestamp, report.symbol, describe(report));
                equity_curve.push(point);
            }
        }
        for (symbol, err) in &summary.errors {
            warn!(symbol = %symbol, error = %err, "cycle error");
        }

        if cycles.is_some_and(|max| cycle >= max) {
            break;
        }
        std::thread::sleep(poll);
    }

    info!(cycles = cycle, orders = sink.submitted().len(), "paper trading stopped");
    print_statistics(&engine.statistics(&equity_curve));
    write_trades(engine.ledger().trades(), output)
}

fn run_signal(config_path: &Path, symbol: &str, data_dir: Option<PathBuf>) -> ExitCode {
    let config = match prepare(config_path, data_dir, Some(symbol)) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let source = CsvDataSource::new(config.market.data_dir.clone());
    let symbol = symbol.trim().to_uppercase();
    let bars = match source.get_bars(&symbol, config.market.timeframe_minutes, BarRange::all()) {
        Ok(b) => b,
        Err(e) => return fail(&e),
    };

    let lookback = config.market.lookback_bars;
    let mut engine = Engine::new(config);
    match engine.evaluate(&symbol, trailing_window(&bars, lookback)) {
        Ok(report) => {
            println!("{} {} {}", report.timestamp, report.symbol, describe(&report));
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    match build_engine_config(&adapter, None, None) {
        Ok(config) => {
            println!("Configuration OK");
            println!("  symbols:   {}", config.market.symbols.join(","));
            println!("  timeframe: {}m", config.market.timeframe_minutes);
            println!(
                "  EMA {}/{}  ATR {}  SL {}xATR  TP {}xATR",
                config.periods.ema_fast,
                config.periods.ema_slow,
                config.periods.atr,
                config.stops.atr_sl_multiplier,
                config.stops.atr_tp_multiplier
            );
            println!(
                "  risk {:.2}% of {:.2}, max {} open, halt below {:.0}% of peak",
                config.risk.risk_fraction * 100.0,
                config.risk.initial_capital,
                config.risk.max_open_positions,
                (1.0 - config.risk.max_drawdown_fraction) * 100.0
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}
