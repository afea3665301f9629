//! Core domain types and logic.

pub mod ohlcv;
pub mod instrument;
pub mod indicator;
pub mod signal;
pub mod risk;
pub mod position;
pub mod ledger;
pub mod order;
pub mod engine;
pub mod backtest;
pub mod metrics;
pub mod config;
pub mod error;
