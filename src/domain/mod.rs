//! Core domain types and logic.

pub mod ohlcv;
pub mod series;
pub mod resample;
pub mod indicator;
pub mod inertia;
pub mod ranking;
pub mod portfolio;
pub mod metrics;
pub mod backtest;
pub mod universe;
pub mod config_validation;
pub mod error;
