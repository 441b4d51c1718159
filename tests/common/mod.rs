#![allow(dead_code)]

use chrono::{Months, NaiveDate};
use inertia::domain::backtest::BacktestConfig;
use inertia::domain::error::InertiaError;
use inertia::domain::inertia::InertiaParams;
pub use inertia::domain::ohlcv::OhlcvBar;
use inertia::domain::resample::month_end;
use inertia::domain::series::PriceSeries;
use inertia::ports::data_port::DataPort;
use std::collections::HashMap;
use std::process::ExitCode;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_daily(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, InertiaError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(InertiaError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, InertiaError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// First month of every generated series.
pub fn series_start() -> NaiveDate {
    date(2018, 1, 1)
}

pub fn make_bar(code: &str, date: NaiveDate, close: f64) -> OhlcvBar {
    OhlcvBar {
        code: code.to_string(),
        date,
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume: 1000,
    }
}

/// Month-end bars from `series_start()`, one per close.
pub fn monthly_series(code: &str, closes: &[f64]) -> PriceSeries {
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_bar(code, month_end(series_start() + Months::new(i as u32)), close))
        .collect();
    PriceSeries::new(code.to_string(), bars)
}

/// Daily bars on the 1st, 15th and last day of each month; the last bar of a
/// month closes at `closes[i]`.
pub fn daily_bars(code: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    let mut bars = Vec::with_capacity(closes.len() * 3);
    let mut prev = closes.first().copied().unwrap_or(100.0);
    for (i, &close) in closes.iter().enumerate() {
        let first = series_start() + Months::new(i as u32);
        let mid = first + chrono::Duration::days(14);
        let mid_close = (prev + close) / 2.0;
        bars.push(make_bar(code, first, prev));
        bars.push(make_bar(code, mid, mid_close));
        bars.push(make_bar(code, month_end(first), close));
        prev = close;
    }
    bars
}

pub fn rising(n: usize, step: f64) -> Vec<f64> {
    (0..n).map(|i| 100.0 * (1.0 + step).powi(i as i32)).collect()
}

pub fn flat(n: usize, level: f64) -> Vec<f64> {
    vec![level; n]
}

/// Month-end date `i` months after `series_start()`.
pub fn month(i: u32) -> NaiveDate {
    month_end(series_start() + Months::new(i))
}

pub fn backtest_config(codes: &[&str], top_k: usize) -> BacktestConfig {
    BacktestConfig {
        universe: codes.iter().map(|c| c.to_string()).collect(),
        benchmark: "SPY".to_string(),
        params: InertiaParams::default(),
        top_k,
        start_date: series_start(),
        end_date: None,
    }
}

pub fn small_params() -> InertiaParams {
    InertiaParams {
        fast: 2,
        slow: 3,
        period: 3,
        ..InertiaParams::default()
    }
}

/// `ExitCode` has no `PartialEq`; compare through its debug form.
pub fn same_exit(a: ExitCode, b: ExitCode) -> bool {
    format!("{a:?}") == format!("{b:?}")
}
