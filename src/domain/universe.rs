//! Instrument universe: symbol list parsing and per-instrument loading.
//!
//! Each instrument is fetched and resampled independently. A failure removes
//! that instrument from the run and is logged; it never aborts the others.

use crate::domain::error::{Exclusion, InertiaError};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::resample::resample_monthly;
use crate::domain::series::PriceSeries;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Universe {
    /// Ranking order; earlier codes win ties.
    pub codes: Vec<String>,
    pub benchmark: String,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.codes.len()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

/// Fetch window and resampling policy shared by every instrument.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub history_start: NaiveDate,
    pub end_date: NaiveDate,
    pub include_open_period: bool,
    /// Calendar date that decides which month is still open.
    pub as_of: NaiveDate,
    pub atr_period: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedCode {
    pub code: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SkipReason {
    DataSource(String),
    Excluded(Exclusion),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::DataSource(reason) => write!(f, "{}", reason),
            SkipReason::Excluded(e) => write!(f, "{}", e),
        }
    }
}

pub struct LoadedUniverse {
    /// Successfully loaded instruments, in universe order.
    pub instruments: Vec<PriceSeries>,
    pub benchmark: Option<PriceSeries>,
    pub skipped: Vec<SkippedCode>,
}

impl LoadedUniverse {
    pub fn codes(&self) -> Vec<&str> {
        self.instruments.iter().map(|s| s.code.as_str()).collect()
    }
}

fn fetch(
    data_port: &dyn DataPort,
    code: &str,
    opts: &LoadOptions,
) -> Result<Vec<OhlcvBar>, SkipReason> {
    data_port
        .fetch_daily(code, opts.history_start, opts.end_date)
        .map_err(|e| SkipReason::DataSource(e.to_string()))
}

fn load_one(
    code: &str,
    daily: Result<Vec<OhlcvBar>, SkipReason>,
    opts: &LoadOptions,
) -> Result<PriceSeries, SkipReason> {
    let daily = daily?;
    resample_monthly(
        code,
        &daily,
        opts.include_open_period,
        opts.as_of,
        opts.atr_period,
    )
    .map_err(SkipReason::Excluded)
}

/// Fetch and resample every instrument and the benchmark.
///
/// Data is fetched sequentially through the port; resampling runs in
/// parallel. Output keeps universe order.
pub fn load_universe(
    data_port: &dyn DataPort,
    universe: &Universe,
    opts: &LoadOptions,
) -> LoadedUniverse {
    let fetched: Vec<(String, Result<Vec<OhlcvBar>, SkipReason>)> = universe
        .codes
        .iter()
        .map(|code| (code.clone(), fetch(data_port, code, opts)))
        .collect();

    let results: Vec<(String, Result<PriceSeries, SkipReason>)> = fetched
        .into_par_iter()
        .map(|(code, daily)| {
            let loaded = load_one(&code, daily, opts);
            (code, loaded)
        })
        .collect();

    let mut instruments = Vec::new();
    let mut skipped = Vec::new();
    for (code, result) in results {
        match result {
            Ok(series) => {
                info!(code = %code, bars = series.len(), "loaded monthly series");
                instruments.push(series);
            }
            Err(reason) => {
                warn!(code = %code, reason = %reason, "skipping instrument");
                skipped.push(SkippedCode { code, reason });
            }
        }
    }

    let benchmark = match instruments.iter().find(|s| s.code == universe.benchmark) {
        Some(series) => Some(series.clone()),
        None => {
            let daily = fetch(data_port, &universe.benchmark, opts);
            match load_one(&universe.benchmark, daily, opts) {
                Ok(series) => Some(series),
                Err(reason) => {
                    warn!(code = %universe.benchmark, reason = %reason, "benchmark unavailable");
                    None
                }
            }
        }
    };

    if !skipped.is_empty() {
        info!(
            loaded = instruments.len(),
            total = universe.count(),
            "universe partially loaded"
        );
    }

    LoadedUniverse {
        instruments,
        benchmark,
        skipped,
    }
}

/// Fail when nothing in the universe could be loaded.
///
/// The error carries the first per-instrument exclusion; data source failures
/// alone report `NoData` for the whole universe.
pub fn require_instruments(loaded: &LoadedUniverse) -> Result<(), InertiaError> {
    if !loaded.instruments.is_empty() {
        return Ok(());
    }
    let first = loaded.skipped.iter().find_map(|s| match &s.reason {
        SkipReason::Excluded(e) => Some(InertiaError::from_exclusion(&s.code, e)),
        SkipReason::DataSource(_) => None,
    });
    Err(first.unwrap_or_else(|| InertiaError::NoData {
        code: "all".to_string(),
    }))
}
