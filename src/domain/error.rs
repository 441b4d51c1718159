//! Domain error types.
//!
//! Two layers: [`Exclusion`] tags why one instrument has no usable score at one
//! date and never aborts a run; [`InertiaError`] is the top-level error that
//! surfaces to the CLI.

use chrono::NaiveDate;
use serde::Serialize;

/// Why an indicator value could not be defined at a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum UndefinedReason {
    #[error("close {lookback} bars back is zero")]
    ZeroBaseClose { lookback: usize },

    #[error("SMA is zero")]
    ZeroSma,

    #[error("volatility term is zero")]
    ZeroDenominator,

    #[error("gap in lookback window")]
    GapInLookback,

    #[error("non-finite input or result")]
    NonFinite,
}

/// Per (instrument, date) failure. Folded by the ranking engine, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum Exclusion {
    #[error("no data")]
    NoData,

    #[error("insufficient history: have {bars} bars, need {required}")]
    InsufficientHistory { bars: usize, required: usize },

    #[error("undefined indicator: {0}")]
    UndefinedIndicator(UndefinedReason),

    #[error("stale data: last bar {last}")]
    Stale { last: NaiveDate },
}

/// Top-level error type for inertia.
#[derive(Debug, thiserror::Error)]
pub enum InertiaError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no data for {code}")]
    NoData { code: String },

    #[error("insufficient history for {code}: have {bars} monthly bars, need {minimum}")]
    InsufficientHistory {
        code: String,
        bars: usize,
        minimum: usize,
    },

    #[error("insufficient candidates: {eligible} eligible, top {required} requested")]
    InsufficientCandidates { eligible: usize, required: usize },

    #[error("benchmark {code} is unavailable")]
    BenchmarkUnavailable { code: String },

    #[error("no monthly dates common to all instruments and the benchmark")]
    NoCommonDates,

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl InertiaError {
    /// Attach an instrument code to a per-instrument exclusion.
    pub fn from_exclusion(code: &str, exclusion: &Exclusion) -> Self {
        match exclusion {
            Exclusion::NoData | Exclusion::UndefinedIndicator(_) | Exclusion::Stale { .. } => {
                InertiaError::NoData {
                    code: code.to_string(),
                }
            }
            Exclusion::InsufficientHistory { bars, required } => {
                InertiaError::InsufficientHistory {
                    code: code.to_string(),
                    bars: *bars,
                    minimum: *required,
                }
            }
        }
    }
}

impl From<&InertiaError> for std::process::ExitCode {
    fn from(err: &InertiaError) -> Self {
        let code: u8 = match err {
            InertiaError::Io(_) | InertiaError::Json(_) | InertiaError::Csv(_) => 1,
            InertiaError::ConfigParse { .. }
            | InertiaError::ConfigMissing { .. }
            | InertiaError::ConfigInvalid { .. } => 2,
            InertiaError::DataSource { .. } => 3,
            InertiaError::NoData { .. } | InertiaError::InsufficientHistory { .. } => 5,
            InertiaError::InsufficientCandidates { .. }
            | InertiaError::BenchmarkUnavailable { .. }
            | InertiaError::NoCommonDates => 6,
        };
        std::process::ExitCode::from(code)
    }
}
