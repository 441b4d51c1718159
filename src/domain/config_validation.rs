//! Configuration validation.
//!
//! Validates all config fields before a ranking or backtest runs.

use crate::domain::error::InertiaError;
use crate::domain::universe::{parse_codes, UniverseError};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Everything a live ranking needs: universe, indicator, top_k, data path.
pub fn validate_ranking_config(config: &dyn ConfigPort) -> Result<(), InertiaError> {
    let count = validate_universe(config)?;
    validate_indicator(config)?;
    validate_top_k(config, count)?;
    validate_data(config)?;
    Ok(())
}

/// Ranking requirements plus the backtest date range.
pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), InertiaError> {
    validate_ranking_config(config)?;
    validate_dates(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> InertiaError {
    InertiaError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn missing(section: &str, key: &str) -> InertiaError {
    InertiaError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

/// Returns the number of codes in the universe.
fn validate_universe(config: &dyn ConfigPort) -> Result<usize, InertiaError> {
    let codes = match config.get_string("universe", "codes") {
        Some(s) if !s.trim().is_empty() => s,
        _ => return Err(missing("universe", "codes")),
    };
    let parsed = parse_codes(&codes).map_err(|e| match e {
        UniverseError::EmptyToken => invalid("universe", "codes", "empty code in list"),
        UniverseError::DuplicateCode(code) => {
            invalid("universe", "codes", format!("duplicate code {}", code))
        }
    })?;

    if !config.has_key("universe", "benchmark") {
        return Err(missing("universe", "benchmark"));
    }
    Ok(parsed.len())
}

fn validate_period(config: &dyn ConfigPort, key: &str, default: i64) -> Result<(), InertiaError> {
    let value = config.get_int("indicator", key, default);
    if value < 1 {
        return Err(invalid("indicator", key, format!("{} must be at least 1", key)));
    }
    Ok(())
}

fn validate_indicator(config: &dyn ConfigPort) -> Result<(), InertiaError> {
    validate_period(config, "fast", 8)?;
    validate_period(config, "slow", 10)?;
    validate_period(config, "period", 14)?;

    for (key, default) in [("weight_fast", 0.4), ("weight_slow", 0.2)] {
        if !config.get_double("indicator", key, default).is_finite() {
            return Err(invalid("indicator", key, format!("{} must be finite", key)));
        }
    }

    let w3 = config.get_double("indicator", "weight_volatility", 0.4);
    if !w3.is_finite() || w3 == 0.0 {
        return Err(invalid(
            "indicator",
            "weight_volatility",
            "weight_volatility must be finite and non-zero",
        ));
    }
    Ok(())
}

fn validate_top_k(config: &dyn ConfigPort, universe_size: usize) -> Result<(), InertiaError> {
    let value = config.get_int("backtest", "top_k", 2);
    if value < 1 {
        return Err(invalid("backtest", "top_k", "top_k must be at least 1"));
    }
    if value as usize > universe_size {
        return Err(invalid(
            "backtest",
            "top_k",
            format!("top_k {} exceeds universe size {}", value, universe_size),
        ));
    }
    Ok(())
}

fn validate_data(config: &dyn ConfigPort) -> Result<(), InertiaError> {
    if !config.has_key("data", "path") {
        return Err(missing("data", "path"));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), InertiaError> {
    let start_date = required_date(config, "backtest", "start_date")?;

    if let Some(end_date) = optional_date(config, "backtest", "end_date")?
        && start_date >= end_date
    {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }

    if let Some(history_start) = optional_date(config, "backtest", "history_start")?
        && history_start > start_date
    {
        return Err(invalid(
            "backtest",
            "history_start",
            "history_start must not be after start_date",
        ));
    }
    Ok(())
}

pub fn parse_date(value: &str, section: &str, key: &str) -> Result<NaiveDate, InertiaError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        invalid(
            section,
            key,
            format!("invalid {} format, expected YYYY-MM-DD", key),
        )
    })
}

pub fn required_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<NaiveDate, InertiaError> {
    optional_date(config, section, key)?.ok_or_else(|| missing(section, key))
}

/// A blank value counts as absent.
pub fn optional_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, InertiaError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => parse_date(&s, section, key).map(Some),
        _ => Ok(None),
    }
}
