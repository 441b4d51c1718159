//! CSV file data adapter.
//!
//! One file per instrument, `<base>/<CODE>.csv`, with a header row naming the
//! columns. Column order is free and header matching ignores case.

use crate::domain::error::InertiaError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord, path: &str) -> Result<Self, InertiaError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| InertiaError::DataSource {
                reason: format!("{}: missing {} column", path, name),
            })
        };

        Ok(Columns {
            date: require("date")?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: find("volume"),
        })
    }
}

/// Empty and `null` cells are missing values.
fn parse_price(cell: Option<&str>, column: &str) -> Result<f64, InertiaError> {
    let cell = cell.map(str::trim).unwrap_or("");
    if cell.is_empty() || cell.eq_ignore_ascii_case("null") || cell.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    cell.parse().map_err(|e| InertiaError::DataSource {
        reason: format!("invalid {} value {:?}: {}", column, cell, e),
    })
}

fn parse_date(cell: Option<&str>) -> Result<NaiveDate, InertiaError> {
    let cell = cell.map(str::trim).unwrap_or("");
    // accept "YYYY-MM-DD" with or without a trailing time part
    let day = cell.get(..10).unwrap_or(cell);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| InertiaError::DataSource {
        reason: format!("invalid date {:?}: {}", cell, e),
    })
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", code))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_daily(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, InertiaError> {
        let path = self.csv_path(code);
        let path_str = path.display().to_string();
        let content = fs::read_to_string(&path).map_err(|e| InertiaError::DataSource {
            reason: format!("failed to read {}: {}", path_str, e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| InertiaError::DataSource {
            reason: format!("{}: CSV header error: {}", path_str, e),
        })?;
        let cols = Columns::from_headers(headers, &path_str)?;

        // keyed by date so a repeated date keeps the last row
        let mut by_date: BTreeMap<NaiveDate, OhlcvBar> = BTreeMap::new();

        for result in rdr.records() {
            let record = result.map_err(|e| InertiaError::DataSource {
                reason: format!("{}: CSV parse error: {}", path_str, e),
            })?;

            let date = parse_date(record.get(cols.date))?;
            if date < start_date || date > end_date {
                continue;
            }

            let volume = match cols.volume {
                Some(i) => parse_price(record.get(i), "volume")?,
                None => 0.0,
            };

            by_date.insert(
                date,
                OhlcvBar {
                    code: code.to_string(),
                    date,
                    open: parse_price(record.get(cols.open), "open")?,
                    high: parse_price(record.get(cols.high), "high")?,
                    low: parse_price(record.get(cols.low), "low")?,
                    close: parse_price(record.get(cols.close), "close")?,
                    volume: if volume.is_finite() { volume as i64 } else { 0 },
                },
            );
        }

        Ok(by_date.into_values().collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, InertiaError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| InertiaError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| InertiaError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(code) = name_str.strip_suffix(".csv") {
                symbols.push(code.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
