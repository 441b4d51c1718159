//! CSV export of rankings, NAV series and trade log.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::InertiaError;
use crate::domain::ranking::RankingResult;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const NAV_FILE: &str = "nav.csv";
pub const TRADES_FILE: &str = "trades.csv";

#[derive(Debug, Default)]
pub struct CsvExport;

impl CsvExport {
    pub fn new() -> Self {
        Self
    }

    /// One row per trade; code lists are `;`-separated.
    pub fn write_trades(
        &self,
        result: &BacktestResult,
        out: &mut dyn Write,
    ) -> Result<(), InertiaError> {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(["date", "entries", "exits", "holdings"])?;
        for t in &result.trades {
            wtr.write_record([
                t.date.to_string(),
                t.entries.join(";"),
                t.exits.join(";"),
                t.holdings.join(";"),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write `nav.csv` and `trades.csv` under `dir`, creating it if needed.
    pub fn export_dir(
        &self,
        result: &BacktestResult,
        dir: &Path,
    ) -> Result<(PathBuf, PathBuf), InertiaError> {
        fs::create_dir_all(dir)?;

        let nav_path = dir.join(NAV_FILE);
        let mut nav_file = fs::File::create(&nav_path)?;
        self.write_backtest(result, &mut nav_file)?;

        let trades_path = dir.join(TRADES_FILE);
        let mut trades_file = fs::File::create(&trades_path)?;
        self.write_trades(result, &mut trades_file)?;

        Ok((nav_path, trades_path))
    }
}

impl ReportPort for CsvExport {
    fn write_ranking(
        &self,
        result: &RankingResult,
        out: &mut dyn Write,
    ) -> Result<(), InertiaError> {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record([
            "rank",
            "code",
            "score",
            "momentum",
            "volatility",
            "close",
            "eligible",
        ])?;
        for (i, row) in result.rankings.iter().enumerate() {
            let s = &row.snapshot;
            wtr.write_record([
                (i + 1).to_string(),
                row.code.clone(),
                format!("{:.4}", row.score),
                format!("{:.4}", s.momentum),
                format!("{:.4}", s.volatility_ratio * 100.0),
                format!("{:.2}", s.close),
                result.is_eligible(i).to_string(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// The NAV series, one row per valuation date.
    fn write_backtest(
        &self,
        result: &BacktestResult,
        out: &mut dyn Write,
    ) -> Result<(), InertiaError> {
        let mut wtr = csv::Writer::from_writer(out);
        for point in &result.nav {
            wtr.serialize(point)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fixtures::{sample_backtest_result, sample_ranking_result};
    use tempfile::TempDir;

    #[test]
    fn nav_has_header_and_one_row_per_point() {
        let mut buf = Vec::new();
        CsvExport::new()
            .write_backtest(&sample_backtest_result(), &mut buf)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,portfolio_value,benchmark_value");
        assert_eq!(lines[1], "2023-11-30,100.0,100.0");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn trades_join_codes() {
        let mut buf = Vec::new();
        CsvExport::new()
            .write_trades(&sample_backtest_result(), &mut buf)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,entries,exits,holdings");
        assert_eq!(lines[2], "2024-01-31,XLE,XLK,XLE");
    }

    #[test]
    fn ranking_rows_flag_eligibility() {
        let mut buf = Vec::new();
        CsvExport::new()
            .write_ranking(&sample_ranking_result(), &mut buf)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("1,XLK,550.0000,"));
        assert!(lines[2].ends_with(",true"));
        assert!(lines[3].ends_with(",false"));
    }

    #[test]
    fn export_dir_writes_both_files() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("run");
        let (nav, trades) = CsvExport::new()
            .export_dir(&sample_backtest_result(), &out)
            .unwrap();
        assert!(nav.exists());
        assert!(trades.exists());
        let nav_text = fs::read_to_string(nav).unwrap();
        assert!(nav_text.contains("2024-02-29,107.0,104.5"));
    }
}
