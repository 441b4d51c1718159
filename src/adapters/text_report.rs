//! Plain-text report adapter.
//!
//! Ranking output is one row per instrument with its score, momentum,
//! volatility and last price; the top-K rows are marked as the recommended
//! holdings. Backtest output is a portfolio/benchmark summary, calendar-year
//! returns and the trade log.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::InertiaError;
use crate::domain::metrics::Summary;
use crate::domain::portfolio::NavPoint;
use crate::domain::ranking::RankingResult;
use crate::ports::report_port::ReportPort;
use chrono::Datelike;
use std::collections::BTreeMap;
use std::io::Write;

#[derive(Debug, Default)]
pub struct TextReport;

impl TextReport {
    pub fn new() -> Self {
        Self
    }
}

pub struct YearlyReturn {
    pub year: i32,
    pub portfolio_pct: f64,
    pub benchmark_pct: f64,
}

/// Calendar-year returns from a NAV series. The first year is measured from
/// the first NAV point.
pub fn yearly_returns(nav: &[NavPoint]) -> Vec<YearlyReturn> {
    let Some(first) = nav.first() else {
        return Vec::new();
    };

    let mut year_end: BTreeMap<i32, &NavPoint> = BTreeMap::new();
    for point in nav {
        year_end.insert(point.date.year(), point);
    }

    let mut prev = first;
    let mut out = Vec::with_capacity(year_end.len());
    for (year, end) in year_end {
        out.push(YearlyReturn {
            year,
            portfolio_pct: pct_change(prev.portfolio_value, end.portfolio_value),
            benchmark_pct: pct_change(prev.benchmark_value, end.benchmark_value),
        });
        prev = end;
    }
    out
}

fn pct_change(from: f64, to: f64) -> f64 {
    if from > 0.0 {
        (to / from - 1.0) * 100.0
    } else {
        0.0
    }
}

fn write_summary_row(
    out: &mut dyn Write,
    label: &str,
    portfolio: f64,
    benchmark: f64,
    unit: &str,
) -> std::io::Result<()> {
    writeln!(
        out,
        "{:<18}{:>12.2}{unit:<2}{:>12.2}{unit}",
        label, portfolio, benchmark
    )
}

fn write_summaries(out: &mut dyn Write, p: &Summary, b: &Summary) -> std::io::Result<()> {
    writeln!(out, "{:<18}{:>14}{:>13}", "", "Portfolio", "Benchmark")?;
    write_summary_row(out, "Total Return:", p.total_return, b.total_return, "%")?;
    write_summary_row(out, "CAGR:", p.cagr, b.cagr, "%")?;
    write_summary_row(out, "Max Drawdown:", p.max_drawdown, b.max_drawdown, "%")?;
    write_summary_row(out, "Sharpe Ratio:", p.sharpe, b.sharpe, "")?;
    write_summary_row(out, "Final Value:", p.final_value, b.final_value, "")?;
    writeln!(
        out,
        "{:<18}{:>12}  {:>12}",
        "DD Duration (mo):", p.max_drawdown_duration, b.max_drawdown_duration
    )
}

impl ReportPort for TextReport {
    fn write_ranking(
        &self,
        result: &RankingResult,
        out: &mut dyn Write,
    ) -> Result<(), InertiaError> {
        writeln!(out, "=== Monthly Inertia Ranking ({}) ===", result.date)?;
        writeln!(out)?;

        writeln!(
            out,
            "{:>4}  {:<8}{:>10}{:>12}{:>12}{:>12}",
            "#", "Code", "Score", "Momentum", "Volatility", "Price"
        )?;
        for (i, row) in result.rankings.iter().enumerate() {
            let marker = if result.is_eligible(i) { '*' } else { ' ' };
            let s = &row.snapshot;
            writeln!(
                out,
                "{marker}{:>3}  {:<8}{:>10.2}{:>11.2}%{:>11.2}%{:>12.2}",
                i + 1,
                row.code,
                row.score,
                s.momentum,
                s.volatility_ratio * 100.0,
                s.close
            )?;
        }

        if !result.excluded.is_empty() {
            writeln!(out)?;
            writeln!(out, "Excluded:")?;
            for ex in &result.excluded {
                writeln!(out, "  {}: {}", ex.code, ex.reason)?;
            }
        }

        writeln!(out)?;
        let top: Vec<&str> = result.eligible().iter().map(|r| r.code.as_str()).collect();
        writeln!(out, "Top {} recommended: {}", result.top_k, top.join(", "))?;
        if result.partial {
            writeln!(
                out,
                "warning: only {} of {} requested instruments ranked",
                result.rankings.len(),
                result.top_k
            )?;
        }
        Ok(())
    }

    fn write_backtest(
        &self,
        result: &BacktestResult,
        out: &mut dyn Write,
    ) -> Result<(), InertiaError> {
        writeln!(
            out,
            "=== Backtest Results ({} to {}) ===",
            result.start_date, result.end_date
        )?;
        writeln!(out)?;
        write_summaries(out, &result.portfolio, &result.benchmark)?;
        writeln!(out)?;
        writeln!(out, "Rebalanced months: {}", result.rebalanced_months)?;
        writeln!(out, "Skipped months:    {}", result.skipped_months.len())?;
        writeln!(out, "Trades:            {}", result.trades.len())?;

        let years = yearly_returns(&result.nav);
        if !years.is_empty() {
            writeln!(out)?;
            writeln!(out, "=== Calendar Year Returns ===")?;
            for y in &years {
                writeln!(
                    out,
                    "  {}  {:>9.2}%  {:>9.2}%",
                    y.year, y.portfolio_pct, y.benchmark_pct
                )?;
            }
        }

        if !result.trades.is_empty() {
            writeln!(out)?;
            writeln!(out, "=== Trade Log ===")?;
            for t in &result.trades {
                writeln!(
                    out,
                    "  {}  in: {:<16} out: {:<16} hold: {}",
                    t.date,
                    t.entries.join(","),
                    t.exits.join(","),
                    t.holdings.join(",")
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fixtures::{sample_backtest_result, sample_ranking_result};
    use chrono::NaiveDate;

    fn render_ranking(result: &RankingResult) -> String {
        let mut buf = Vec::new();
        TextReport::new().write_ranking(result, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn ranking_marks_top_k_rows() {
        let text = render_ranking(&sample_ranking_result());
        let lines: Vec<&str> = text.lines().collect();
        let xlk = lines.iter().find(|l| l.contains("XLK")).unwrap();
        let xle = lines.iter().find(|l| l.contains("XLE")).unwrap();
        let ief = lines.iter().find(|l| l.contains(" IEF ")).unwrap();
        assert!(xlk.starts_with('*'));
        assert!(xle.starts_with('*'));
        assert!(ief.starts_with(' '));
        assert!(text.contains("Top 2 recommended: XLK, XLE"));
    }

    #[test]
    fn ranking_lists_excluded_with_reason() {
        let text = render_ranking(&sample_ranking_result());
        assert!(text.contains("Excluded:"));
        assert!(text.contains("XLC: insufficient history"));
    }

    #[test]
    fn partial_ranking_warns() {
        let mut result = sample_ranking_result();
        result.top_k = 5;
        result.partial = true;
        let text = render_ranking(&result);
        assert!(text.contains("warning: only 3 of 5"));
    }

    #[test]
    fn backtest_includes_summary_and_trades() {
        let mut buf = Vec::new();
        TextReport::new()
            .write_backtest(&sample_backtest_result(), &mut buf)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("=== Backtest Results (2023-11-30 to 2024-02-29) ==="));
        assert!(text.contains("CAGR:"));
        assert!(text.contains("Sharpe Ratio:"));
        assert!(text.contains("=== Trade Log ==="));
        assert!(text.contains("2023-11-30  in: XLK"));
        assert!(text.contains("Rebalanced months: 3"));
    }

    #[test]
    fn yearly_returns_split_on_calendar_year() {
        let nav = vec![
            NavPoint {
                date: NaiveDate::from_ymd_opt(2023, 11, 30).unwrap(),
                portfolio_value: 100.0,
                benchmark_value: 100.0,
            },
            NavPoint {
                date: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
                portfolio_value: 110.0,
                benchmark_value: 105.0,
            },
            NavPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
                portfolio_value: 99.0,
                benchmark_value: 105.0,
            },
        ];
        let years = yearly_returns(&nav);
        assert_eq!(years.len(), 2);
        assert_eq!(years[0].year, 2023);
        assert!((years[0].portfolio_pct - 10.0).abs() < 1e-9);
        assert!((years[0].benchmark_pct - 5.0).abs() < 1e-9);
        assert!((years[1].portfolio_pct + 10.0).abs() < 1e-9);
        assert_eq!(years[1].benchmark_pct, 0.0);
    }

    #[test]
    fn yearly_returns_empty_nav() {
        assert!(yearly_returns(&[]).is_empty());
    }
}
