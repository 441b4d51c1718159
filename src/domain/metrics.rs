//! Performance metrics for a monthly value series.

use super::portfolio::EquityPoint;
use serde::Serialize;

const DAYS_PER_YEAR: f64 = 365.25;
const PERIODS_PER_YEAR: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    /// Compound annual growth rate, percent.
    pub cagr: f64,
    /// Worst peak-to-trough decline, percent (zero or negative).
    pub max_drawdown: f64,
    /// Longest run of periods spent below a prior peak.
    pub max_drawdown_duration: usize,
    /// Annualized mean / stdev of period returns.
    pub sharpe: f64,
    /// Total return over the series, percent.
    pub total_return: f64,
    pub final_value: f64,
}

impl Summary {
    pub fn compute(curve: &[EquityPoint]) -> Self {
        let (Some(first), Some(last)) = (curve.first(), curve.last()) else {
            return Summary {
                cagr: 0.0,
                max_drawdown: 0.0,
                max_drawdown_duration: 0,
                sharpe: 0.0,
                total_return: 0.0,
                final_value: 0.0,
            };
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(curve);

        Summary {
            cagr: compute_cagr(first, last),
            max_drawdown,
            max_drawdown_duration,
            sharpe: compute_sharpe(curve),
            total_return: if first.equity > 0.0 {
                (last.equity / first.equity - 1.0) * 100.0
            } else {
                0.0
            },
            final_value: last.equity,
        }
    }
}

/// Summarize one value series.
pub fn summarize(curve: &[EquityPoint]) -> Summary {
    Summary::compute(curve)
}

fn compute_cagr(first: &EquityPoint, last: &EquityPoint) -> f64 {
    let years = (last.date - first.date).num_days() as f64 / DAYS_PER_YEAR;
    if years <= 0.0 || first.equity <= 0.0 || last.equity < 0.0 {
        return 0.0;
    }
    let cagr = ((last.equity / first.equity).powf(1.0 / years) - 1.0) * 100.0;
    if cagr.is_finite() { cagr } else { 0.0 }
}

fn compute_drawdown(curve: &[EquityPoint]) -> (f64, usize) {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    let mut run = 0usize;
    let mut longest = 0usize;

    for point in curve {
        if point.equity >= peak {
            peak = point.equity;
            run = 0;
            continue;
        }
        if peak > 0.0 {
            worst = worst.min((point.equity - peak) / peak);
        }
        run += 1;
        longest = longest.max(run);
    }

    (worst * 100.0, longest)
}

fn period_returns(curve: &[EquityPoint]) -> Vec<f64> {
    curve
        .windows(2)
        .filter(|w| w[0].equity != 0.0)
        .map(|w| w[1].equity / w[0].equity - 1.0)
        .collect()
}

fn compute_sharpe(curve: &[EquityPoint]) -> f64 {
    let returns = period_returns(curve);
    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    // Constant returns leave rounding noise in the stdev; treat it as zero.
    if stddev.is_finite() && stddev > 1e-12 * mean.abs().max(1.0) {
        mean / stddev * PERIODS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Months, NaiveDate};

    fn monthly_curve(values: &[f64]) -> Vec<EquityPoint> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 31).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| EquityPoint {
                date: crate::domain::resample::month_end(start + Months::new(i as u32)),
                equity: v,
            })
            .collect()
    }

    #[test]
    fn empty_curve_is_all_zero() {
        let s = summarize(&[]);
        assert_eq!(s.cagr, 0.0);
        assert_eq!(s.sharpe, 0.0);
        assert_eq!(s.final_value, 0.0);
    }

    #[test]
    fn single_point_has_no_growth() {
        let s = summarize(&monthly_curve(&[100.0]));
        assert_eq!(s.cagr, 0.0);
        assert_eq!(s.max_drawdown, 0.0);
        assert_eq!(s.sharpe, 0.0);
        assert_eq!(s.final_value, 100.0);
    }

    #[test]
    fn cagr_constant_monthly_return() {
        let r: f64 = 0.01;
        let values: Vec<f64> = (0..=12).map(|i| 100.0 * (1.0 + r).powi(i)).collect();
        let s = summarize(&monthly_curve(&values));
        let expected = ((1.0 + r).powi(12) - 1.0) * 100.0;
        assert!((s.cagr - expected).abs() < 0.1, "cagr {} vs {}", s.cagr, expected);
        assert_relative_eq!(s.total_return, expected, epsilon = 1e-9);
    }

    #[test]
    fn max_drawdown_is_negative_percent() {
        let s = summarize(&monthly_curve(&[100.0, 110.0, 90.0, 95.0, 80.0, 100.0]));
        assert_relative_eq!(s.max_drawdown, (80.0 - 110.0) / 110.0 * 100.0, epsilon = 1e-9);
        assert_eq!(s.max_drawdown_duration, 4);
    }

    #[test]
    fn rising_curve_has_no_drawdown() {
        let s = summarize(&monthly_curve(&[100.0, 101.0, 102.0]));
        assert_eq!(s.max_drawdown, 0.0);
        assert_eq!(s.max_drawdown_duration, 0);
    }

    #[test]
    fn constant_returns_have_zero_sharpe() {
        let values: Vec<f64> = (0..=12).map(|i| 100.0 * 1.01_f64.powi(i)).collect();
        let s = summarize(&monthly_curve(&values));
        assert_eq!(s.sharpe, 0.0);

        let values: Vec<f64> = (0..=24).map(|i| 100.0 * 1.02_f64.powi(i)).collect();
        assert_eq!(summarize(&monthly_curve(&values)).sharpe, 0.0);
    }

    #[test]
    fn sharpe_matches_hand_calculation() {
        let values = [100.0, 110.0, 99.0, 108.9];
        let s = summarize(&monthly_curve(&values));
        let returns: [f64; 3] = [0.10, -0.10, 0.10];
        let mean: f64 = returns.iter().sum::<f64>() / 3.0;
        let var: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / 2.0;
        let expected = mean / var.sqrt() * 12.0_f64.sqrt();
        assert_relative_eq!(s.sharpe, expected, epsilon = 1e-9);
    }

    #[test]
    fn flat_curve_sharpe_is_zero() {
        let s = summarize(&monthly_curve(&[100.0, 100.0, 100.0, 100.0]));
        assert_eq!(s.sharpe, 0.0);
        assert_eq!(s.cagr, 0.0);
    }
}
