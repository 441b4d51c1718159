//! OHLCV bar representation.

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OhlcvBar {
    pub code: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    /// All four prices are finite numbers.
    pub fn has_prices(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
    }

    /// Simple return from `prev` to this bar's close, `None` if undefined.
    pub fn return_since(&self, prev: &OhlcvBar) -> Option<f64> {
        if prev.close == 0.0 || !prev.close.is_finite() || !self.close.is_finite() {
            return None;
        }
        Some(self.close / prev.close - 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> OhlcvBar {
        OhlcvBar {
            code: "XLK".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000,
        }
    }

    #[test]
    fn true_range_hl_dominates() {
        let bar = sample_bar();
        assert!((bar.true_range(100.0) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bar = sample_bar();
        // |110-70| = 40
        assert!((bar.true_range(70.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_down() {
        let bar = sample_bar();
        // |90-130| = 40
        assert!((bar.true_range(130.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn has_prices_rejects_nan() {
        let mut bar = sample_bar();
        assert!(bar.has_prices());
        bar.low = f64::NAN;
        assert!(!bar.has_prices());
    }

    #[test]
    fn return_since_zero_base_is_undefined() {
        let bar = sample_bar();
        let prev = OhlcvBar {
            close: 0.0,
            ..sample_bar()
        };
        assert_eq!(bar.return_since(&prev), None);

        let prev = OhlcvBar {
            close: 100.0,
            ..sample_bar()
        };
        assert!((bar.return_since(&prev).unwrap() - 0.05).abs() < 1e-12);
    }
}
