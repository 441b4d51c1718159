//! ATR (Average True Range) as a simple moving average of true range.
//!
//! TR[0] = H[0] - L[0]; TR[i] = max(H-L, |H-C[i-1]|, |L-C[i-1]|).
//! ATR(n)[i] = mean(TR[i-n+1..=i]). This is not Wilder smoothing.
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::sma::rolling_mean;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn true_ranges(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect()
}

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let values = bars
        .iter()
        .zip(rolling_mean(&true_ranges(bars), period))
        .map(|(bar, value)| IndicatorPoint {
            date: bar.date,
            value,
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(day: u32, high: f64, low: f64, close: f64) -> OhlcvBar {
        OhlcvBar {
            code: "TEST".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn atr_warmup() {
        let bars: Vec<OhlcvBar> = (1..=5).map(|d| make_bar(d, 110.0, 90.0, 100.0)).collect();
        let series = calculate_atr(&bars, 3);
        assert_eq!(series.values.len(), 5);
        assert!(!series.values[1].is_valid());
        assert!(series.values[2].is_valid());
    }

    #[test]
    fn atr_is_simple_mean_of_true_range() {
        let bars = vec![
            make_bar(1, 110.0, 100.0, 105.0),
            make_bar(2, 130.0, 120.0, 125.0),
            make_bar(3, 120.0, 110.0, 115.0),
            make_bar(4, 125.0, 115.0, 120.0),
        ];
        // TR: 10, max(10, 25, 15) = 25, max(10, 5, 15) = 15, max(10, 10, 0) = 10
        assert_eq!(true_ranges(&bars), vec![10.0, 25.0, 15.0, 10.0]);

        let series = calculate_atr(&bars, 3);
        assert!((series.value_at(2).unwrap() - 50.0 / 3.0).abs() < 1e-12);
        assert!((series.value_at(3).unwrap() - 50.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn atr_short_input() {
        let bars = vec![make_bar(1, 110.0, 90.0, 100.0)];
        let series = calculate_atr(&bars, 5);
        assert_eq!(series.values.len(), 1);
        assert!(!series.values[0].is_valid());
    }
}
