//! Daily → monthly resampling.
//!
//! open = first, high = max, low = min, close = last, volume = sum. Monthly
//! bars are dated on the last calendar day of their month so that series from
//! different instruments line up on the same calendar.

use crate::domain::error::Exclusion;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::series::PriceSeries;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Last calendar day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(date)
}

/// Whole calendar months from `from` to `to` (negative if `to` is earlier).
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32
}

#[derive(Default)]
struct MonthAccumulator {
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: i64,
}

impl MonthAccumulator {
    fn push(&mut self, bar: &OhlcvBar) {
        if bar.open.is_finite() && self.open.is_none() {
            self.open = Some(bar.open);
        }
        if bar.high.is_finite() {
            self.high = Some(self.high.map_or(bar.high, |h| h.max(bar.high)));
        }
        if bar.low.is_finite() {
            self.low = Some(self.low.map_or(bar.low, |l| l.min(bar.low)));
        }
        if bar.close.is_finite() {
            self.close = Some(bar.close);
        }
        self.volume = self.volume.saturating_add(bar.volume);
    }

    fn finish(self, code: &str, date: NaiveDate) -> Option<OhlcvBar> {
        Some(OhlcvBar {
            code: code.to_string(),
            date,
            open: self.open?,
            high: self.high?,
            low: self.low?,
            close: self.close?,
            volume: self.volume,
        })
    }
}

/// Resample a chronologically ordered daily series into monthly bars.
///
/// When `include_open_period` is false, a final bar belonging to the month of
/// `as_of` is dropped because that month has not closed yet. Fails with
/// `NoData` on empty input and `InsufficientHistory` when fewer than
/// `atr_period + 1` monthly bars remain.
pub fn resample_monthly(
    code: &str,
    daily: &[OhlcvBar],
    include_open_period: bool,
    as_of: NaiveDate,
    atr_period: usize,
) -> Result<PriceSeries, Exclusion> {
    if daily.is_empty() {
        return Err(Exclusion::NoData);
    }

    let mut months: BTreeMap<NaiveDate, MonthAccumulator> = BTreeMap::new();
    for bar in daily {
        months.entry(month_end(bar.date)).or_default().push(bar);
    }

    let mut bars: Vec<OhlcvBar> = months
        .into_iter()
        .filter_map(|(date, acc)| acc.finish(code, date))
        .collect();

    if !include_open_period
        && bars
            .last()
            .is_some_and(|b| b.date == month_end(as_of))
    {
        bars.pop();
    }

    let required = atr_period + 1;
    if bars.len() < required {
        return Err(Exclusion::InsufficientHistory {
            bars: bars.len(),
            required,
        });
    }

    Ok(PriceSeries::new(code.to_string(), bars))
}
