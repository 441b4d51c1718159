//! Per-instrument monthly price series and the common simulation calendar.

use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

/// Monthly bars for one instrument: strictly increasing unique dates.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub code: String,
    pub bars: Vec<OhlcvBar>,
    pub date_index: HashMap<NaiveDate, usize>,
}

impl PriceSeries {
    pub fn new(code: String, bars: Vec<OhlcvBar>) -> Self {
        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
        Self {
            code,
            bars,
            date_index,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get_bar(&self, date: NaiveDate) -> Option<&OhlcvBar> {
        self.date_index.get(&date).map(|&i| &self.bars[i])
    }

    pub fn get_bar_index(&self, date: NaiveDate) -> Option<usize> {
        self.date_index.get(&date).copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Realized close-to-close return over `(from, to]`, `None` when either
    /// bar is missing or the base close is unusable.
    pub fn realized_return(&self, from: NaiveDate, to: NaiveDate) -> Option<f64> {
        let start = self.get_bar(from)?;
        let end = self.get_bar(to)?;
        end.return_since(start)
    }

    /// Copy of the series keeping only bars dated on or before `date`.
    pub fn truncated(&self, date: NaiveDate) -> PriceSeries {
        let bars = self
            .bars
            .iter()
            .take_while(|b| b.date <= date)
            .cloned()
            .collect();
        PriceSeries::new(self.code.clone(), bars)
    }
}

/// Dates present in every series, ascending.
pub fn build_common_timeline(series: &[&PriceSeries]) -> Vec<NaiveDate> {
    let Some((first, rest)) = series.split_first() else {
        return Vec::new();
    };
    let mut common: BTreeSet<NaiveDate> = first.bars.iter().map(|b| b.date).collect();
    for s in rest {
        common.retain(|d| s.date_index.contains_key(d));
    }
    common.into_iter().collect()
}
