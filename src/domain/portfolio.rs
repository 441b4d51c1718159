//! Simulated holdings, trade log and NAV tracking.

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub portfolio_value: f64,
    pub benchmark_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeEvent {
    pub date: NaiveDate,
    pub entries: Vec<String>,
    pub exits: Vec<String>,
    pub holdings: Vec<String>,
}

/// Instruments currently held, in rank order at the last rebalance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Holdings {
    codes: Vec<String>,
}

impl Holdings {
    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.iter().any(|c| c == code)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Replace holdings with `target`, returning the trade if anything changed.
    pub fn rebalance(&mut self, date: NaiveDate, target: Vec<String>) -> Option<TradeEvent> {
        let entries: Vec<String> = target
            .iter()
            .filter(|c| !self.contains(c))
            .cloned()
            .collect();
        let exits: Vec<String> = self
            .codes
            .iter()
            .filter(|c| !target.contains(c))
            .cloned()
            .collect();
        self.codes = target;

        if entries.is_empty() && exits.is_empty() {
            return None;
        }
        Some(TradeEvent {
            date,
            entries,
            exits,
            holdings: self.codes.clone(),
        })
    }
}

/// Portfolio and benchmark NAV, both indexed to a common start value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavTracker {
    points: Vec<NavPoint>,
}

impl NavTracker {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn is_started(&self) -> bool {
        !self.points.is_empty()
    }

    pub fn start(&mut self, date: NaiveDate, value: f64) {
        self.points.push(NavPoint {
            date,
            portfolio_value: value,
            benchmark_value: value,
        });
    }

    /// Compound the last point forward to `date`. No-op before `start`.
    pub fn accrue(&mut self, date: NaiveDate, portfolio_return: f64, benchmark_return: f64) {
        let Some(last) = self.points.last().copied() else {
            return;
        };
        self.points.push(NavPoint {
            date,
            portfolio_value: last.portfolio_value * (1.0 + portfolio_return),
            benchmark_value: last.benchmark_value * (1.0 + benchmark_return),
        });
    }

    pub fn points(&self) -> &[NavPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<NavPoint> {
        self.points
    }
}

impl Default for NavTracker {
    fn default() -> Self {
        Self::new()
    }
}

pub fn portfolio_curve(points: &[NavPoint]) -> Vec<EquityPoint> {
    points
        .iter()
        .map(|p| EquityPoint {
            date: p.date,
            equity: p.portfolio_value,
        })
        .collect()
}

pub fn benchmark_curve(points: &[NavPoint]) -> Vec<EquityPoint> {
    points
        .iter()
        .map(|p| EquityPoint {
            date: p.date,
            equity: p.benchmark_value,
        })
        .collect()
}
