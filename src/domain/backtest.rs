//! Monthly rotation backtest.
//!
//! The simulator walks the monthly dates shared by every loaded instrument and
//! the benchmark. At each decision date it ranks, rotates into the top-K
//! eligible instruments, then compounds NAV over the following month. Months
//! without enough eligible instruments are skipped outright.

use crate::domain::error::{Exclusion, InertiaError};
use crate::domain::inertia::{score_series, InertiaParams, ScoreResult};
use crate::domain::metrics::{summarize, Summary};
use crate::domain::portfolio::{
    benchmark_curve, portfolio_curve, Holdings, NavPoint, NavTracker, TradeEvent,
};
use crate::domain::ranking::{rank, InsufficientCandidates, RankMode, RankingSnapshot};
use crate::domain::series::{build_common_timeline, PriceSeries};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

pub const INITIAL_NAV: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestConfig {
    /// Ranking universe; order breaks ties.
    pub universe: Vec<String>,
    pub benchmark: String,
    pub params: InertiaParams,
    pub top_k: usize,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub nav: Vec<NavPoint>,
    pub trades: Vec<TradeEvent>,
    pub portfolio: Summary,
    pub benchmark: Summary,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rebalanced_months: usize,
    pub skipped_months: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    Ranking,
    Rebalancing,
    Accruing,
    Done,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MonthOutcome {
    Skipped {
        date: NaiveDate,
        eligible: usize,
    },
    Rebalanced {
        date: NaiveDate,
        ranking: RankingSnapshot,
        trade: Option<TradeEvent>,
        portfolio_return: f64,
        benchmark_return: f64,
    },
}

struct ScoredInstrument<'a> {
    series: &'a PriceSeries,
    scores: Vec<ScoreResult>,
}

impl ScoredInstrument<'_> {
    fn score_at(&self, date: NaiveDate) -> ScoreResult {
        self.series
            .get_bar_index(date)
            .and_then(|i| self.scores.get(i).cloned())
            .unwrap_or(Err(Exclusion::NoData))
    }

    fn has_lookback_at(&self, date: NaiveDate) -> bool {
        !matches!(
            self.score_at(date),
            Err(Exclusion::InsufficientHistory { .. } | Exclusion::NoData)
        )
    }
}

pub struct Simulator<'a> {
    config: &'a BacktestConfig,
    instruments: Vec<ScoredInstrument<'a>>,
    benchmark: &'a PriceSeries,
    timeline: Vec<NaiveDate>,
    cursor: usize,
    phase: Phase,
    holdings: Holdings,
    nav: NavTracker,
    trades: Vec<TradeEvent>,
    skipped: Vec<NaiveDate>,
}

impl<'a> Simulator<'a> {
    /// Score every instrument and build the decision calendar.
    ///
    /// Fails with `BenchmarkUnavailable` when the benchmark series is missing
    /// or empty, and `NoCommonDates` when fewer than two shared monthly dates
    /// fall inside the configured range.
    pub fn new(
        instruments: &'a [PriceSeries],
        benchmark: Option<&'a PriceSeries>,
        config: &'a BacktestConfig,
    ) -> Result<Self, InertiaError> {
        let benchmark = benchmark
            .filter(|b| !b.is_empty())
            .ok_or_else(|| InertiaError::BenchmarkUnavailable {
                code: config.benchmark.clone(),
            })?;

        let instruments: Vec<ScoredInstrument<'a>> = instruments
            .par_iter()
            .map(|series| ScoredInstrument {
                series,
                scores: score_series(series, &config.params),
            })
            .collect();

        let mut all: Vec<&PriceSeries> = instruments.iter().map(|i| i.series).collect();
        all.push(benchmark);
        let timeline: Vec<NaiveDate> = build_common_timeline(&all)
            .into_iter()
            .filter(|d| *d >= config.start_date)
            .filter(|d| config.end_date.is_none_or(|end| *d <= end))
            .skip_while(|d| !instruments.iter().any(|i| i.has_lookback_at(*d)))
            .collect();

        if timeline.len() < 2 {
            return Err(InertiaError::NoCommonDates);
        }

        Ok(Self {
            config,
            instruments,
            benchmark,
            timeline,
            cursor: 0,
            phase: Phase::Idle,
            holdings: Holdings::default(),
            nav: NavTracker::new(),
            trades: Vec::new(),
            skipped: Vec::new(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn holdings(&self) -> &Holdings {
        &self.holdings
    }

    pub fn nav(&self) -> &[NavPoint] {
        self.nav.points()
    }

    /// Decision dates followed by the final valuation date.
    pub fn timeline(&self) -> &[NaiveDate] {
        &self.timeline
    }

    /// Ranking at `date` using only bars dated on or before it.
    pub fn rank_at(&self, date: NaiveDate) -> Result<RankingSnapshot, InsufficientCandidates> {
        let candidates = self
            .instruments
            .iter()
            .map(|inst| (inst.series.code.clone(), inst.score_at(date)))
            .collect();
        rank(
            date,
            candidates,
            &self.config.universe,
            RankMode::BacktestEligible,
            self.config.top_k,
        )
    }

    fn portfolio_return(&self, from: NaiveDate, to: NaiveDate) -> f64 {
        let returns: Vec<f64> = self
            .holdings
            .codes()
            .iter()
            .filter_map(|code| {
                self.instruments
                    .iter()
                    .find(|i| &i.series.code == code)
                    .and_then(|i| i.series.realized_return(from, to))
            })
            .collect();
        if returns.is_empty() {
            0.0
        } else {
            returns.iter().sum::<f64>() / returns.len() as f64
        }
    }

    /// Advance one month. Returns `None` once the calendar is exhausted.
    pub fn step(&mut self) -> Option<MonthOutcome> {
        if self.phase == Phase::Done {
            return None;
        }
        if self.cursor + 1 >= self.timeline.len() {
            self.phase = Phase::Done;
            return None;
        }
        let date = self.timeline[self.cursor];
        let next = self.timeline[self.cursor + 1];
        self.cursor += 1;

        self.phase = Phase::Ranking;
        let ranking = match self.rank_at(date) {
            Ok(r) => r,
            Err(e) => {
                debug!(%date, eligible = e.eligible, "skipping month");
                self.skipped.push(date);
                return Some(MonthOutcome::Skipped {
                    date,
                    eligible: e.eligible,
                });
            }
        };

        self.phase = Phase::Rebalancing;
        if !self.nav.is_started() {
            self.nav.start(date, INITIAL_NAV);
        }
        let trade = self
            .holdings
            .rebalance(date, ranking.top(self.config.top_k));
        if let Some(t) = &trade {
            self.trades.push(t.clone());
        }

        self.phase = Phase::Accruing;
        let portfolio_return = self.portfolio_return(date, next);
        let benchmark_return = self.benchmark.realized_return(date, next).unwrap_or(0.0);
        self.nav.accrue(next, portfolio_return, benchmark_return);
        debug!(
            %date,
            holdings = ?self.holdings.codes(),
            portfolio_return,
            benchmark_return,
            "month accrued"
        );

        Some(MonthOutcome::Rebalanced {
            date,
            ranking,
            trade,
            portfolio_return,
            benchmark_return,
        })
    }

    /// Run to completion and summarize.
    pub fn run(mut self) -> BacktestResult {
        while self.step().is_some() {}
        self.finish()
    }

    fn finish(mut self) -> BacktestResult {
        self.phase = Phase::Done;
        let start_date = self.timeline[0];
        let end_date = self.timeline[self.timeline.len() - 1];
        if !self.nav.is_started() {
            self.nav.start(start_date, INITIAL_NAV);
        }

        let nav = self.nav.into_points();
        BacktestResult {
            portfolio: summarize(&portfolio_curve(&nav)),
            benchmark: summarize(&benchmark_curve(&nav)),
            rebalanced_months: nav.len() - 1,
            nav,
            trades: self.trades,
            start_date,
            end_date,
            skipped_months: self.skipped,
        }
    }
}

/// Score, rank, rebalance and accrue over the full range.
pub fn run_backtest(
    instruments: &[PriceSeries],
    benchmark: Option<&PriceSeries>,
    config: &BacktestConfig,
) -> Result<BacktestResult, InertiaError> {
    Ok(Simulator::new(instruments, benchmark, config)?.run())
}
