//! Composite "bullish inertia" score on monthly bars.
//!
//! ```text
//! numerator   = ROC(N)*w1 + ROC(M)*w2
//! denominator = (ATR(P) / SMA(P)) * w3
//! score       = max(0, numerator / denominator)
//! ```
//!
//! Every value at bar `t` is computed from bars `..=t` only. A bar is scored
//! once `P + max(N, M)` earlier bars exist and the window covers consecutive
//! calendar months; anything else is a tagged [`Exclusion`], never NaN.

use crate::domain::error::{Exclusion, UndefinedReason};
use crate::domain::indicator::atr::calculate_atr;
use crate::domain::indicator::roc::calculate_roc;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::resample::months_between;
use crate::domain::series::PriceSeries;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InertiaParams {
    /// Fast ROC lookback N.
    pub fast: usize,
    /// Slow ROC lookback M.
    pub slow: usize,
    /// ATR and SMA period P.
    pub period: usize,
    pub weight_fast: f64,
    pub weight_slow: f64,
    pub weight_volatility: f64,
}

impl Default for InertiaParams {
    fn default() -> Self {
        Self {
            fast: 8,
            slow: 10,
            period: 14,
            weight_fast: 0.4,
            weight_slow: 0.2,
            weight_volatility: 0.4,
        }
    }
}

impl InertiaParams {
    /// Prior monthly bars required before a score can be defined.
    pub fn lookback(&self) -> usize {
        self.period + self.fast.max(self.slow)
    }

    /// Minimum length of a resampled series worth scoring.
    pub fn min_monthly_bars(&self) -> usize {
        self.period + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub date: NaiveDate,
    pub code: String,
    pub close: f64,
    pub roc_fast: f64,
    pub roc_slow: f64,
    pub atr: f64,
    pub sma: f64,
    pub volatility_ratio: f64,
    /// Weighted ROC numerator.
    pub momentum: f64,
    /// Score before clamping at zero.
    pub raw: f64,
    pub score: f64,
}

/// A scored bar or the reason it has no score.
pub type ScoreResult = Result<IndicatorSnapshot, Exclusion>;

struct Components {
    roc_fast: IndicatorSeries,
    roc_slow: IndicatorSeries,
    atr: IndicatorSeries,
    sma: IndicatorSeries,
}

impl Components {
    fn new(series: &PriceSeries, params: &InertiaParams) -> Self {
        Self {
            roc_fast: calculate_roc(&series.bars, params.fast),
            roc_slow: calculate_roc(&series.bars, params.slow),
            atr: calculate_atr(&series.bars, params.period),
            sma: calculate_sma(&series.bars, params.period),
        }
    }

    fn evaluate(&self, series: &PriceSeries, t: usize, params: &InertiaParams) -> ScoreResult {
        let bars = &series.bars;
        let lookback = params.lookback();
        if t < lookback {
            return Err(Exclusion::InsufficientHistory {
                bars: t,
                required: lookback,
            });
        }
        if months_between(bars[t - lookback].date, bars[t].date) != lookback as i32 {
            return Err(undefined(UndefinedReason::GapInLookback));
        }

        let roc_fast = self
            .roc_fast
            .value_at(t)
            .ok_or(undefined(UndefinedReason::ZeroBaseClose {
                lookback: params.fast,
            }))?;
        let roc_slow = self
            .roc_slow
            .value_at(t)
            .ok_or(undefined(UndefinedReason::ZeroBaseClose {
                lookback: params.slow,
            }))?;
        let atr = self
            .atr
            .value_at(t)
            .ok_or(undefined(UndefinedReason::NonFinite))?;
        let sma = self
            .sma
            .value_at(t)
            .ok_or(undefined(UndefinedReason::NonFinite))?;

        if sma == 0.0 {
            return Err(undefined(UndefinedReason::ZeroSma));
        }
        let volatility_ratio = atr / sma;
        let denominator = volatility_ratio * params.weight_volatility;
        if denominator == 0.0 {
            return Err(undefined(UndefinedReason::ZeroDenominator));
        }

        let momentum = roc_fast * params.weight_fast + roc_slow * params.weight_slow;
        let raw = momentum / denominator;
        if !raw.is_finite() || !volatility_ratio.is_finite() {
            return Err(undefined(UndefinedReason::NonFinite));
        }

        Ok(IndicatorSnapshot {
            date: bars[t].date,
            code: series.code.clone(),
            close: bars[t].close,
            roc_fast,
            roc_slow,
            atr,
            sma,
            volatility_ratio,
            momentum,
            raw,
            score: raw.max(0.0),
        })
    }
}

fn undefined(reason: UndefinedReason) -> Exclusion {
    Exclusion::UndefinedIndicator(reason)
}

/// One result per bar of `series`, in order.
pub fn score_series(series: &PriceSeries, params: &InertiaParams) -> Vec<ScoreResult> {
    let components = Components::new(series, params);
    (0..series.len())
        .map(|t| components.evaluate(series, t, params))
        .collect()
}

/// Snapshots for every bar that has a defined score.
pub fn compute(series: &PriceSeries, params: &InertiaParams) -> Vec<IndicatorSnapshot> {
    score_series(series, params)
        .into_iter()
        .filter_map(Result::ok)
        .collect()
}

/// Score of the most recent bar.
pub fn compute_latest(series: &PriceSeries, params: &InertiaParams) -> ScoreResult {
    score_series(series, params)
        .pop()
        .unwrap_or(Err(Exclusion::NoData))
}
