//! Cross-sectional ranking of instruments at one date.

use crate::domain::error::Exclusion;
use crate::domain::inertia::{compute_latest, IndicatorSnapshot, InertiaParams, ScoreResult};
use crate::domain::series::PriceSeries;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RankMode {
    /// Every defined score, including zero.
    Live,
    /// Only strictly positive scores are investable.
    BacktestEligible,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedInstrument {
    pub code: String,
    pub score: f64,
    pub snapshot: IndicatorSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcludedInstrument {
    pub code: String,
    pub reason: Exclusion,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingSnapshot {
    pub date: NaiveDate,
    pub entries: Vec<RankedInstrument>,
    pub excluded: Vec<ExcludedInstrument>,
}

impl RankingSnapshot {
    pub fn codes(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.code.as_str()).collect()
    }

    /// The first `k` codes in rank order.
    pub fn top(&self, k: usize) -> Vec<String> {
        self.entries.iter().take(k).map(|e| e.code.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("insufficient candidates: {eligible} eligible, top {required} requested")]
pub struct InsufficientCandidates {
    pub eligible: usize,
    pub required: usize,
    /// Whatever did rank, for callers that report partial results.
    pub partial: RankingSnapshot,
}

/// Live ranking as reported: the ordered table plus how many rows are
/// recommended for holding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingResult {
    pub date: NaiveDate,
    pub top_k: usize,
    pub rankings: Vec<RankedInstrument>,
    pub excluded: Vec<ExcludedInstrument>,
    /// Fewer than `top_k` instruments could be ranked.
    pub partial: bool,
}

impl RankingResult {
    pub fn from_outcome(
        outcome: Result<RankingSnapshot, InsufficientCandidates>,
        top_k: usize,
    ) -> Self {
        let (snapshot, partial) = match outcome {
            Ok(snapshot) => (snapshot, false),
            Err(e) => (e.partial, true),
        };
        RankingResult {
            date: snapshot.date,
            top_k,
            rankings: snapshot.entries,
            excluded: snapshot.excluded,
            partial,
        }
    }

    /// The recommended instruments: the first `top_k` rows.
    pub fn eligible(&self) -> &[RankedInstrument] {
        &self.rankings[..self.top_k.min(self.rankings.len())]
    }

    pub fn is_eligible(&self, rank_index: usize) -> bool {
        rank_index < self.top_k
    }
}

/// Rank `candidates` by score, descending.
///
/// Equal scores keep the order of `universe_order`; codes missing from it
/// sort after every listed code, in candidate order.
pub fn rank(
    date: NaiveDate,
    candidates: Vec<(String, ScoreResult)>,
    universe_order: &[String],
    mode: RankMode,
    top_k: usize,
) -> Result<RankingSnapshot, InsufficientCandidates> {
    let position: HashMap<&str, usize> = universe_order
        .iter()
        .enumerate()
        .map(|(i, code)| (code.as_str(), i))
        .collect();

    let mut entries = Vec::new();
    let mut excluded = Vec::new();

    for (code, result) in candidates {
        match result {
            Ok(snapshot) if mode == RankMode::Live || snapshot.score > 0.0 => {
                entries.push(RankedInstrument {
                    score: snapshot.score,
                    code,
                    snapshot,
                });
            }
            Ok(_) => {}
            Err(reason) => excluded.push(ExcludedInstrument { code, reason }),
        }
    }

    // stable sort: universe order first, then score
    entries.sort_by_key(|e| position.get(e.code.as_str()).copied().unwrap_or(usize::MAX));
    entries.sort_by(|a, b| b.score.total_cmp(&a.score));

    let snapshot = RankingSnapshot {
        date,
        entries,
        excluded,
    };

    if snapshot.entries.len() < top_k {
        return Err(InsufficientCandidates {
            eligible: snapshot.entries.len(),
            required: top_k,
            partial: snapshot,
        });
    }
    Ok(snapshot)
}

/// Live ranking: score each instrument's most recent bar and rank them all.
///
/// The snapshot is dated at the latest bar across `instruments`. An instrument
/// whose last bar is older than that date is excluded as stale. Codes listed
/// in `unavailable` failed upstream and are reported as excluded.
pub fn rank_latest(
    instruments: &[PriceSeries],
    unavailable: Vec<(String, Exclusion)>,
    universe_order: &[String],
    params: &InertiaParams,
    top_k: usize,
) -> Result<RankingSnapshot, InsufficientCandidates> {
    let date = instruments
        .iter()
        .filter_map(|s| s.last_date())
        .max()
        .unwrap_or_default();

    let mut candidates: Vec<(String, ScoreResult)> = instruments
        .par_iter()
        .map(|series| {
            let scored = compute_latest(series, params).and_then(|snap| {
                if snap.date == date {
                    Ok(snap)
                } else {
                    Err(Exclusion::Stale { last: snap.date })
                }
            });
            (series.code.clone(), scored)
        })
        .collect();
    candidates.extend(unavailable.into_iter().map(|(code, e)| (code, Err(e))));

    rank(date, candidates, universe_order, RankMode::Live, top_k)
}
