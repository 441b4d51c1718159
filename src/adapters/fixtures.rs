//! Shared sample results for adapter tests.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::Exclusion;
use crate::domain::inertia::IndicatorSnapshot;
use crate::domain::metrics::summarize;
use crate::domain::portfolio::{benchmark_curve, portfolio_curve, NavPoint, TradeEvent};
use crate::domain::ranking::{ExcludedInstrument, RankedInstrument, RankingResult};
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn ranked(code: &str, score: f64, close: f64) -> RankedInstrument {
    RankedInstrument {
        code: code.to_string(),
        score,
        snapshot: IndicatorSnapshot {
            date: date(2024, 2, 29),
            code: code.to_string(),
            close,
            roc_fast: 12.0,
            roc_slow: 9.0,
            atr: 3.0,
            sma: 100.0,
            volatility_ratio: 0.03,
            momentum: 6.6,
            raw: score,
            score,
        },
    }
}

pub fn sample_ranking_result() -> RankingResult {
    RankingResult {
        date: date(2024, 2, 29),
        top_k: 2,
        rankings: vec![
            ranked("XLK", 550.0, 210.5),
            ranked("XLE", 120.25, 88.1),
            ranked("IEF", 0.0, 94.3),
        ],
        excluded: vec![ExcludedInstrument {
            code: "XLC".to_string(),
            reason: Exclusion::InsufficientHistory {
                bars: 10,
                required: 24,
            },
        }],
        partial: false,
    }
}

pub fn sample_backtest_result() -> BacktestResult {
    let nav = vec![
        NavPoint {
            date: date(2023, 11, 30),
            portfolio_value: 100.0,
            benchmark_value: 100.0,
        },
        NavPoint {
            date: date(2023, 12, 31),
            portfolio_value: 104.0,
            benchmark_value: 102.0,
        },
        NavPoint {
            date: date(2024, 1, 31),
            portfolio_value: 101.0,
            benchmark_value: 103.0,
        },
        NavPoint {
            date: date(2024, 2, 29),
            portfolio_value: 107.0,
            benchmark_value: 104.5,
        },
    ];
    let trades = vec![
        TradeEvent {
            date: date(2023, 11, 30),
            entries: vec!["XLK".to_string()],
            exits: vec![],
            holdings: vec!["XLK".to_string()],
        },
        TradeEvent {
            date: date(2024, 1, 31),
            entries: vec!["XLE".to_string()],
            exits: vec!["XLK".to_string()],
            holdings: vec!["XLE".to_string()],
        },
    ];

    BacktestResult {
        portfolio: summarize(&portfolio_curve(&nav)),
        benchmark: summarize(&benchmark_curve(&nav)),
        rebalanced_months: nav.len() - 1,
        start_date: date(2023, 11, 30),
        end_date: date(2024, 2, 29),
        nav,
        trades,
        skipped_months: vec![],
    }
}
