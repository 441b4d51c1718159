//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::InertiaError;
use crate::domain::ranking::RankingResult;
use std::io::Write;

/// Port for rendering results to an output sink.
pub trait ReportPort {
    fn write_ranking(&self, result: &RankingResult, out: &mut dyn Write)
        -> Result<(), InertiaError>;

    fn write_backtest(&self, result: &BacktestResult, out: &mut dyn Write)
        -> Result<(), InertiaError>;
}
