//! JSON report adapter.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::InertiaError;
use crate::domain::ranking::RankingResult;
use crate::ports::report_port::ReportPort;
use std::io::Write;

/// Pretty-printed JSON, one document per result.
#[derive(Debug, Default)]
pub struct JsonReport;

impl JsonReport {
    pub fn new() -> Self {
        Self
    }

    fn write_value<T: serde::Serialize>(
        &self,
        value: &T,
        out: &mut dyn Write,
    ) -> Result<(), InertiaError> {
        serde_json::to_writer_pretty(&mut *out, value)?;
        writeln!(out)?;
        Ok(())
    }
}

impl ReportPort for JsonReport {
    fn write_ranking(
        &self,
        result: &RankingResult,
        out: &mut dyn Write,
    ) -> Result<(), InertiaError> {
        self.write_value(result, out)
    }

    fn write_backtest(
        &self,
        result: &BacktestResult,
        out: &mut dyn Write,
    ) -> Result<(), InertiaError> {
        self.write_value(result, out)
    }
}
