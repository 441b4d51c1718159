//! Data access port trait.

use crate::domain::error::InertiaError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily bars for `code` within `[start_date, end_date]`, oldest first,
    /// one bar per date. An empty vector means no data.
    fn fetch_daily(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, InertiaError>;

    fn list_symbols(&self) -> Result<Vec<String>, InertiaError>;
}
