//! Shared query parameter types for API handlers.

use chrono::NaiveDate;
use opstats_core::stats::DateRange;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Generic pagination parameters (`?limit=&offset=`).
///
/// Values are clamped via `opstats_core::pagination`.
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Inclusive calendar-date filter (`?from=YYYY-MM-DD&to=YYYY-MM-DD`).
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeParams {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl DateRangeParams {
    pub fn to_range(&self) -> AppResult<DateRange> {
        let from = parse_date("from", self.from.as_deref())?;
        let to = parse_date("to", self.to.as_deref())?;
        Ok(DateRange::new(from, to)?)
    }
}

fn parse_date(name: &str, value: Option<&str>) -> AppResult<Option<NaiveDate>> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d").map_err(|_| {
                AppError::BadRequest(format!("Invalid date format for '{name}', expected YYYY-MM-DD"))
            })
        })
        .transpose()
}
