pub mod admin;
pub mod auth;
pub mod dashboard;
mod error;
pub mod habits;
pub mod health;
pub mod pomodoro;
pub mod root;
#[cfg(test)]
pub(crate) mod test_db;
pub mod todos;

pub(crate) use error::ApiError;

use serde::Deserialize;
use utoipa::IntoParams;

const DEFAULT_PAGE_LIMIT: i64 = 50;
const MAX_PAGE_LIMIT: i64 = 500;

/// `skip`/`limit` query parameters shared by list endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// Rows to skip (default 0).
    pub skip: Option<i64>,
    /// Maximum rows to return (default 50, max 500).
    pub limit: Option<i64>,
}

impl Pagination {
    /// Clamped `(offset, limit)` pair.
    #[must_use]
    pub fn bounds(&self, default_limit: i64) -> (i64, i64) {
        let skip = self.skip.unwrap_or(0).max(0);
        let limit = self
            .limit
            .unwrap_or(default_limit)
            .clamp(1, MAX_PAGE_LIMIT);
        (skip, limit)
    }

    #[must_use]
    pub fn default_bounds(&self) -> (i64, i64) {
        self.bounds(DEFAULT_PAGE_LIMIT)
    }
}

/// Ascending or descending order for whitelisted sort columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Parse the `sort_order` query parameter; absent means descending.
    pub(crate) fn from_param(value: Option<&str>) -> Result<Self, ApiError> {
        match value.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            None | Some("" | "desc") => Ok(Self::Desc),
            Some("asc") => Ok(Self::Asc),
            Some(_) => Err(ApiError::bad_request("sort_order must be asc or desc")),
        }
    }
}

/// `%term%` for `ILIKE`, with wildcards in the term escaped.
#[must_use]
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Round to two decimals, as used for rates and averages in reports.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage of `part` in `total`, 0 when `total` is 0.
#[must_use]
pub fn percentage(part: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    round2(part as f64 / total as f64 * 100.0)
}
