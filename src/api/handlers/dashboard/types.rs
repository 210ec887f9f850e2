//! Response types for the dashboard.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    /// Defaults to `end_date` minus 30 days.
    pub start_date: Option<NaiveDate>,
    /// Defaults to today (UTC).
    pub end_date: Option<NaiveDate>,
    /// Restrict todo stats to a category.
    pub category: Option<String>,
    /// Restrict todo stats to a priority.
    pub priority: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TodoStats {
    pub total: i64,
    pub completed: i64,
    pub pending: i64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HabitStats {
    pub total: i64,
    pub active: i64,
    /// Share of entries in range with `completed_count > 0`.
    pub completion_rate: f64,
    pub average_streak: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductivityPoint {
    pub date: NaiveDate,
    pub todos_completed: i64,
    pub habits_completed: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HeatmapPoint {
    pub date: NaiveDate,
    pub completed_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub todo_stats: TodoStats,
    pub habit_stats: HabitStats,
    pub productivity_trend: Vec<ProductivityPoint>,
    pub category_distribution: BTreeMap<String, i64>,
    pub priority_distribution: BTreeMap<String, i64>,
    pub habit_heatmap: Vec<HeatmapPoint>,
}
