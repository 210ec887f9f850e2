//! Request/response types for habit APIs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    /// Value stored in `habits.frequency`.
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateHabitRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub frequency: Frequency,
    /// Defaults to 1.
    pub target_count: Option<i32>,
}

/// Partial update. Streak counters are derived and cannot be set.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateHabitRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<Frequency>,
    pub target_count: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HabitResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub frequency: String,
    pub target_count: i32,
    pub is_active: bool,
    pub streak_count: i32,
    pub best_streak: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateEntryRequest {
    /// Defaults to 1.
    pub completed_count: Option<i32>,
    pub notes: Option<String>,
    /// Defaults to today (UTC).
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EntryResponse {
    pub id: Uuid,
    pub habit_id: Uuid,
    pub entry_date: NaiveDate,
    pub completed_count: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HabitListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    /// Only active habits (default true).
    pub active_only: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_defaults_to_daily() -> anyhow::Result<()> {
        let request: CreateHabitRequest = serde_json::from_str(r#"{"name":"Read"}"#)?;
        assert_eq!(request.frequency, Frequency::Daily);
        assert_eq!(request.frequency.as_str(), "daily");
        Ok(())
    }

    #[test]
    fn frequency_rejects_unknown_values() {
        let parsed = serde_json::from_str::<CreateHabitRequest>(
            r#"{"name":"Read","frequency":"hourly"}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn update_ignores_streak_fields() -> anyhow::Result<()> {
        let request: UpdateHabitRequest =
            serde_json::from_str(r#"{"streak_count":99,"best_streak":99,"is_active":false}"#)?;
        assert_eq!(request.is_active, Some(false));
        assert!(request.name.is_none());
        Ok(())
    }

    #[test]
    fn entry_date_parses_iso() -> anyhow::Result<()> {
        let request: CreateEntryRequest = serde_json::from_str(r#"{"date":"2024-03-10"}"#)?;
        assert_eq!(request.date, NaiveDate::from_ymd_opt(2024, 3, 10));
        Ok(())
    }
}
