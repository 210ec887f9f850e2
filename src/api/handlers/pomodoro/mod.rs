//! Pomodoro session endpoints and per-user analytics.

pub(crate) mod analytics;
pub(crate) mod crud;
pub(crate) mod storage;
pub(crate) mod types;

const SESSION_NOT_FOUND: &str = "Pomodoro session not found";
const DEFAULT_SESSION_LIMIT: i64 = 100;
