//! Habit endpoints.
//!
//! Habits belong to the authenticated user; another user's habit answers 404.
//! Logging an entry recomputes the habit's streak inside the same transaction
//! (see [`crate::streak`]), so `streak_count` and `best_streak` are never
//! written by clients.

pub(crate) mod crud;
pub(crate) mod entries;
pub(crate) mod storage;
#[cfg(test)]
mod tests;
pub(crate) mod types;

const HABIT_NOT_FOUND: &str = "Habit not found";
