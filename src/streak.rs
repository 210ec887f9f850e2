//! Habit streak evaluation.
//!
//! A streak is the number of consecutive calendar days, ending today, that
//! have a recorded entry. The scan walks backward from today one day at a
//! time and stops at the first day without an entry, so older runs behind a
//! gap never count. Only the most recent [`STREAK_LOOKBACK_ENTRIES`] entries
//! are considered.

use chrono::{Days, NaiveDate};
use std::collections::HashSet;

/// How many of the most recent entries are loaded when recomputing a streak.
pub const STREAK_LOOKBACK_ENTRIES: usize = 30;

/// Current and best streak of a single habit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HabitStreak {
    pub streak_count: i32,
    pub best_streak: i32,
}

impl HabitStreak {
    #[must_use]
    pub const fn new(streak_count: i32, best_streak: i32) -> Self {
        Self {
            streak_count,
            best_streak,
        }
    }

    /// Store a freshly computed streak, raising `best_streak` when exceeded.
    pub fn record(&mut self, current: i32) {
        self.streak_count = current;
        if current > self.best_streak {
            self.best_streak = current;
        }
    }

    /// Recompute the streak from entry dates ordered most recent first.
    pub fn recompute(&mut self, entries_desc: &[NaiveDate], today: NaiveDate) {
        self.record(current_streak(entries_desc, today));
    }
}

/// Count consecutive days with an entry, starting at `today` and walking back.
///
/// `entries_desc` is expected most recent first; anything past the first
/// [`STREAK_LOOKBACK_ENTRIES`] items is ignored.
#[must_use]
pub fn current_streak(entries_desc: &[NaiveDate], today: NaiveDate) -> i32 {
    let window = &entries_desc[..entries_desc.len().min(STREAK_LOOKBACK_ENTRIES)];
    let days: HashSet<NaiveDate> = window.iter().copied().collect();

    let mut streak = 0;
    for offset in 0..window.len() {
        let Some(expected) = today.checked_sub_days(Days::new(offset as u64)) else {
            break;
        };
        if !days.contains(&expected) {
            break;
        }
        streak += 1;
    }

    streak
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
    }

    fn days_back(today: NaiveDate, offsets: &[u64]) -> Vec<NaiveDate> {
        offsets
            .iter()
            .filter_map(|offset| today.checked_sub_days(Days::new(*offset)))
            .collect()
    }

    #[test]
    fn no_entries_is_zero() {
        assert_eq!(current_streak(&[], day(2024, 3, 10)), 0);
    }

    #[test]
    fn unbroken_run_ending_today() {
        let today = day(2024, 3, 10);
        let entries = days_back(today, &[0, 1, 2, 3, 4]);
        assert_eq!(current_streak(&entries, today), 5);
    }

    #[test]
    fn missing_today_is_zero() {
        let today = day(2024, 3, 10);
        let entries = days_back(today, &[1, 2, 3]);
        assert_eq!(current_streak(&entries, today), 0);
    }

    #[test]
    fn gap_two_days_ago_stops_at_two() {
        let today = day(2024, 3, 10);
        let entries = days_back(today, &[0, 1, 3]);
        assert_eq!(current_streak(&entries, today), 2);
    }

    #[test]
    fn gap_hides_longer_older_run() {
        let today = day(2024, 3, 10);
        let entries = days_back(today, &[0, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(current_streak(&entries, today), 1);
    }

    #[test]
    fn run_crosses_month_boundary() {
        let today = day(2024, 3, 2);
        let entries = vec![day(2024, 3, 2), day(2024, 3, 1), day(2024, 2, 29)];
        assert_eq!(current_streak(&entries, today), 3);
    }

    #[test]
    fn capped_at_lookback_window() {
        let today = day(2024, 6, 30);
        let offsets: Vec<u64> = (0..45).collect();
        let entries = days_back(today, &offsets);
        assert_eq!(
            current_streak(&entries, today),
            i32::try_from(STREAK_LOOKBACK_ENTRIES).unwrap_or(i32::MAX)
        );
    }

    #[test]
    fn future_entry_does_not_break_run() {
        let today = day(2024, 3, 10);
        let mut entries = vec![day(2024, 3, 12)];
        entries.extend(days_back(today, &[0, 1]));
        assert_eq!(current_streak(&entries, today), 2);
    }

    #[test]
    fn record_raises_best_only_when_exceeded() {
        let mut streak = HabitStreak::new(3, 7);
        streak.record(5);
        assert_eq!(streak, HabitStreak::new(5, 7));
        streak.record(9);
        assert_eq!(streak, HabitStreak::new(9, 9));
        streak.record(0);
        assert_eq!(streak, HabitStreak::new(0, 9));
    }

    #[test]
    fn best_never_below_current_after_recompute() {
        let today = day(2024, 3, 10);
        let mut streak = HabitStreak::default();
        for len in [1_u64, 4, 2, 0, 6] {
            let offsets: Vec<u64> = (0..len).collect();
            let previous_best = streak.best_streak;
            streak.recompute(&days_back(today, &offsets), today);
            assert!(streak.best_streak >= streak.streak_count);
            assert!(streak.best_streak >= previous_best);
        }
        assert_eq!(streak, HabitStreak::new(6, 6));
    }
}
