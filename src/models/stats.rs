//! Todo statistics buckets.
//!
//! Server mode fills this from one count query per bucket; guest mode
//! computes it in a single pass over the local collection. Either way the
//! shape and rounding rules are identical.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Todo;

/// Aggregate counts over a user's todos.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoStats {
    pub total: u64,
    /// Completed and not archived
    pub completed: u64,
    /// Neither completed nor archived
    pub pending: u64,
    pub archived: u64,
    /// Past due date, neither completed nor archived
    pub overdue: u64,
    /// round(completed / total * 100); 0 when total is 0
    pub completion_rate: u32,
}

impl TodoStats {
    /// Assemble from pre-counted buckets, deriving the completion rate.
    pub fn from_counts(total: u64, completed: u64, pending: u64, archived: u64, overdue: u64) -> Self {
        Self {
            total,
            completed,
            pending,
            archived,
            overdue,
            completion_rate: completion_rate(completed, total),
        }
    }

    /// Single-pass computation for an in-memory collection (guest mode).
    pub fn compute(todos: &[Todo], now: DateTime<Utc>) -> Self {
        let mut stats = Self::default();
        for todo in todos {
            stats.total += 1;
            if todo.is_archived {
                stats.archived += 1;
            } else if todo.is_completed {
                stats.completed += 1;
            } else {
                stats.pending += 1;
            }
            if todo.is_overdue(now) {
                stats.overdue += 1;
            }
        }
        stats.completion_rate = completion_rate(stats.completed, stats.total);
        stats
    }
}

fn completion_rate(completed: u64, total: u64) -> u32 {
    if total == 0 {
        0
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn todo(id: &str, completed: bool, archived: bool, due: Option<DateTime<Utc>>) -> Todo {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut t = Todo::new(
            id.to_string(),
            format!("todo {id}"),
            "General".to_string(),
            due,
            None,
            now,
        );
        t.is_completed = completed;
        t.is_archived = archived;
        t
    }

    #[test]
    fn test_empty_collection_rate_is_zero() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let stats = TodoStats::compute(&[], now);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_rate, 0);
    }

    #[test]
    fn test_three_of_four_is_75() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let todos = vec![
            todo("1", true, false, None),
            todo("2", true, false, None),
            todo("3", true, false, None),
            todo("4", false, false, None),
        ];
        let stats = TodoStats::compute(&todos, now);
        assert_eq!(stats.completed, 3);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.completion_rate, 75);
    }

    #[test]
    fn test_overdue_excludes_completed_and_archived() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let past = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        let future = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();

        let todos = vec![
            todo("1", false, false, Some(past)),   // overdue
            todo("2", true, false, Some(past)),    // completed, not overdue
            todo("3", false, true, Some(past)),    // archived, not overdue
            todo("4", false, false, Some(future)), // not due yet
            todo("5", false, false, None),         // no deadline
        ];
        let stats = TodoStats::compute(&todos, now);
        assert_eq!(stats.overdue, 1);
    }

    #[test]
    fn test_archived_bucket_takes_precedence() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        // Completed AND archived: counts as archived, not completed
        let todos = vec![todo("1", true, true, None)];
        let stats = TodoStats::compute(&todos, now);
        assert_eq!(stats.archived, 1);
        assert_eq!(stats.completed, 0);
        assert_eq!(stats.completion_rate, 0);
    }

    #[test]
    fn test_from_counts_rounds() {
        let stats = TodoStats::from_counts(3, 1, 2, 0, 0);
        assert_eq!(stats.completion_rate, 33);
        let stats = TodoStats::from_counts(3, 2, 1, 0, 0);
        assert_eq!(stats.completion_rate, 67);
    }
}
