//! Data types shared across the collection pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One calendar day of contribution activity.
///
/// The date is an ISO calendar date (`YYYY-MM-DD`) as returned by the GitHub
/// contribution calendar. ISO dates sort lexicographically in chronological
/// order, and the empty string doubles as the "no data" sentinel for
/// [`best_day`](UserStats::best_day).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: String,
    pub count: u32,
}

impl DailyRecord {
    /// Sentinel record used when a user has no activity at all.
    #[must_use]
    pub fn sentinel() -> Self {
        Self {
            date: String::new(),
            count: 0,
        }
    }
}

/// Immutable profile snapshot, fetched once per collection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub login: String,

    /// Display name; falls back to the login when the API returns none.
    pub name: String,

    pub avatar_url: String,
    pub created_at: DateTime<Utc>,
    pub followers: u32,
    pub following: u32,
    pub public_repos: u32,
}

/// A repository ranked by popularity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedRepo {
    pub name: String,
    pub stars: u32,
    pub primary_language: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// The aggregated outcome of one successful collection run.
///
/// Produced exactly once per run and carried on the terminal `complete`
/// event; immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub profile: Profile,

    /// Daily activity for the recent window, in chronological order.
    pub recent_daily: Vec<DailyRecord>,

    /// Sum of all counts over the full history (not the recent window).
    pub total_count: u64,

    /// Number of days with at least one contribution.
    pub active_days: u32,

    /// Longest run of consecutive positive-count records.
    pub longest_streak: u32,

    /// The single highest-count day, or the sentinel when history is empty.
    pub best_day: DailyRecord,

    /// Repositories ranked by stars, most-recently-updated first on ties.
    pub top_repos: Vec<RankedRepo>,
}
