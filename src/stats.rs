//! Deterministic aggregation of raw daily records into summary statistics.
//!
//! Pure functions of fully-materialized inputs; no state, safe to call from
//! any task.

use crate::model::{DailyRecord, Profile, RankedRepo, UserStats};

/// Fold raw records and metadata into the final statistics.
///
/// `full_history` must contain at most one record per calendar date; the
/// fetcher guarantees this (duplicates would double-count).
#[must_use]
pub fn aggregate(
    profile: Profile,
    mut recent_daily: Vec<DailyRecord>,
    full_history: &[DailyRecord],
    mut top_repos: Vec<RankedRepo>,
) -> UserStats {
    recent_daily.sort_by(|a, b| a.date.cmp(&b.date));

    let total_count = full_history.iter().map(|day| u64::from(day.count)).sum();
    let active_days = count_active_days(full_history);
    let longest_streak = longest_streak(full_history);
    let best_day = best_day(full_history);

    // The remote query already truncates to the requested limit; only the
    // tie-break ordering is applied here.
    rank_repos(&mut top_repos);

    UserStats {
        profile,
        recent_daily,
        total_count,
        active_days,
        longest_streak,
        best_day,
        top_repos,
    }
}

/// Number of records with a strictly positive count, independent of order.
#[expect(clippy::cast_possible_truncation, reason = "one record per calendar day, far below u32::MAX")]
#[must_use]
pub fn count_active_days(records: &[DailyRecord]) -> u32 {
    records.iter().filter(|day| day.count > 0).count() as u32
}

/// Longest run of consecutive positive-count records, scanned in date order.
///
/// Only an explicit zero-count record breaks a streak. The upstream calendar
/// is dense, so genuinely missing dates do not arise in practice; if they
/// did, they would not break a streak here.
#[must_use]
pub fn longest_streak(records: &[DailyRecord]) -> u32 {
    let mut sorted: Vec<&DailyRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.date.cmp(&b.date));

    let mut longest = 0u32;
    let mut current = 0u32;
    for day in sorted {
        if day.count > 0 {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }

    longest
}

/// The first record holding the maximum count, or the sentinel when the
/// history is empty; absence is not an error state.
#[must_use]
pub fn best_day(records: &[DailyRecord]) -> DailyRecord {
    // A strict comparison keeps the first maximum on ties; `Iterator::max_by`
    // would keep the last.
    let mut best: Option<&DailyRecord> = None;
    for day in records {
        if best.is_none_or(|b| day.count > b.count) {
            best = Some(day);
        }
    }

    best.cloned().unwrap_or_else(DailyRecord::sentinel)
}

/// Order repositories by stars descending, most-recently-updated first on
/// ties.
pub fn rank_repos(repos: &mut [RankedRepo]) {
    repos.sort_by(|a, b| b.stars.cmp(&a.stars).then(b.updated_at.cmp(&a.updated_at)));
}
