//! End-to-end collection runs over a scripted in-memory transport.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use commit_receipt::collect::{CollectError, Collector};
use commit_receipt::config::Config;
use commit_receipt::github::{ProfileError, Transport};
use commit_receipt::model::{DailyRecord, Profile, RankedRepo};
use commit_receipt::registry::Registry;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const HISTORY_DAYS: i64 = 1095;
const ACTIVE_PREFIX_DAYS: i64 = 458;
const BEST_DAY_OFFSET: i64 = 500;
const BEST_DAY_COUNT: u32 = 42;

/// Serves a dense synthetic contribution calendar: one count-1 record per
/// day for the first 458 days of the account's life, a single 42-count spike
/// at day 500, and zeros elsewhere. Total activity sums to 500.
struct CalendarTransport {
    created_at: DateTime<Utc>,
    /// 0-based index of the `fetch_daily_records` call that should fail
    /// (call 0 is the recent window; history chunks follow).
    failing_call: Option<usize>,
    calls: AtomicUsize,
}

impl CalendarTransport {
    fn new(failing_call: Option<usize>) -> Self {
        Self {
            created_at: Utc::now() - Duration::days(HISTORY_DAYS),
            failing_call,
            calls: AtomicUsize::new(0),
        }
    }

    fn best_date(&self) -> NaiveDate {
        self.created_at.date_naive() + Duration::days(BEST_DAY_OFFSET)
    }

    fn count_for(&self, date: NaiveDate) -> u32 {
        if date == self.best_date() {
            BEST_DAY_COUNT
        } else if date < self.created_at.date_naive() + Duration::days(ACTIVE_PREFIX_DAYS) {
            1
        } else {
            0
        }
    }
}

impl Transport for CalendarTransport {
    async fn fetch_profile(&self, login: &str) -> Result<Profile, ProfileError> {
        if login != "alice" {
            return Err(ProfileError::NotFound(login.to_owned()));
        }

        Ok(Profile {
            login: login.to_owned(),
            name: "Alice".to_owned(),
            avatar_url: "https://example.com/alice.png".to_owned(),
            created_at: self.created_at,
            followers: 12,
            following: 3,
            public_repos: 5,
        })
    }

    async fn fetch_daily_records(&self, _login: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<DailyRecord> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_call == Some(call) {
            return Vec::new();
        }

        let mut records = Vec::new();
        let mut date = from.date_naive();
        while date < to.date_naive() {
            records.push(DailyRecord {
                date: date.format("%Y-%m-%d").to_string(),
                count: self.count_for(date),
            });
            date += Duration::days(1);
        }

        records
    }

    async fn fetch_top_repos(&self, _login: &str, limit: usize) -> Vec<RankedRepo> {
        let repos = vec![
            RankedRepo {
                name: "widget".to_owned(),
                stars: 100,
                primary_language: Some("Rust".to_owned()),
                updated_at: "2024-01-01T00:00:00Z".parse().unwrap(),
            },
            RankedRepo {
                name: "gadget".to_owned(),
                stars: 100,
                primary_language: None,
                updated_at: "2024-06-01T00:00:00Z".parse().unwrap(),
            },
        ];

        repos.into_iter().take(limit).collect()
    }
}

fn collector(transport: CalendarTransport) -> Collector<CalendarTransport> {
    Collector::new(Arc::new(transport), Registry::new(), &Config::default())
}

#[tokio::test]
async fn test_full_run_aggregates_synthetic_history() {
    let transport = CalendarTransport::new(None);
    let best_date = transport.best_date().format("%Y-%m-%d").to_string();
    let collector = collector(transport);

    let stats = collector.collect("alice").await.unwrap();

    assert_eq!(stats.profile.login, "alice");
    assert_eq!(stats.total_count, 500);
    assert_eq!(stats.best_day.date, best_date);
    assert_eq!(stats.best_day.count, BEST_DAY_COUNT);
    assert_eq!(u64::from(stats.active_days), 459);
    assert_eq!(u64::from(stats.longest_streak), 458);

    // The recent window is chronological.
    assert!(stats.recent_daily.windows(2).all(|w| w[0].date <= w[1].date));

    // Equal-star repos tie-break on most recent update.
    assert_eq!(stats.top_repos[0].name, "gadget");
    assert_eq!(stats.top_repos[1].name, "widget");
}

#[tokio::test]
async fn test_partial_chunk_outage_understates_totals_but_completes() {
    // Call 0 is the recent window; fail the first of three history chunks.
    let transport = CalendarTransport::new(Some(1));
    let collector = collector(transport);

    let stats = collector.collect("alice").await.unwrap();

    // The lost chunk covered days 0..365 of the account's life, one
    // contribution each; the day-500 spike lands in a later chunk and
    // survives.
    assert_eq!(stats.total_count, 500 - 365);
    assert_eq!(stats.best_day.count, BEST_DAY_COUNT);
    assert_eq!(u64::from(stats.active_days), 459 - 365);
}

#[tokio::test]
async fn test_unknown_user_is_fatal() {
    let collector = collector(CalendarTransport::new(None));

    let err = collector.collect("nobody").await.unwrap_err();
    assert!(matches!(err, CollectError::NotFound(login) if login == "nobody"));
}

#[tokio::test]
async fn test_concurrent_runs_share_only_the_registry() {
    let registry = Registry::new();
    let alice_collector = Collector::new(Arc::new(CalendarTransport::new(None)), Arc::clone(&registry), &Config::default());
    let bob_like_collector = Collector::new(Arc::new(CalendarTransport::new(None)), registry, &Config::default());

    let (a, b) = tokio::join!(alice_collector.collect("alice"), bob_like_collector.collect("alice"));

    assert_eq!(a.unwrap().total_count, 500);
    assert_eq!(b.unwrap().total_count, 500);
}
