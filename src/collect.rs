//! The collection orchestrator: drives one end-to-end run per subject and
//! publishes progress through the registry as it proceeds.

use crate::config::Config;
use crate::events::{Event, EventSink};
use crate::github::{ProfileError, Transport};
use crate::history::{HistoryFetch, fetch_full_history};
use crate::model::UserStats;
use crate::registry::Registry;
use crate::stats::aggregate;
use chrono::{Duration, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;

const LOG_TARGET: &str = "   collect";

const PROGRESS_PROFILE: u8 = 10;
const PROGRESS_RECENT: u8 = 50;
const PROGRESS_TOP_REPOS: u8 = 85;
const PROGRESS_PROCESSING: u8 = 90;

/// A fatal collection failure. Only the profile fetch can produce one; every
/// other phase degrades to partial data instead.
#[derive(Debug)]
pub enum CollectError {
    /// The subject does not exist upstream.
    NotFound(String),

    /// The profile fetch failed at the transport level.
    Remote(ohno::AppError),
}

impl core::fmt::Display for CollectError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound(login) => write!(f, "user '{login}' was not found"),
            Self::Remote(e) => write!(f, "{e}"),
        }
    }
}

impl core::error::Error for CollectError {}

impl From<ProfileError> for CollectError {
    fn from(e: ProfileError) -> Self {
        match e {
            ProfileError::NotFound(login) => Self::NotFound(login),
            ProfileError::Remote(inner) => Self::Remote(inner),
        }
    }
}

/// How one run ended.
enum RunOutcome {
    Finished(UserStats),
    Fatal(CollectError),
    Abandoned,
}

/// Sink that publishes into the registry under one subject key.
struct RegistrySink {
    registry: Arc<Registry>,
    subject: String,
}

impl EventSink for RegistrySink {
    fn emit(&self, event: Event) {
        self.registry.publish(&self.subject, &event);
    }
}

/// Watches for a background run losing its last observer.
///
/// Arms once at least one subscriber has been seen for the subject; reports
/// abandonment only when the count later returns to zero. A run started
/// before anyone subscribed therefore gets a grace window instead of being
/// cancelled on its first chunk.
struct AbandonWatch {
    registry: Arc<Registry>,
    subject: String,
    armed: AtomicBool,
}

impl AbandonWatch {
    fn is_abandoned(&self) -> bool {
        if self.registry.subscriber_count(&self.subject) > 0 {
            self.armed.store(true, Ordering::Relaxed);
            return false;
        }

        self.armed.load(Ordering::Relaxed)
    }
}

/// Drives collection runs over a transport, publishing progress through a
/// shared registry. One collector serves many concurrent runs; runs share
/// nothing but the registry.
pub struct Collector<T> {
    transport: Arc<T>,
    registry: Arc<Registry>,
    recent_window_days: i64,
    top_repo_limit: usize,
}

impl<T> Clone for Collector<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            registry: Arc::clone(&self.registry),
            recent_window_days: self.recent_window_days,
            top_repo_limit: self.top_repo_limit,
        }
    }
}

impl<T> core::fmt::Debug for Collector<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Collector")
            .field("recent_window_days", &self.recent_window_days)
            .field("top_repo_limit", &self.top_repo_limit)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Collector<T> {
    #[must_use]
    pub fn new(transport: Arc<T>, registry: Arc<Registry>, config: &Config) -> Self {
        Self {
            transport,
            registry,
            recent_window_days: i64::from(config.recent_window_days),
            top_repo_limit: config.top_repo_limit,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Run the full state machine and return the result directly.
    ///
    /// Progress is still published for whoever happens to be watching, but
    /// the run executes to completion regardless of observers.
    pub async fn collect(&self, login: &str) -> Result<UserStats, CollectError> {
        match self.run(login, false).await {
            RunOutcome::Finished(stats) => Ok(stats),
            RunOutcome::Fatal(e) => Err(e),
            RunOutcome::Abandoned => unreachable!("synchronous runs do not watch for abandonment"),
        }
    }

    /// Start a detached background run.
    ///
    /// All progress and the final result are delivered only through the
    /// registry; subscribe before calling this to observe the early events.
    /// The run stops early if its observers all disconnect.
    pub fn spawn(&self, login: &str) -> JoinHandle<()> {
        let collector = self.clone();
        let login = login.to_owned();

        tokio::spawn(async move {
            match collector.run(&login, true).await {
                RunOutcome::Finished(_) => log::info!(target: LOG_TARGET, "background run for '{login}' completed"),
                RunOutcome::Fatal(e) => log::info!(target: LOG_TARGET, "background run for '{login}' failed: {e}"),
                RunOutcome::Abandoned => log::info!(target: LOG_TARGET, "background run for '{login}' abandoned by its observers"),
            }
        })
    }

    /// One end-to-end run, terminal on the first `Completed` or `Failed`
    /// event. Progress values are non-decreasing by construction and reach
    /// 100 on completion.
    async fn run(&self, login: &str, watch_abandonment: bool) -> RunOutcome {
        let sink = RegistrySink {
            registry: Arc::clone(&self.registry),
            subject: login.to_owned(),
        };

        sink.emit(Event::started(format!("starting collection for '{login}'")));

        sink.emit(Event::fetching(format!("retrieving profile for '{login}'"), PROGRESS_PROFILE));
        let profile = match self.transport.fetch_profile(login).await {
            Ok(profile) => profile,
            Err(e) => {
                let error = CollectError::from(e);
                log::info!(target: LOG_TARGET, "run for '{login}' failed: {error}");
                sink.emit(Event::failed(error.to_string()));
                return RunOutcome::Fatal(error);
            }
        };

        let now = Utc::now();

        sink.emit(Event::fetching("retrieving recent activity", PROGRESS_RECENT));
        let recent = self
            .transport
            .fetch_daily_records(login, now - Duration::days(self.recent_window_days), now)
            .await;

        let watch = watch_abandonment.then(|| AbandonWatch {
            registry: Arc::clone(&self.registry),
            subject: login.to_owned(),
            armed: AtomicBool::new(false),
        });
        let abandoned = || watch.as_ref().is_some_and(AbandonWatch::is_abandoned);

        let history = match fetch_full_history(self.transport.as_ref(), login, profile.created_at, now, &sink, &abandoned).await {
            HistoryFetch::Complete(records) => records,
            HistoryFetch::Abandoned => return RunOutcome::Abandoned,
        };

        sink.emit(Event::fetching(
            format!("retrieving top repositories (up to {})", self.top_repo_limit),
            PROGRESS_TOP_REPOS,
        ));
        let repos = self.transport.fetch_top_repos(login, self.top_repo_limit).await;

        sink.emit(Event::processing("analyzing data and computing statistics", PROGRESS_PROCESSING));
        let stats = aggregate(profile, recent, &history, repos);

        sink.emit(Event::completed("collection complete", stats.clone()));
        log::debug!(target: LOG_TARGET, "run for '{login}' finished with {} total contribution(s)", stats.total_count);

        RunOutcome::Finished(stats)
    }
}
