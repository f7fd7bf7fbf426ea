//! Remote data transport: the contract the collection pipeline needs from
//! GitHub, and the GraphQL client that fulfills it.

mod client;

pub use client::{GITHUB_GRAPHQL_URL, GithubClient};

use crate::model::{DailyRecord, Profile, RankedRepo};
use chrono::{DateTime, Utc};

/// Why a profile lookup failed. The profile fetch is the only remote call
/// whose failure is fatal to a run.
#[derive(Debug)]
pub enum ProfileError {
    /// The subject does not exist upstream.
    NotFound(String),

    /// Transport or protocol failure, including malformed responses.
    Remote(ohno::AppError),
}

impl core::fmt::Display for ProfileError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound(login) => write!(f, "user '{login}' was not found"),
            Self::Remote(e) => write!(f, "{e}"),
        }
    }
}

impl core::error::Error for ProfileError {}

/// The remote calls one collection run performs.
///
/// Every method except [`fetch_profile`](Transport::fetch_profile) degrades
/// to an empty result on failure instead of reporting an error; partial
/// remote outages silently understate statistics rather than aborting the
/// run. That asymmetry is deliberate and relied upon by the orchestrator.
pub trait Transport: Send + Sync + 'static {
    /// Fetch the profile snapshot for `login`.
    fn fetch_profile(&self, login: &str) -> impl Future<Output = Result<Profile, ProfileError>> + Send;

    /// Fetch per-day activity counts for `[from, to)`. Empty on any failure.
    fn fetch_daily_records(&self, login: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> impl Future<Output = Vec<DailyRecord>> + Send;

    /// Fetch the user's `limit` most popular repositories. Empty on any
    /// failure.
    fn fetch_top_repos(&self, login: &str, limit: usize) -> impl Future<Output = Vec<RankedRepo>> + Send;
}
