//! GitHub GraphQL API client
//!
//! Minimal client for the three queries the collection pipeline issues:
//! profile snapshot, contribution calendar, and top repositories.

use super::{ProfileError, Transport};
use crate::model::{DailyRecord, Profile, RankedRepo};
use chrono::{DateTime, Utc};
use core::time::Duration;
use ohno::app_err;
use reqwest::header::HeaderMap;
use serde::Deserialize;

const LOG_TARGET: &str = "    github";

/// Production GraphQL endpoint.
pub const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const PROFILE_QUERY: &str = "
query($login: String!) {
  user(login: $login) {
    name
    login
    avatarUrl
    createdAt
    followers { totalCount }
    following { totalCount }
    repositories(privacy: PUBLIC) { totalCount }
  }
}";

const CALENDAR_QUERY: &str = "
query($login: String!, $from: DateTime!, $to: DateTime!) {
  user(login: $login) {
    contributionsCollection(from: $from, to: $to) {
      contributionCalendar {
        weeks {
          contributionDays {
            date
            contributionCount
          }
        }
      }
    }
  }
}";

const TOP_REPOS_QUERY: &str = "
query($login: String!, $first: Int!) {
  user(login: $login) {
    repositories(
      first: $first,
      privacy: PUBLIC,
      ownerAffiliations: OWNER,
      orderBy: {field: STARGAZERS, direction: DESC}
    ) {
      nodes {
        name
        stargazerCount
        primaryLanguage { name }
        updatedAt
      }
    }
  }
}";

/// Outcome of one GraphQL query, classified before per-query parsing.
enum QueryOutcome {
    /// The `user` object from the response.
    User(serde_json::Value),

    /// The response was well-formed but `user` was null.
    MissingUser,

    /// Transport failure, non-success status, GraphQL errors, or a body that
    /// could not be parsed.
    Failed(ohno::AppError),
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<GraphQlData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlData {
    user: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountNode {
    total_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserNode {
    name: Option<String>,
    login: String,
    avatar_url: String,
    created_at: DateTime<Utc>,
    followers: CountNode,
    following: CountNode,
    repositories: CountNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarUserNode {
    contributions_collection: ContributionsCollection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionsCollection {
    contribution_calendar: ContributionCalendar,
}

#[derive(Debug, Deserialize)]
struct ContributionCalendar {
    weeks: Vec<CalendarWeek>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarWeek {
    contribution_days: Vec<CalendarDay>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarDay {
    date: String,
    contribution_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepoUserNode {
    repositories: RepoConnection,
}

#[derive(Debug, Deserialize)]
struct RepoConnection {
    nodes: Vec<RepoNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepoNode {
    name: String,
    stargazer_count: u32,
    primary_language: Option<LanguageNode>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct LanguageNode {
    name: String,
}

/// GitHub GraphQL client with optional bearer-token authentication.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: reqwest::Client,
    endpoint: String,
}

impl GithubClient {
    /// Create a new client. Without a token, unauthenticated rate limits
    /// apply and most GraphQL queries will be rejected upstream.
    pub fn new(token: Option<&str>, endpoint: impl Into<String>) -> crate::Result<Self> {
        use reqwest::header::{AUTHORIZATION, HeaderValue};

        let mut client_builder = reqwest::Client::builder().user_agent("commit-receipt").timeout(REQUEST_TIMEOUT);

        if let Some(t) = token {
            let mut auth_val = HeaderValue::from_str(&format!("Bearer {t}"))?;
            auth_val.set_sensitive(true);

            let mut headers = HeaderMap::new();
            let _ = headers.insert(AUTHORIZATION, auth_val);

            client_builder = client_builder.default_headers(headers);
        }

        Ok(Self {
            client: client_builder.build()?,
            endpoint: endpoint.into(),
        })
    }

    /// Issue one GraphQL query and classify the result.
    async fn query_user(&self, query: &str, variables: serde_json::Value) -> QueryOutcome {
        let body = serde_json::json!({ "query": query, "variables": variables });

        let resp = match self.client.post(&self.endpoint).json(&body).send().await {
            Ok(r) => r,
            Err(e) => return QueryOutcome::Failed(app_err!("GitHub API request failed: {e}")),
        };

        let status = resp.status();
        if !status.is_success() {
            return QueryOutcome::Failed(app_err!("GitHub API request failed with status {status}"));
        }

        let parsed: GraphQlResponse = match resp.json().await {
            Ok(p) => p,
            Err(e) => return QueryOutcome::Failed(app_err!("malformed GitHub API response: {e}")),
        };

        if let Some(errors) = parsed.errors
            && !errors.is_empty()
        {
            let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
            return QueryOutcome::Failed(app_err!("GitHub API returned errors: {}", messages.join("; ")));
        }

        match parsed.data.and_then(|d| d.user) {
            Some(user) => QueryOutcome::User(user),
            None => QueryOutcome::MissingUser,
        }
    }
}

impl Transport for GithubClient {
    async fn fetch_profile(&self, login: &str) -> Result<Profile, ProfileError> {
        log::debug!(target: LOG_TARGET, "querying profile for '{login}'");

        let variables = serde_json::json!({ "login": login });
        let user = match self.query_user(PROFILE_QUERY, variables).await {
            QueryOutcome::User(user) => user,
            QueryOutcome::MissingUser => return Err(ProfileError::NotFound(login.to_owned())),
            QueryOutcome::Failed(e) => return Err(ProfileError::Remote(e)),
        };

        let node: UserNode =
            serde_json::from_value(user).map_err(|e| ProfileError::Remote(app_err!("malformed profile response: {e}")))?;

        Ok(Profile {
            name: node.name.unwrap_or_else(|| node.login.clone()),
            login: node.login,
            avatar_url: node.avatar_url,
            created_at: node.created_at,
            followers: node.followers.total_count,
            following: node.following.total_count,
            public_repos: node.repositories.total_count,
        })
    }

    async fn fetch_daily_records(&self, login: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<DailyRecord> {
        log::debug!(
            target: LOG_TARGET,
            "querying daily records for '{login}' over {} .. {}",
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d"),
        );

        let variables = serde_json::json!({
            "login": login,
            "from": from.to_rfc3339(),
            "to": to.to_rfc3339(),
        });

        let user = match self.query_user(CALENDAR_QUERY, variables).await {
            QueryOutcome::User(user) => user,
            QueryOutcome::MissingUser => return Vec::new(),
            QueryOutcome::Failed(e) => {
                log::warn!(target: LOG_TARGET, "daily record query for '{login}' failed, treating as empty: {e}");
                return Vec::new();
            }
        };

        let Ok(node) = serde_json::from_value::<CalendarUserNode>(user) else {
            log::warn!(target: LOG_TARGET, "malformed contribution calendar for '{login}', treating as empty");
            return Vec::new();
        };

        node.contributions_collection
            .contribution_calendar
            .weeks
            .into_iter()
            .flat_map(|week| week.contribution_days)
            .map(|d| DailyRecord {
                date: d.date,
                count: d.contribution_count,
            })
            .collect()
    }

    async fn fetch_top_repos(&self, login: &str, limit: usize) -> Vec<RankedRepo> {
        log::debug!(target: LOG_TARGET, "querying top {limit} repositories for '{login}'");

        let variables = serde_json::json!({ "login": login, "first": limit });
        let user = match self.query_user(TOP_REPOS_QUERY, variables).await {
            QueryOutcome::User(user) => user,
            QueryOutcome::MissingUser => return Vec::new(),
            QueryOutcome::Failed(e) => {
                log::warn!(target: LOG_TARGET, "repository query for '{login}' failed, treating as empty: {e}");
                return Vec::new();
            }
        };

        let Ok(node) = serde_json::from_value::<RepoUserNode>(user) else {
            log::warn!(target: LOG_TARGET, "malformed repository response for '{login}', treating as empty");
            return Vec::new();
        };

        node.repositories
            .nodes
            .into_iter()
            .map(|r| RankedRepo {
                name: r.name,
                stars: r.stargazer_count,
                primary_language: r.primary_language.map(|l| l.name),
                updated_at: r.updated_at,
            })
            .collect()
    }
}
