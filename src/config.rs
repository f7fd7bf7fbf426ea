//! Service configuration.

use crate::github::GITHUB_GRAPHQL_URL;
use ohno::IntoAppError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Days of daily activity included in the recent window of the result.
const DEFAULT_RECENT_WINDOW_DAYS: u32 = 180;

/// Repositories requested from the ranked-repository query.
const DEFAULT_TOP_REPO_LIMIT: usize = 10;

/// Tunable settings for the collection pipeline. All fields are optional in
/// the configuration file; unspecified fields use the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// GitHub personal access token. Falls back to the `GITHUB_TOKEN`
    /// environment variable when absent.
    pub github_token: Option<String>,

    /// GraphQL endpoint to query.
    pub graphql_url: String,

    pub recent_window_days: u32,
    pub top_repo_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_token: None,
            graphql_url: GITHUB_GRAPHQL_URL.to_owned(),
            recent_window_days: DEFAULT_RECENT_WINDOW_DAYS,
            top_repo_limit: DEFAULT_TOP_REPO_LIMIT,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, or defaults when no path is
    /// given. A missing token is filled from the environment.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = fs::read_to_string(path).into_app_err_with(|| format!("reading configuration from '{}'", path.display()))?;
                toml::from_str(&text).into_app_err_with(|| format!("parsing configuration from '{}'", path.display()))?
            }
            None => Self::default(),
        };

        if config.github_token.is_none() {
            config.github_token = std::env::var("GITHUB_TOKEN").ok();
        }

        Ok(config)
    }
}
