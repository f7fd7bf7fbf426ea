//! Collect a GitHub user's contribution history and print a receipt-style
//! summary.
//!
//! The library drives the real service; this binary runs one synchronous
//! collection for quick inspection:
//!
//! ```bash
//! GITHUB_TOKEN=ghp_xxx commit-receipt alice
//! commit-receipt alice --json
//! ```

use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, ValueEnum};
use commit_receipt::Result;
use commit_receipt::collect::Collector;
use commit_receipt::config::Config;
use commit_receipt::github::GithubClient;
use commit_receipt::model::UserStats;
use commit_receipt::registry::Registry;
use ohno::IntoAppError;
use std::path::PathBuf;
use std::sync::Arc;

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    /// No logging output
    None,
    /// Only error messages
    Error,
    /// Warning and error messages
    Warn,
    /// Info, warning, and error messages
    Info,
    /// Debug and above messages
    Debug,
    /// All messages including trace
    Trace,
}

#[derive(Parser, Debug)]
#[command(name = "commit-receipt", version, about)]
#[command(styles = CLAP_STYLES)]
struct Args {
    /// GitHub login to collect
    login: String,

    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN")]
    github_token: Option<String>,

    /// Path to configuration file
    #[arg(long, short = 'c', value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the aggregated result as JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    log_level: LogLevel,
}

/// Initialize logger based on log level
fn init_logging(log_level: LogLevel) {
    if log_level == LogLevel::None {
        return;
    }

    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .init();
}

fn print_summary(stats: &UserStats) {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Contribution Receipt — {}", stats.profile.login);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Name:           {}", stats.profile.name);
    println!("  Member since:   {}", stats.profile.created_at.format("%Y-%m-%d"));
    println!("  Public repos:   {}", stats.profile.public_repos);
    println!("  Followers:      {}", stats.profile.followers);
    println!();
    println!("  Total contributions:  {}", stats.total_count);
    println!("  Active days:          {}", stats.active_days);
    println!("  Longest streak:       {} day(s)", stats.longest_streak);
    if stats.best_day.date.is_empty() {
        println!("  Best day:             (no activity)");
    } else {
        println!("  Best day:             {} ({})", stats.best_day.date, stats.best_day.count);
    }

    if !stats.top_repos.is_empty() {
        println!();
        println!("  Top repositories:");
        for repo in &stats.top_repos {
            let language = repo.primary_language.as_deref().unwrap_or("-");
            println!("    {:>6} ★  {}  [{}]", repo.stars, repo.name, language);
        }
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level);

    let mut config = Config::load(args.config.as_deref())?;
    if args.github_token.is_some() {
        config.github_token = args.github_token;
    }

    let transport = GithubClient::new(config.github_token.as_deref(), &config.graphql_url)?;
    let collector = Collector::new(Arc::new(transport), Registry::new(), &config);

    let stats = collector
        .collect(&args.login)
        .await
        .into_app_err_with(|| format!("could not collect statistics for '{}'", args.login))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_summary(&stats);
    }

    Ok(())
}
