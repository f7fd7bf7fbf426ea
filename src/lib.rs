//! Core library for the `commit-receipt` service.
//!
//! Collects a GitHub user's contribution history over the GraphQL API,
//! folds it into summary statistics, and broadcasts collection progress
//! to every observer currently watching that user.

/// Result type alias using `ohno::AppError` as the default error type.
pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod collect;
pub mod config;
pub mod events;
pub mod github;
pub mod history;
pub mod model;
pub mod registry;
pub mod stats;
