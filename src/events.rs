//! Progress events emitted while a collection run executes.

use crate::model::UserStats;
use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Serialize};

/// What a single event describes, with the payload its kind requires.
///
/// Only the terminal success kind carries the aggregated result; a failure's
/// human-readable reason travels in the event message.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// A collection run has started.
    Started,

    /// A remote query for one chunk or phase is being issued.
    FetchingChunk,

    /// Raw records are being folded into statistics.
    Processing,

    /// The run finished; carries the aggregated result.
    Completed(Box<UserStats>),

    /// The run aborted on a fatal error.
    Failed,
}

impl EventKind {
    /// The wire name for this kind.
    #[must_use]
    pub const fn wire_name(&self) -> &'static str {
        match self {
            Self::Started => "start",
            Self::FetchingChunk => "api_call",
            Self::Processing => "processing",
            Self::Completed(_) => "complete",
            Self::Failed => "error",
        }
    }
}

/// An immutable record of one state transition of a collection run.
///
/// The timestamp is captured at construction, not at publish, so it reflects
/// when the underlying work finished rather than when an observer saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub message: String,
    pub progress: u8,
    pub emitted_at: DateTime<Utc>,
}

impl Event {
    /// Create an event, capturing the current time.
    #[must_use]
    pub fn new(kind: EventKind, message: impl Into<String>, progress: u8) -> Self {
        Self {
            kind,
            message: message.into(),
            progress,
            emitted_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn started(message: impl Into<String>) -> Self {
        Self::new(EventKind::Started, message, 0)
    }

    #[must_use]
    pub fn fetching(message: impl Into<String>, progress: u8) -> Self {
        Self::new(EventKind::FetchingChunk, message, progress)
    }

    #[must_use]
    pub fn processing(message: impl Into<String>, progress: u8) -> Self {
        Self::new(EventKind::Processing, message, progress)
    }

    #[must_use]
    pub fn completed(message: impl Into<String>, stats: UserStats) -> Self {
        Self::new(EventKind::Completed(Box::new(stats)), message, 100)
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(EventKind::Failed, message, 0)
    }

    /// Returns `true` if this event terminates a run.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self.kind, EventKind::Completed(_) | EventKind::Failed)
    }
}

/// A destination for progress events.
///
/// Emitting must never block: implementations forward to bounded channels or
/// discard, so a slow observer cannot stall a collection run.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

/// Sink that discards everything, for callers that do not observe progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: Event) {}
}

/// Flat JSON envelope delivered to observers:
/// `{ type, message, progress, data, timestamp }`.
#[derive(Debug, Serialize, Deserialize)]
struct WireEvent {
    #[serde(rename = "type")]
    kind: String,
    message: String,
    progress: u8,
    data: serde_json::Value,
    timestamp: DateTime<Utc>,
}

impl Serialize for Event {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let data = match &self.kind {
            EventKind::Completed(stats) => serde_json::to_value(stats).map_err(serde::ser::Error::custom)?,
            _ => serde_json::Value::Object(serde_json::Map::new()),
        };

        let wire = WireEvent {
            kind: self.kind.wire_name().to_owned(),
            message: self.message.clone(),
            progress: self.progress,
            data,
            timestamp: self.emitted_at,
        };

        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = WireEvent::deserialize(deserializer)?;

        // `data` is a legacy alias: older streams carried a duplicate
        // `complete`/`data` pair, collapsed here into a single terminal event.
        let kind = match wire.kind.as_str() {
            "start" => EventKind::Started,
            "api_call" => EventKind::FetchingChunk,
            "processing" => EventKind::Processing,
            "complete" | "data" => {
                let stats: UserStats = serde_json::from_value(wire.data).map_err(D::Error::custom)?;
                EventKind::Completed(Box::new(stats))
            }
            "error" => EventKind::Failed,
            other => return Err(D::Error::custom(format!("unknown event type '{other}'"))),
        };

        Ok(Self {
            kind,
            message: wire.message,
            progress: wire.progress,
            emitted_at: wire.timestamp,
        })
    }
}
