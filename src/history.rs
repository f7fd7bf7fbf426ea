//! Chunked retrieval of the full activity history.
//!
//! The remote API bounds one daily-record query to a single year, so a
//! multi-year span is partitioned into consecutive sub-ranges fetched
//! strictly sequentially. A failed sub-range contributes zero records and
//! the walk continues; partial remote outages silently understate the final
//! totals instead of aborting the run.

use crate::events::{Event, EventSink};
use crate::github::Transport;
use crate::model::DailyRecord;
use chrono::{DateTime, Duration, Utc};

const LOG_TARGET: &str = "   history";

/// Maximum span of one daily-record query, imposed by the remote API.
const MAX_CHUNK_DAYS: i64 = 365;

/// Progress band allocated to the full-history phase.
pub const HISTORY_PROGRESS_LOW: u8 = 60;
pub const HISTORY_PROGRESS_HIGH: u8 = 80;

/// Outcome of a full-history fetch.
#[derive(Debug)]
pub enum HistoryFetch {
    /// All chunks were walked; failed chunks contributed zero records.
    Complete(Vec<DailyRecord>),

    /// The run was abandoned between chunks; nothing was emitted after the
    /// last completed chunk.
    Abandoned,
}

/// Partition `[from, to)` into consecutive sub-ranges of at most one year,
/// the last possibly shorter.
#[must_use]
pub fn chunk_spans(from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut spans = Vec::new();
    let mut start = from;
    while start < to {
        let end = (start + Duration::days(MAX_CHUNK_DAYS)).min(to);
        spans.push((start, end));
        start = end;
    }

    spans
}

/// Linear interpolation into the history phase band by chunk position.
#[expect(clippy::cast_possible_truncation, reason = "value is within 0..=20 by construction")]
#[expect(clippy::cast_sign_loss, reason = "value is non-negative by construction")]
#[expect(clippy::cast_precision_loss, reason = "chunk counts are tiny")]
fn chunk_progress(index: usize, total: usize) -> u8 {
    let band = f64::from(HISTORY_PROGRESS_HIGH - HISTORY_PROGRESS_LOW);
    let fraction = index as f64 / total as f64;
    HISTORY_PROGRESS_LOW + (fraction * band) as u8
}

/// Retrieve the daily records for `[from, to)`, one chunk at a time, in
/// chronological order of issuance.
///
/// A `FetchingChunk` event is emitted before each chunk with a progress value
/// interpolated into the phase band. `abandoned` is polled between chunks;
/// when it reports true the walk stops early and the partial result is
/// discarded.
pub async fn fetch_full_history<T: Transport>(
    transport: &T,
    login: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    sink: &dyn EventSink,
    abandoned: &(dyn Fn() -> bool + Sync),
) -> HistoryFetch {
    let spans = chunk_spans(from, to);
    let total = spans.len();

    sink.emit(Event::fetching("collecting activity over the full history", HISTORY_PROGRESS_LOW));
    log::debug!(target: LOG_TARGET, "fetching history for '{login}' in {total} chunk(s)");

    let mut records = Vec::new();
    for (index, (start, end)) in spans.into_iter().enumerate() {
        if abandoned() {
            log::info!(target: LOG_TARGET, "run for '{login}' abandoned after {index} of {total} chunk(s)");
            return HistoryFetch::Abandoned;
        }

        let chunk = index + 1;
        sink.emit(Event::fetching(
            format!("collecting activity data ({chunk}/{total})"),
            chunk_progress(chunk, total),
        ));

        // Empty on failure by the transport contract; the walk continues.
        let mut chunk_records = transport.fetch_daily_records(login, start, end).await;
        if chunk_records.is_empty() {
            log::debug!(target: LOG_TARGET, "chunk {chunk}/{total} for '{login}' returned no records");
        }
        records.append(&mut chunk_records);
    }

    HistoryFetch::Complete(records)
}
