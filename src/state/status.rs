//! The process-wide status line.
//!
//! Producers (chiefly the confirmation watchers) append messages; the front
//! end shows them one at a time, oldest first, each for its own duration.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub message: String,
    pub duration: Duration,
    pub timestamp: DateTime<Utc>,
    // tie-breaker for messages pushed within the same clock tick
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    pending: Vec<StatusMessage>,
    showing: Option<(StatusMessage, DateTime<Utc>)>,
    next_seq: u64,
}

/// Append-only queue feeding the status line. Cheap to clone; all clones share
/// the same queue.
#[derive(Debug, Clone, Default)]
pub struct StatusQueue {
    inner: Arc<Mutex<Inner>>,
}

impl StatusQueue {
    pub fn push(&self, message: impl Into<String>, duration: Duration) {
        self.push_at(message, duration, Utc::now());
    }

    pub fn push_at(&self, message: impl Into<String>, duration: Duration, timestamp: DateTime<Utc>) {
        let message = message.into();
        tracing::info!("status: {}", message);

        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.pending.push(StatusMessage {
            message,
            duration,
            timestamp,
            seq,
        });
    }

    /// the message to display at `now`.
    ///
    /// keeps showing the current message until its duration has elapsed, then
    /// moves on to the oldest-timestamped pending one.
    pub fn current(&self, now: DateTime<Utc>) -> Option<StatusMessage> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        if let Some((message, shown_at)) = &inner.showing {
            let expired = (now - *shown_at)
                .to_std()
                .map(|elapsed| elapsed >= message.duration)
                .unwrap_or(false);
            if !expired {
                return Some(message.clone());
            }
        }

        let oldest = inner
            .pending
            .iter()
            .enumerate()
            .min_by_key(|(_, m)| (m.timestamp, m.seq))
            .map(|(i, _)| i);
        let next = oldest.map(|i| inner.pending.remove(i));
        inner.showing = next.map(|m| (m, now));
        inner.showing.as_ref().map(|(m, _)| m.clone())
    }

    /// number of messages not yet displayed
    pub fn pending(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pending
            .len()
    }

    /// every pending message, oldest first, without consuming them
    pub fn peek_all(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut pending = inner.pending.clone();
        pending.sort_by_key(|m| (m.timestamp, m.seq));
        pending.into_iter().map(|m| m.message).collect()
    }
}
