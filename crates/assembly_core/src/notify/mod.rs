//! Best-effort publication of closed tallies.
//!
//! # Responsibility
//! - Hold published tallies in a bounded, lossy, in-memory FIFO buffer.
//! - Publish each agenda's closed tally at most once per process lifetime.
//!
//! # Invariants
//! - Publication failures never reach the tally caller.
//! - The "already notified" set is process-local; a restart forgets it.

mod notifier;
mod queue;

use crate::model::tally::TallyResult;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use notifier::{NotifyOutcome, ResultNotifier};
pub use queue::{NotificationQueue, DEFAULT_QUEUE_CAPACITY};

/// A tally as delivered to the notification buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedNotification {
    pub result: TallyResult,
    /// Unix epoch milliseconds.
    pub published_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    Unavailable(String),
}

impl Display for PublishError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(details) => write!(f, "publisher unavailable: {details}"),
        }
    }
}

impl Error for PublishError {}

/// Downstream sink for published tallies.
pub trait ResultPublisher: Send + Sync {
    fn publish(&self, notification: PublishedNotification) -> Result<(), PublishError>;
}
