//! At-most-once publication of closed tallies per agenda.

use crate::clock::Clock;
use crate::model::agenda::AgendaId;
use crate::model::tally::TallyResult;
use crate::notify::{PublishedNotification, ResultPublisher};
use log::{error, info};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Published,
    AlreadyPublished,
    /// The tally was computed while voting was still open.
    SessionOpen,
    /// The publisher failed; the agenda stays eligible for a later attempt.
    Failed,
}

/// Publishes closed tallies into a [`ResultPublisher`] once per agenda.
pub struct ResultNotifier {
    publisher: Arc<dyn ResultPublisher>,
    clock: Arc<dyn Clock>,
    notified: Mutex<HashSet<AgendaId>>,
}

impl ResultNotifier {
    pub fn new(publisher: Arc<dyn ResultPublisher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            publisher,
            clock,
            notified: Mutex::new(HashSet::new()),
        }
    }

    /// Publishes `result` if it is closed and its agenda was not published yet.
    ///
    /// Never fails; publisher errors are logged and reported as `Failed`.
    /// The agenda is claimed in the marker set before publishing, so a
    /// concurrent caller for the same agenda sees `AlreadyPublished`. The
    /// marker lock is not held while the publisher runs; a failed publish
    /// releases the claim.
    pub fn notify(&self, result: &TallyResult) -> NotifyOutcome {
        if !result.is_closed() {
            return NotifyOutcome::SessionOpen;
        }
        if !self.markers().insert(result.agenda_id) {
            return NotifyOutcome::AlreadyPublished;
        }

        let notification = PublishedNotification {
            result: result.clone(),
            published_at: self.clock.now_ms(),
        };
        match self.publisher.publish(notification) {
            Ok(()) => {
                info!(
                    "event=result_publish module=notify status=ok agenda_id={} outcome={:?} for={} against={}",
                    result.agenda_id, result.outcome, result.for_count, result.against_count
                );
                NotifyOutcome::Published
            }
            Err(err) => {
                self.markers().remove(&result.agenda_id);
                error!(
                    "event=result_publish module=notify status=error agenda_id={} error={err}",
                    result.agenda_id
                );
                NotifyOutcome::Failed
            }
        }
    }

    /// True once a publish for `agenda_id` succeeded or is in flight.
    pub fn was_notified(&self, agenda_id: AgendaId) -> bool {
        self.markers().contains(&agenda_id)
    }

    /// Forgets every published agenda so tallies may be republished.
    pub fn reset(&self) {
        self.markers().clear();
    }

    fn markers(&self) -> MutexGuard<'_, HashSet<AgendaId>> {
        self.notified.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
