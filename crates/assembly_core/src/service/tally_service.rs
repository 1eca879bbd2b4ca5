//! Tally computation and closed-result publication.
//!
//! # Invariants
//! - `evaluate` is a pure read of stored state plus `now`.
//! - `compute` returns the same result as `evaluate`; notification outcome
//!   never changes or fails it.

use crate::clock::Clock;
use crate::error::{ServiceResult, VotingError};
use crate::model::agenda::AgendaId;
use crate::model::session::status_of;
use crate::model::tally::{tally_votes, TallyResult};
use crate::notify::{NotifyOutcome, ResultNotifier};
use crate::repo::VotingStore;
use log::{debug, info};
use std::sync::Arc;

pub struct TallyService<S: VotingStore> {
    store: S,
    clock: Arc<dyn Clock>,
    notifier: Option<Arc<ResultNotifier>>,
}

impl<S: VotingStore> TallyService<S> {
    /// `notifier = None` disables publication entirely.
    pub fn new(store: S, clock: Arc<dyn Clock>, notifier: Option<Arc<ResultNotifier>>) -> Self {
        Self {
            store,
            clock,
            notifier,
        }
    }

    /// Computes the tally and publishes it once if the session is closed.
    ///
    /// # Errors
    /// - `AgendaNotFound` when the agenda does not exist.
    pub fn compute(&self, agenda_id: AgendaId) -> ServiceResult<TallyResult> {
        let result = self.evaluate(agenda_id)?;
        if let Some(notifier) = &self.notifier {
            let outcome = notifier.notify(&result);
            if outcome != NotifyOutcome::Published {
                debug!(
                    "event=tally_notify module=service status=skipped agenda_id={agenda_id} outcome={outcome:?}"
                );
            }
        }
        Ok(result)
    }

    /// Computes the tally without any publication side effect.
    ///
    /// An agenda that never had a session reports `Closed` with zero votes.
    pub fn evaluate(&self, agenda_id: AgendaId) -> ServiceResult<TallyResult> {
        if self.store.find_agenda(agenda_id)?.is_none() {
            return Err(VotingError::AgendaNotFound(agenda_id));
        }

        let session = self.store.find_session_by_agenda(agenda_id)?;
        let status = status_of(session.as_ref(), self.clock.now_ms());
        let votes = self.store.list_votes_by_agenda(agenda_id)?;
        let result = tally_votes(agenda_id, status, &votes);

        info!(
            "event=tally_compute module=service status=ok agenda_id={agenda_id} session={:?} for={} against={} total={} outcome={:?}",
            result.session_status, result.for_count, result.against_count, result.total, result.outcome
        );
        Ok(result)
    }
}
