//! Agenda, session and ballot workflow.
//!
//! # Invariants
//! - `cast_vote` checks run in fixed order and short-circuit: agenda exists,
//!   session exists, session open, no prior vote, voter eligible.
//! - The eligibility call happens after every local check and before the
//!   write; it is never retried here.
//! - Store-level unique violations map to the same conflicts as the
//!   pre-checks, closing the check-then-insert window.

use crate::clock::Clock;
use crate::eligibility::EligibilityChecker;
use crate::error::{ConflictReason, ServiceResult, VotingError};
use crate::model::agenda::{Agenda, AgendaId};
use crate::model::session::VotingSession;
use crate::model::vote::{Vote, VoteChoice, VoterId};
use crate::repo::{StoreError, VotingStore};
use log::{debug, info, warn};
use std::sync::Arc;

/// Workflow engine over a [`VotingStore`].
pub struct VotingService<S: VotingStore> {
    store: S,
    eligibility: Arc<dyn EligibilityChecker>,
    clock: Arc<dyn Clock>,
}

impl<S: VotingStore> VotingService<S> {
    pub fn new(store: S, eligibility: Arc<dyn EligibilityChecker>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            eligibility,
            clock,
        }
    }

    /// Creates and persists an agenda.
    ///
    /// # Errors
    /// - `InvalidInput` when the title is blank.
    pub fn create_agenda(&self, title: &str) -> ServiceResult<Agenda> {
        let agenda = Agenda::new(title, self.clock.now_ms())?;
        self.store.save_agenda(&agenda)?;
        info!(
            "event=agenda_create module=service status=ok agenda_id={}",
            agenda.id
        );
        Ok(agenda)
    }

    /// Opens the single voting session of an agenda.
    ///
    /// `duration_minutes = None` uses the one-minute default.
    ///
    /// # Errors
    /// - `AgendaNotFound` when the agenda does not exist.
    /// - `Conflict(SessionAlreadyOpen)` when a session was already created.
    /// - `InvalidInput` when an explicit duration is not positive.
    pub fn open_session(
        &self,
        agenda_id: AgendaId,
        duration_minutes: Option<i64>,
    ) -> ServiceResult<VotingSession> {
        self.require_agenda(agenda_id)?;

        if self.store.find_session_by_agenda(agenda_id)?.is_some() {
            warn!(
                "event=session_open module=service status=conflict agenda_id={agenda_id} reason=already_open"
            );
            return Err(VotingError::conflict(
                agenda_id,
                ConflictReason::SessionAlreadyOpen,
            ));
        }

        let session = VotingSession::open(agenda_id, self.clock.now_ms(), duration_minutes)?;
        match self.store.save_session(&session) {
            Ok(()) => {}
            Err(StoreError::UniqueViolation(_)) => {
                warn!(
                    "event=session_open module=service status=conflict agenda_id={agenda_id} reason=concurrent_open"
                );
                return Err(VotingError::conflict(
                    agenda_id,
                    ConflictReason::SessionAlreadyOpen,
                ));
            }
            Err(err) => return Err(err.into()),
        }

        info!(
            "event=session_open module=service status=ok agenda_id={agenda_id} session_id={} closes_at={}",
            session.id, session.closes_at
        );
        Ok(session)
    }

    /// Records one ballot and returns the persisted vote.
    ///
    /// # Errors
    /// - `InvalidInput` when `voter_id` is malformed.
    /// - `AgendaNotFound` when the agenda does not exist.
    /// - `Conflict(NoSession | SessionClosed | DuplicateVote)`.
    /// - `Forbidden` when the checker says the voter may not vote.
    /// - `InvalidVoterIdentifier` / `ExternalServiceUnavailable` from the checker.
    pub fn cast_vote(
        &self,
        agenda_id: AgendaId,
        voter_id: &str,
        choice: VoteChoice,
    ) -> ServiceResult<Vote> {
        let voter_id = VoterId::parse(voter_id)?;
        debug!(
            "event=vote_cast module=service status=start agenda_id={agenda_id} voter={voter_id} choice={}",
            choice.as_str()
        );

        self.require_agenda(agenda_id)?;

        let session = self
            .store
            .find_session_by_agenda(agenda_id)?
            .ok_or_else(|| self.rejected(agenda_id, &voter_id, ConflictReason::NoSession))?;

        let now = self.clock.now_ms();
        if !session.is_open(now) {
            return Err(self.rejected(agenda_id, &voter_id, ConflictReason::SessionClosed));
        }

        if self.store.find_vote(agenda_id, &voter_id)?.is_some() {
            return Err(self.rejected(agenda_id, &voter_id, ConflictReason::DuplicateVote));
        }

        if !self.eligibility.is_eligible(&voter_id)? {
            warn!(
                "event=vote_cast module=service status=forbidden agenda_id={agenda_id} voter={voter_id}"
            );
            return Err(VotingError::Forbidden(voter_id.masked()));
        }

        let vote = Vote::new(agenda_id, voter_id, choice, now);
        match self.store.save_vote(&vote) {
            Ok(()) => {}
            Err(StoreError::UniqueViolation(_)) => {
                return Err(self.rejected(agenda_id, &vote.voter_id, ConflictReason::DuplicateVote));
            }
            Err(err) => return Err(err.into()),
        }

        info!(
            "event=vote_cast module=service status=ok agenda_id={agenda_id} voter={} vote_id={}",
            vote.voter_id, vote.id
        );
        Ok(vote)
    }

    /// Looks up an agenda without side effects.
    pub fn get_agenda(&self, agenda_id: AgendaId) -> ServiceResult<Option<Agenda>> {
        Ok(self.store.find_agenda(agenda_id)?)
    }

    /// Looks up the session of an agenda without side effects.
    pub fn get_session(&self, agenda_id: AgendaId) -> ServiceResult<Option<VotingSession>> {
        Ok(self.store.find_session_by_agenda(agenda_id)?)
    }

    fn require_agenda(&self, agenda_id: AgendaId) -> ServiceResult<Agenda> {
        self.store.find_agenda(agenda_id)?.ok_or_else(|| {
            warn!("event=agenda_lookup module=service status=not_found agenda_id={agenda_id}");
            VotingError::AgendaNotFound(agenda_id)
        })
    }

    fn rejected(&self, agenda_id: AgendaId, voter_id: &VoterId, reason: ConflictReason) -> VotingError {
        warn!(
            "event=vote_cast module=service status=conflict agenda_id={agenda_id} voter={voter_id} reason={}",
            reason.as_str()
        );
        VotingError::conflict(agenda_id, reason)
    }
}
