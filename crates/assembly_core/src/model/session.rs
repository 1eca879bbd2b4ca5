//! Voting session record and time-derived state.
//!
//! # Invariants
//! - `closes_at = opened_at + duration`, with duration strictly positive.
//! - A session is open iff `now < closes_at`; the boundary instant is closed.
//! - There is no stored status field; every read derives it from `now`.

use crate::clock::MINUTE_MS;
use crate::model::agenda::AgendaId;
use crate::model::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type SessionId = Uuid;

/// Duration applied when the caller does not give one.
pub const DEFAULT_SESSION_MINUTES: i64 = 1;

/// Session state at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Closed,
}

/// Time window during which votes for one agenda are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingSession {
    pub id: SessionId,
    pub agenda_id: AgendaId,
    /// Unix epoch milliseconds.
    pub opened_at: i64,
    /// Unix epoch milliseconds, exclusive end of the window.
    pub closes_at: i64,
}

impl VotingSession {
    /// Opens a session at `opened_at` lasting `duration_minutes`.
    ///
    /// `None` falls back to [`DEFAULT_SESSION_MINUTES`].
    pub fn open(
        agenda_id: AgendaId,
        opened_at: i64,
        duration_minutes: Option<i64>,
    ) -> Result<Self, ValidationError> {
        let closes_at = closing_time(opened_at, duration_minutes)?;
        Ok(Self {
            id: Uuid::new_v4(),
            agenda_id,
            opened_at,
            closes_at,
        })
    }

    pub fn is_open(&self, now_ms: i64) -> bool {
        now_ms < self.closes_at
    }

    pub fn status(&self, now_ms: i64) -> SessionStatus {
        if self.is_open(now_ms) {
            SessionStatus::Open
        } else {
            SessionStatus::Closed
        }
    }
}

/// Computes the exclusive closing instant for a session.
pub fn closing_time(opened_at: i64, duration_minutes: Option<i64>) -> Result<i64, ValidationError> {
    let minutes = duration_minutes.unwrap_or(DEFAULT_SESSION_MINUTES);
    if minutes <= 0 {
        return Err(ValidationError::NonPositiveDuration(minutes));
    }
    minutes
        .checked_mul(MINUTE_MS)
        .and_then(|span| opened_at.checked_add(span))
        .ok_or(ValidationError::DurationOverflow(minutes))
}

/// Status of an agenda given its (possibly absent) session.
///
/// An agenda that never had a session reports `Closed`.
pub fn status_of(session: Option<&VotingSession>, now_ms: i64) -> SessionStatus {
    session.map_or(SessionStatus::Closed, |session| session.status(now_ms))
}
