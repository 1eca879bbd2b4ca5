//! Persistence ports consumed by the voting services, plus the SQLite adapter.
//!
//! # Responsibility
//! - Define synchronous, transactional store contracts per record type.
//! - Report natural-key collisions as `StoreError::UniqueViolation` so callers
//!   can treat the storage constraint as the backstop of their pre-checks.
//!
//! # Invariants
//! - At most one session per agenda and one vote per `(agenda, voter)` are
//!   enforced by the store itself, not only by callers.

pub mod sqlite_store;

use crate::db::DbError;
use crate::model::agenda::{Agenda, AgendaId};
use crate::model::session::VotingSession;
use crate::model::vote::{Vote, VoterId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use sqlite_store::SqliteVotingStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Natural key named by [`StoreError::UniqueViolation`] for sessions.
pub const SESSION_AGENDA_KEY: &str = "voting_sessions.agenda_id";
/// Natural key named by [`StoreError::UniqueViolation`] for votes.
pub const VOTE_AGENDA_VOTER_KEY: &str = "votes.agenda_id+voter_id";

#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// An insert collided with an existing row on the named natural key.
    UniqueViolation(&'static str),
    InvalidData(String),
    LockPoisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UniqueViolation(key) => write!(f, "unique constraint violated on {key}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::LockPoisoned => write!(f, "store connection lock poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub trait AgendaStore {
    fn save_agenda(&self, agenda: &Agenda) -> StoreResult<()>;
    fn find_agenda(&self, id: AgendaId) -> StoreResult<Option<Agenda>>;
}

pub trait SessionStore {
    /// Inserts a session; fails with `UniqueViolation` if the agenda has one.
    fn save_session(&self, session: &VotingSession) -> StoreResult<()>;
    fn find_session_by_agenda(&self, agenda_id: AgendaId) -> StoreResult<Option<VotingSession>>;
}

pub trait VoteStore {
    /// Inserts a vote; fails with `UniqueViolation` if the voter already voted.
    fn save_vote(&self, vote: &Vote) -> StoreResult<()>;
    fn find_vote(&self, agenda_id: AgendaId, voter_id: &VoterId) -> StoreResult<Option<Vote>>;
    /// All votes for an agenda in cast order.
    fn list_votes_by_agenda(&self, agenda_id: AgendaId) -> StoreResult<Vec<Vote>>;
}

/// Everything the voting services need from persistence.
pub trait VotingStore: AgendaStore + SessionStore + VoteStore {}

impl<T: AgendaStore + SessionStore + VoteStore> VotingStore for T {}
