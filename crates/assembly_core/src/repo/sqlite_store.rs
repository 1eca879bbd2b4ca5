//! SQLite implementation of the voting store ports.
//!
//! # Invariants
//! - One connection is shared behind a mutex; every port call holds the lock
//!   for the duration of its statement.
//! - Read paths reject malformed persisted rows instead of masking them.

use crate::db::DbResult;
use crate::model::agenda::{Agenda, AgendaId};
use crate::model::session::VotingSession;
use crate::model::vote::{Vote, VoteChoice, VoterId};
use crate::repo::{
    AgendaStore, SessionStore, StoreError, StoreResult, VoteStore, SESSION_AGENDA_KEY,
    VOTE_AGENDA_VOTER_KEY,
};
use rusqlite::{params, Connection, ErrorCode, Row};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

const VOTE_SELECT_SQL: &str = "SELECT id, agenda_id, voter_id, choice, created_at FROM votes";

/// Thread-safe store over one SQLite connection.
#[derive(Clone)]
pub struct SqliteVotingStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteVotingStore {
    /// Wraps a connection that already has migrations applied.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Opens a migrated in-memory database.
    pub fn in_memory() -> DbResult<Self> {
        crate::db::open_db_in_memory().map(Self::new)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl AgendaStore for SqliteVotingStore {
    fn save_agenda(&self, agenda: &Agenda) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO agendas (id, title, created_at) VALUES (?1, ?2, ?3);",
            params![agenda.id.to_string(), agenda.title.as_str(), agenda.created_at],
        )?;
        Ok(())
    }

    fn find_agenda(&self, id: AgendaId) -> StoreResult<Option<Agenda>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id, title, created_at FROM agendas WHERE id = ?1;")?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(Agenda {
                id: parse_uuid(row, "id", "agendas.id")?,
                title: row.get("title")?,
                created_at: row.get("created_at")?,
            }));
        }
        Ok(None)
    }
}

impl SessionStore for SqliteVotingStore {
    fn save_session(&self, session: &VotingSession) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO voting_sessions (id, agenda_id, opened_at, closes_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                session.id.to_string(),
                session.agenda_id.to_string(),
                session.opened_at,
                session.closes_at,
            ],
        )
        .map_err(|err| map_unique_violation(err, SESSION_AGENDA_KEY))?;
        Ok(())
    }

    fn find_session_by_agenda(&self, agenda_id: AgendaId) -> StoreResult<Option<VotingSession>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, agenda_id, opened_at, closes_at
             FROM voting_sessions
             WHERE agenda_id = ?1;",
        )?;
        let mut rows = stmt.query([agenda_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(VotingSession {
                id: parse_uuid(row, "id", "voting_sessions.id")?,
                agenda_id: parse_uuid(row, "agenda_id", "voting_sessions.agenda_id")?,
                opened_at: row.get("opened_at")?,
                closes_at: row.get("closes_at")?,
            }));
        }
        Ok(None)
    }
}

impl VoteStore for SqliteVotingStore {
    fn save_vote(&self, vote: &Vote) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO votes (id, agenda_id, voter_id, choice, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                vote.id.to_string(),
                vote.agenda_id.to_string(),
                vote.voter_id.as_str(),
                vote.choice.as_str(),
                vote.created_at,
            ],
        )
        .map_err(|err| map_unique_violation(err, VOTE_AGENDA_VOTER_KEY))?;
        Ok(())
    }

    fn find_vote(&self, agenda_id: AgendaId, voter_id: &VoterId) -> StoreResult<Option<Vote>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare(&format!("{VOTE_SELECT_SQL} WHERE agenda_id = ?1 AND voter_id = ?2;"))?;
        let mut rows = stmt.query(params![agenda_id.to_string(), voter_id.as_str()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_vote_row(row)?));
        }
        Ok(None)
    }

    fn list_votes_by_agenda(&self, agenda_id: AgendaId) -> StoreResult<Vec<Vote>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{VOTE_SELECT_SQL} WHERE agenda_id = ?1 ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([agenda_id.to_string()])?;
        let mut votes = Vec::new();
        while let Some(row) = rows.next()? {
            votes.push(parse_vote_row(row)?);
        }
        Ok(votes)
    }
}

fn map_unique_violation(err: rusqlite::Error, key: &'static str) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            StoreError::UniqueViolation(key)
        }
        _ => StoreError::from(err),
    }
}

fn parse_vote_row(row: &Row<'_>) -> StoreResult<Vote> {
    let voter_text: String = row.get("voter_id")?;
    let voter_id = VoterId::parse(&voter_text).map_err(|err| {
        StoreError::InvalidData(format!("invalid votes.voter_id: {err}"))
    })?;

    let choice_text: String = row.get("choice")?;
    let choice = parse_choice(&choice_text).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid vote choice `{choice_text}` in votes.choice"))
    })?;

    Ok(Vote {
        id: parse_uuid(row, "id", "votes.id")?,
        agenda_id: parse_uuid(row, "agenda_id", "votes.agenda_id")?,
        voter_id,
        choice,
        created_at: row.get("created_at")?,
    })
}

fn parse_choice(value: &str) -> Option<VoteChoice> {
    match value {
        "for" => Some(VoteChoice::For),
        "against" => Some(VoteChoice::Against),
        _ => None,
    }
}

fn parse_uuid(row: &Row<'_>, column: &str, label: &str) -> StoreResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text)
        .map_err(|_| StoreError::InvalidData(format!("invalid uuid value `{text}` in {label}")))
}
