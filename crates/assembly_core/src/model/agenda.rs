//! Agenda record.

use crate::model::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type AgendaId = Uuid;

/// A topic submitted to the assembly for a yes/no decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agenda {
    pub id: AgendaId,
    pub title: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Agenda {
    /// Creates an agenda with a fresh id.
    ///
    /// Rejects titles that are empty or whitespace-only. The title is kept
    /// exactly as given otherwise.
    pub fn new(title: impl Into<String>, created_at: i64) -> Result<Self, ValidationError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ValidationError::BlankTitle);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            title,
            created_at,
        })
    }
}
