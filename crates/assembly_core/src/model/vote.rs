//! Vote record, voter identifier and vote choice.
//!
//! # Invariants
//! - At most one vote exists per `(agenda_id, voter_id)`.
//! - `VoterId` never renders its full value through `Display`, `Debug`
//!   or serde; only storage adapters read it via `as_str()`.

use crate::model::agenda::AgendaId;
use crate::model::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

pub type VoteId = Uuid;

static VOTER_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{11}$").expect("valid voter id regex"));

const MASK_PREFIX: &str = "***";
const MASK_VISIBLE_SUFFIX: usize = 4;

/// Masks an identifier down to its last four characters.
pub fn mask_identifier(value: &str) -> String {
    let count = value.chars().count();
    if count < MASK_VISIBLE_SUFFIX {
        return MASK_PREFIX.to_string();
    }
    let suffix: String = value.chars().skip(count - MASK_VISIBLE_SUFFIX).collect();
    format!("{MASK_PREFIX}{suffix}")
}

/// Fixed-format external voter identifier (11 ASCII digits).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct VoterId(String);

impl VoterId {
    /// Parses and validates a raw identifier. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if !VOTER_ID_RE.is_match(trimmed) {
            return Err(ValidationError::MalformedVoterId(mask_identifier(trimmed)));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Full identifier; for storage and the eligibility call only.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn masked(&self) -> String {
        mask_identifier(&self.0)
    }
}

impl Display for VoterId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.masked())
    }
}

impl Debug for VoterId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "VoterId({})", self.masked())
    }
}

impl Serialize for VoterId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.masked())
    }
}

/// Binary ballot choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    For,
    Against,
}

impl VoteChoice {
    /// Stable storage value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::For => "for",
            Self::Against => "against",
        }
    }
}

impl FromStr for VoteChoice {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "for" | "yes" | "sim" => Ok(Self::For),
            "against" | "no" | "nao" => Ok(Self::Against),
            other => Err(ValidationError::UnknownChoice(other.to_string())),
        }
    }
}

/// One voter's ballot on one agenda.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vote {
    pub id: VoteId,
    pub agenda_id: AgendaId,
    pub voter_id: VoterId,
    pub choice: VoteChoice,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Vote {
    pub fn new(agenda_id: AgendaId, voter_id: VoterId, choice: VoteChoice, created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            agenda_id,
            voter_id,
            choice,
            created_at,
        }
    }
}
