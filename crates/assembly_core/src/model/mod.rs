//! Domain model for agendas, voting sessions, votes and tallies.
//!
//! # Responsibility
//! - Define the records shared by services and storage adapters.
//! - Hold pure domain rules (session openness, tally outcome, id masking).
//!
//! # Invariants
//! - Every record is identified by a stable UUID assigned at creation.
//! - Records are immutable once persisted; session state is derived from time.

pub mod agenda;
pub mod session;
pub mod tally;
pub mod vote;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Domain-level validation failures raised while building records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    BlankTitle,
    NonPositiveDuration(i64),
    DurationOverflow(i64),
    /// Carries the masked identifier only.
    MalformedVoterId(String),
    UnknownChoice(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "agenda title must not be blank"),
            Self::NonPositiveDuration(minutes) => {
                write!(f, "session duration must be positive, got {minutes} minute(s)")
            }
            Self::DurationOverflow(minutes) => {
                write!(f, "session duration of {minutes} minute(s) is out of range")
            }
            Self::MalformedVoterId(masked) => write!(
                f,
                "voter identifier {masked} must contain exactly 11 digits"
            ),
            Self::UnknownChoice(value) => {
                write!(f, "unknown vote choice `{value}`; expected for|against")
            }
        }
    }
}

impl Error for ValidationError {}
