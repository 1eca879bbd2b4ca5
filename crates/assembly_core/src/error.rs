//! Service error taxonomy surfaced to callers of the voting core.
//!
//! # Invariants
//! - Each variant maps to one stable `code()` so callers can branch on kind.
//! - Messages carry masked voter identifiers only.

use crate::eligibility::EligibilityError;
use crate::model::agenda::AgendaId;
use crate::model::ValidationError;
use crate::repo::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, VotingError>;

/// Why a request collided with the current agenda state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    SessionAlreadyOpen,
    NoSession,
    SessionClosed,
    DuplicateVote,
}

impl ConflictReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SessionAlreadyOpen => "session already open",
            Self::NoSession => "no session",
            Self::SessionClosed => "session closed",
            Self::DuplicateVote => "duplicate vote",
        }
    }
}

#[derive(Debug)]
pub enum VotingError {
    InvalidInput(ValidationError),
    AgendaNotFound(AgendaId),
    Conflict {
        agenda_id: AgendaId,
        reason: ConflictReason,
    },
    /// The checker answered "not eligible"; carries the masked voter id.
    Forbidden(String),
    ExternalServiceUnavailable(String),
    /// The checker does not recognize the identifier; carries the masked id.
    InvalidVoterIdentifier(String),
    Store(StoreError),
}

impl VotingError {
    /// Stable, caller-facing error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_REQUEST",
            Self::AgendaNotFound(_) => "NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::ExternalServiceUnavailable(_) => "EXTERNAL_SERVICE_UNAVAILABLE",
            Self::InvalidVoterIdentifier(_) => "INVALID_VOTER_ID",
            Self::Store(_) => "INTERNAL_ERROR",
        }
    }

    pub fn conflict_reason(&self) -> Option<ConflictReason> {
        match self {
            Self::Conflict { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    pub(crate) fn conflict(agenda_id: AgendaId, reason: ConflictReason) -> Self {
        Self::Conflict { agenda_id, reason }
    }
}

impl Display for VotingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(err) => write!(f, "invalid input: {err}"),
            Self::AgendaNotFound(id) => write!(f, "agenda not found: {id}"),
            Self::Conflict { agenda_id, reason } => {
                write!(f, "{} for agenda {agenda_id}", reason.as_str())
            }
            Self::Forbidden(masked) => write!(f, "voter {masked} is not eligible to vote"),
            Self::ExternalServiceUnavailable(details) => {
                write!(f, "external service unavailable: {details}")
            }
            Self::InvalidVoterIdentifier(masked) => {
                write!(f, "voter identifier {masked} is not recognized")
            }
            Self::Store(err) => write!(f, "store failure: {err}"),
        }
    }
}

impl Error for VotingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for VotingError {
    fn from(value: ValidationError) -> Self {
        Self::InvalidInput(value)
    }
}

impl From<StoreError> for VotingError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<EligibilityError> for VotingError {
    fn from(value: EligibilityError) -> Self {
        match value {
            EligibilityError::InvalidIdentifier(masked) => Self::InvalidVoterIdentifier(masked),
            EligibilityError::Unavailable(details) => Self::ExternalServiceUnavailable(details),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConflictReason, VotingError};
    use crate::eligibility::EligibilityError;
    use crate::model::ValidationError;
    use uuid::Uuid;

    #[test]
    fn codes_are_distinct_per_kind() {
        let errors = [
            VotingError::InvalidInput(ValidationError::BlankTitle),
            VotingError::AgendaNotFound(Uuid::nil()),
            VotingError::conflict(Uuid::nil(), ConflictReason::DuplicateVote),
            VotingError::Forbidden("***8901".to_string()),
            VotingError::ExternalServiceUnavailable("timeout".to_string()),
            VotingError::InvalidVoterIdentifier("***8901".to_string()),
        ];
        let mut codes: Vec<&str> = errors.iter().map(VotingError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn eligibility_errors_map_to_distinct_kinds() {
        let invalid: VotingError = EligibilityError::InvalidIdentifier("***8901".into()).into();
        assert_eq!(invalid.code(), "INVALID_VOTER_ID");
        let unavailable: VotingError = EligibilityError::Unavailable("refused".into()).into();
        assert_eq!(unavailable.code(), "EXTERNAL_SERVICE_UNAVAILABLE");
    }

    #[test]
    fn conflict_message_names_reason() {
        let err = VotingError::conflict(Uuid::nil(), ConflictReason::SessionClosed);
        assert!(err.to_string().starts_with("session closed"));
        assert_eq!(err.conflict_reason(), Some(ConflictReason::SessionClosed));
    }
}
