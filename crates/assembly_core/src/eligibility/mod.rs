//! Voter eligibility port and adapters.
//!
//! # Responsibility
//! - Answer whether a voter identifier may vote right now.
//! - Keep "unknown identifier" distinct from "service unavailable".
//!
//! # Invariants
//! - Adapters never retry; transient failures surface as `Unavailable`.
//! - Error payloads contain masked identifiers only.

mod http;

use crate::model::vote::VoterId;
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use http::{HttpEligibilityChecker, ABLE_TO_VOTE, UNABLE_TO_VOTE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EligibilityError {
    /// The external registry does not know this identifier (masked).
    InvalidIdentifier(String),
    /// Timeout, network failure, server error or unreadable response.
    Unavailable(String),
}

impl Display for EligibilityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIdentifier(masked) => write!(f, "unknown voter identifier {masked}"),
            Self::Unavailable(details) => write!(f, "eligibility service unavailable: {details}"),
        }
    }
}

impl Error for EligibilityError {}

/// External capability deciding whether a voter may cast a ballot.
pub trait EligibilityChecker: Send + Sync {
    fn is_eligible(&self, voter_id: &VoterId) -> Result<bool, EligibilityError>;
}

/// Development stand-in that approves every well-formed identifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllEligibilityChecker;

impl EligibilityChecker for AllowAllEligibilityChecker {
    fn is_eligible(&self, voter_id: &VoterId) -> Result<bool, EligibilityError> {
        warn!(
            "event=eligibility_check module=eligibility status=skipped mode=allow_all voter={voter_id}"
        );
        Ok(true)
    }
}
