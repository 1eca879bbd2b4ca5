//! Tally computation over a set of votes.
//!
//! # Invariants
//! - `total = for_count + against_count`.
//! - Outcome is `Approved` iff `for_count > against_count`; ties are rejected.

use crate::model::agenda::AgendaId;
use crate::model::session::SessionStatus;
use crate::model::vote::{Vote, VoteChoice};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Approved,
    Rejected,
}

/// Derived count for one agenda; recomputed on every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyResult {
    pub agenda_id: AgendaId,
    pub session_status: SessionStatus,
    pub for_count: u64,
    pub against_count: u64,
    pub total: u64,
    pub outcome: Outcome,
}

impl TallyResult {
    pub fn is_closed(&self) -> bool {
        self.session_status == SessionStatus::Closed
    }
}

/// Counts votes by linear scan and derives the outcome.
pub fn tally_votes(agenda_id: AgendaId, session_status: SessionStatus, votes: &[Vote]) -> TallyResult {
    let for_count = count_by_choice(votes, VoteChoice::For);
    let against_count = count_by_choice(votes, VoteChoice::Against);
    let outcome = if for_count > against_count {
        Outcome::Approved
    } else {
        Outcome::Rejected
    };

    TallyResult {
        agenda_id,
        session_status,
        for_count,
        against_count,
        total: for_count + against_count,
        outcome,
    }
}

fn count_by_choice(votes: &[Vote], choice: VoteChoice) -> u64 {
    votes.iter().filter(|vote| vote.choice == choice).count() as u64
}
