#![allow(dead_code)]

use assembly_core::{
    EligibilityChecker, EligibilityError, ManualClock, SqliteVotingStore, VoterId, VotingRuntime,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const START_MS: i64 = 1_700_000_000_000;
pub const VOTER_A: &str = "12345678901";
pub const VOTER_B: &str = "10987654321";
pub const VOTER_C: &str = "55555555555";

/// Answer a scripted checker gives for every voter.
#[derive(Debug, Clone)]
pub enum Answer {
    Eligible,
    Ineligible,
    Unknown,
    Down,
}

/// Eligibility checker that counts calls and answers from a script.
pub struct ScriptedChecker {
    answer: Answer,
    calls: AtomicUsize,
}

impl ScriptedChecker {
    pub fn new(answer: Answer) -> Arc<Self> {
        Arc::new(Self {
            answer,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EligibilityChecker for ScriptedChecker {
    fn is_eligible(&self, voter_id: &VoterId) -> Result<bool, EligibilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.answer {
            Answer::Eligible => Ok(true),
            Answer::Ineligible => Ok(false),
            Answer::Unknown => Err(EligibilityError::InvalidIdentifier(voter_id.masked())),
            Answer::Down => Err(EligibilityError::Unavailable("timeout error".to_string())),
        }
    }
}

pub struct Harness {
    pub runtime: VotingRuntime<SqliteVotingStore>,
    pub clock: Arc<ManualClock>,
    pub checker: Arc<ScriptedChecker>,
}

pub fn harness(answer: Answer) -> Harness {
    harness_with_capacity(answer, 1000)
}

pub fn harness_with_capacity(answer: Answer, capacity: usize) -> Harness {
    let clock = Arc::new(ManualClock::new(START_MS));
    let checker = ScriptedChecker::new(answer);
    let store = SqliteVotingStore::in_memory().unwrap();
    let runtime = VotingRuntime::assemble(store, checker.clone(), clock.clone(), true, capacity);
    Harness {
        runtime,
        clock,
        checker,
    }
}
