//! Voting use-case services.
//!
//! # Responsibility
//! - Orchestrate store, clock and eligibility calls into the voting workflow.
//! - Compute tallies and hand closed ones to the result notifier.
//!
//! # Invariants
//! - Services stay storage-agnostic; they only see the port traits.

pub mod tally_service;
pub mod voting_service;
