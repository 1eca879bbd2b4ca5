//! Core of the assembly voting system.
//!
//! Agenda, session and ballot workflow, tally computation and best-effort
//! publication of closed results. HTTP surfaces live outside this crate.

pub mod clock;
pub mod config;
pub mod db;
pub mod eligibility;
pub mod error;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod runtime;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use eligibility::{
    AllowAllEligibilityChecker, EligibilityChecker, EligibilityError, HttpEligibilityChecker,
};
pub use error::{ConflictReason, ServiceResult, VotingError};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use model::agenda::{Agenda, AgendaId};
pub use model::session::{SessionStatus, VotingSession, DEFAULT_SESSION_MINUTES};
pub use model::tally::{Outcome, TallyResult};
pub use model::vote::{Vote, VoteChoice, VoterId};
pub use model::ValidationError;
pub use notify::{
    NotificationQueue, NotifyOutcome, PublishError, PublishedNotification, ResultNotifier,
    ResultPublisher,
};
pub use repo::{AgendaStore, SessionStore, SqliteVotingStore, StoreError, VoteStore, VotingStore};
pub use runtime::{RuntimeError, VotingRuntime};
pub use service::tally_service::TallyService;
pub use service::voting_service::VotingService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
