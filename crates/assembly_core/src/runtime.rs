//! Wiring of store, eligibility checker, clock and notifier from config.

use crate::clock::{Clock, SystemClock};
use crate::config::CoreConfig;
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::eligibility::{
    AllowAllEligibilityChecker, EligibilityChecker, EligibilityError, HttpEligibilityChecker,
};
use crate::notify::{NotificationQueue, ResultNotifier};
use crate::repo::{SqliteVotingStore, VotingStore};
use crate::service::tally_service::TallyService;
use crate::service::voting_service::VotingService;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
pub enum RuntimeError {
    Db(DbError),
    Eligibility(EligibilityError),
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "database setup failed: {err}"),
            Self::Eligibility(err) => write!(f, "eligibility setup failed: {err}"),
        }
    }
}

impl Error for RuntimeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Eligibility(err) => Some(err),
        }
    }
}

impl From<DbError> for RuntimeError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<EligibilityError> for RuntimeError {
    fn from(value: EligibilityError) -> Self {
        Self::Eligibility(value)
    }
}

/// Fully wired voting core sharing one store and one notification buffer.
pub struct VotingRuntime<S: VotingStore> {
    pub voting: VotingService<S>,
    pub tally: TallyService<S>,
    pub queue: Arc<NotificationQueue>,
    /// Checker shared with `voting`, exposed for operator lookups.
    pub eligibility: Arc<dyn EligibilityChecker>,
    /// `None` when messaging is disabled.
    pub notifier: Option<Arc<ResultNotifier>>,
}

impl VotingRuntime<SqliteVotingStore> {
    /// Builds a runtime on SQLite with the wall clock.
    ///
    /// Without `database.path` the store is a private in-memory database that
    /// disappears with the runtime.
    pub fn from_config(config: &CoreConfig) -> Result<Self, RuntimeError> {
        let conn = match &config.database.path {
            Some(path) => open_db(path)?,
            None => {
                warn!(
                    "event=runtime_build module=runtime status=warn store=memory detail=data_lost_on_exit"
                );
                open_db_in_memory()?
            }
        };
        let eligibility: Arc<dyn EligibilityChecker> = if config.eligibility.enabled {
            Arc::new(HttpEligibilityChecker::new(
                &config.eligibility.base_url,
                Duration::from_millis(config.eligibility.timeout_ms),
            )?)
        } else {
            warn!("event=runtime_build module=runtime status=warn eligibility=allow_all");
            Arc::new(AllowAllEligibilityChecker)
        };

        let runtime = Self::assemble(
            SqliteVotingStore::new(conn),
            eligibility,
            Arc::new(SystemClock),
            config.messaging.enabled,
            config.messaging.capacity,
        );
        info!(
            "event=runtime_build module=runtime status=ok eligibility_enabled={} messaging_enabled={} queue_capacity={}",
            config.eligibility.enabled,
            config.messaging.enabled,
            runtime.queue.capacity()
        );
        Ok(runtime)
    }
}

impl<S: VotingStore + Clone> VotingRuntime<S> {
    /// Builds a runtime from explicit collaborators.
    pub fn assemble(
        store: S,
        eligibility: Arc<dyn EligibilityChecker>,
        clock: Arc<dyn Clock>,
        messaging_enabled: bool,
        queue_capacity: usize,
    ) -> Self {
        let queue = Arc::new(NotificationQueue::new(queue_capacity));
        let notifier = messaging_enabled
            .then(|| Arc::new(ResultNotifier::new(queue.clone(), clock.clone())));
        Self {
            voting: VotingService::new(store.clone(), eligibility.clone(), clock.clone()),
            tally: TallyService::new(store, clock, notifier.clone()),
            queue,
            eligibility,
            notifier,
        }
    }
}
