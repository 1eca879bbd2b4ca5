//! Command-line entry point for the assembly voting core.
//!
//! # Responsibility
//! - Map subcommands onto `VotingRuntime` operations.
//! - Print successful results as pretty JSON on stdout.
//! - Print failures as `<CODE>: <message>` on stderr and exit non-zero.

use assembly_core::{
    init_logging, AgendaId, ConfigError, CoreConfig, PublishedNotification, RuntimeError,
    SqliteVotingStore, TallyResult, VoteChoice, VoterId, VotingError, VotingRuntime,
};
use clap::{Parser, Subcommand};
use log::debug;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "assembly")]
#[command(about = "Run corporate-assembly votes on a local database", version)]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// SQLite database file; overrides the config and environment.
    /// Without one, each invocation starts from an empty in-memory database.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage agendas
    Agenda {
        #[command(subcommand)]
        action: AgendaAction,
    },
    /// Manage voting sessions
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Cast one ballot
    Vote {
        agenda_id: String,
        /// 11-digit voter identifier
        voter_id: String,
        /// for|against (also yes|no, sim|nao)
        choice: String,
    },
    /// Show the current tally and publish it if the session is closed
    Tally {
        agenda_id: String,
        /// Also print the notification buffer after publication
        #[arg(long)]
        notifications: bool,
    },
    /// Query the eligibility service directly
    Eligibility {
        #[command(subcommand)]
        action: EligibilityAction,
    },
    /// Validate the configuration, open the database and print the settings
    CheckConfig,
}

#[derive(Subcommand)]
enum AgendaAction {
    /// Create an agenda
    Create { title: String },
}

#[derive(Subcommand)]
enum EligibilityAction {
    /// Ask whether one voter identifier may vote
    Check { voter_id: String },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Open the voting session of an agenda
    Open {
        agenda_id: String,
        /// Session length in minutes
        #[arg(long)]
        minutes: Option<i64>,
    },
}

#[derive(Debug)]
enum CliError {
    Config(ConfigError),
    Logging(String),
    Runtime(RuntimeError),
    Voting(VotingError),
    InvalidArgument(String),
    Output(serde_json::Error),
}

impl CliError {
    fn code(&self) -> &'static str {
        match self {
            Self::Config(_) | Self::Logging(_) => "CONFIG_ERROR",
            Self::Runtime(_) | Self::Output(_) => "INTERNAL_ERROR",
            Self::Voting(err) => err.code(),
            Self::InvalidArgument(_) => "INVALID_REQUEST",
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(details) => write!(f, "{details}"),
            Self::Runtime(err) => write!(f, "{err}"),
            Self::Voting(err) => write!(f, "{err}"),
            Self::InvalidArgument(details) => write!(f, "{details}"),
            Self::Output(err) => write!(f, "cannot render output: {err}"),
        }
    }
}

impl From<VotingError> for CliError {
    fn from(value: VotingError) -> Self {
        Self::Voting(value)
    }
}

#[derive(Serialize)]
struct TallyReport {
    #[serde(flatten)]
    result: TallyResult,
    published_notifications: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    notifications: Option<Vec<PublishedNotification>>,
}

/// Answer of the eligibility service for one (masked) identifier.
#[derive(Serialize)]
struct EligibilityReport {
    voter_id: VoterId,
    eligible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Effective settings after file, environment and flag overrides.
#[derive(Serialize)]
struct ConfigReport {
    database_path: Option<String>,
    eligibility_enabled: bool,
    eligibility_base_url: String,
    eligibility_timeout_ms: u64,
    messaging_enabled: bool,
    messaging_capacity: usize,
    log_level: String,
    log_dir: Option<String>,
}

impl From<&CoreConfig> for ConfigReport {
    fn from(config: &CoreConfig) -> Self {
        Self {
            database_path: config
                .database
                .path
                .as_ref()
                .map(|path| path.display().to_string()),
            eligibility_enabled: config.eligibility.enabled,
            eligibility_base_url: config.eligibility.base_url.clone(),
            eligibility_timeout_ms: config.eligibility.timeout_ms,
            messaging_enabled: config.messaging.enabled,
            messaging_capacity: config.messaging.capacity,
            log_level: config.logging.level.clone(),
            log_dir: config
                .logging
                .dir
                .as_ref()
                .map(|dir| dir.display().to_string()),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {err}", err.code());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = CoreConfig::load(cli.config.as_deref()).map_err(CliError::Config)?;
    if let Some(db) = cli.db {
        config.database.path = Some(db);
    }

    let log_dir = config
        .logging
        .dir
        .as_deref()
        .map(|dir| {
            dir.to_str()
                .ok_or_else(|| CliError::Logging("logging.dir is not valid UTF-8".to_string()))
        })
        .transpose()?;
    init_logging(&config.logging.level, log_dir)
        .map_err(|err| CliError::Logging(err.to_string()))?;

    let runtime = VotingRuntime::from_config(&config).map_err(CliError::Runtime)?;
    dispatch(&runtime, &config, cli.command)
}

fn dispatch(
    runtime: &VotingRuntime<SqliteVotingStore>,
    config: &CoreConfig,
    command: Commands,
) -> Result<(), CliError> {
    match command {
        Commands::Agenda {
            action: AgendaAction::Create { title },
        } => print_json(&runtime.voting.create_agenda(&title)?),
        Commands::Session {
            action: SessionAction::Open { agenda_id, minutes },
        } => {
            let agenda_id = parse_agenda_id(&agenda_id)?;
            print_json(&runtime.voting.open_session(agenda_id, minutes)?)
        }
        Commands::Vote {
            agenda_id,
            voter_id,
            choice,
        } => {
            let agenda_id = parse_agenda_id(&agenda_id)?;
            let choice: VoteChoice = choice
                .parse()
                .map_err(|err| CliError::Voting(VotingError::InvalidInput(err)))?;
            print_json(&runtime.voting.cast_vote(agenda_id, &voter_id, choice)?)
        }
        Commands::Tally {
            agenda_id,
            notifications,
        } => print_json(&tally_report(runtime, &agenda_id, notifications)?),
        Commands::Eligibility {
            action: EligibilityAction::Check { voter_id },
        } => print_json(&eligibility_report(runtime, &voter_id)?),
        Commands::CheckConfig => print_json(&ConfigReport::from(config)),
    }
}

fn tally_report(
    runtime: &VotingRuntime<SqliteVotingStore>,
    agenda_id: &str,
    include_notifications: bool,
) -> Result<TallyReport, CliError> {
    let agenda_id = parse_agenda_id(agenda_id)?;
    let result = runtime.tally.compute(agenda_id)?;
    debug!("event=cli_tally module=cli status=ok agenda_id={agenda_id}");
    Ok(TallyReport {
        result,
        published_notifications: runtime.queue.len(),
        notifications: include_notifications.then(|| runtime.queue.snapshot()),
    })
}

/// Checker failures are part of the report, not a command failure.
fn eligibility_report(
    runtime: &VotingRuntime<SqliteVotingStore>,
    voter_id: &str,
) -> Result<EligibilityReport, CliError> {
    let voter_id = VoterId::parse(voter_id).map_err(VotingError::from)?;
    let report = match runtime.eligibility.is_eligible(&voter_id) {
        Ok(eligible) => EligibilityReport {
            voter_id,
            eligible: Some(eligible),
            error_code: None,
            error: None,
        },
        Err(err) => {
            let err = VotingError::from(err);
            EligibilityReport {
                voter_id,
                eligible: None,
                error_code: Some(err.code()),
                error: Some(err.to_string()),
            }
        }
    };
    Ok(report)
}

fn parse_agenda_id(raw: &str) -> Result<AgendaId, CliError> {
    Uuid::parse_str(raw.trim())
        .map_err(|err| CliError::InvalidArgument(format!("invalid agenda id `{raw}`: {err}")))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value).map_err(CliError::Output)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        dispatch, eligibility_report, parse_agenda_id, tally_report, Cli, CliError, Commands,
        EligibilityAction, SessionAction,
    };
    use assembly_core::{CoreConfig, VotingRuntime};
    use clap::Parser;

    fn offline_runtime() -> (CoreConfig, VotingRuntime<assembly_core::SqliteVotingStore>) {
        let mut config = CoreConfig::default();
        config.eligibility.enabled = false;
        let runtime = VotingRuntime::from_config(&config).expect("in-memory runtime");
        (config, runtime)
    }

    #[test]
    fn session_open_parses_minutes_and_global_db() {
        let cli = Cli::try_parse_from([
            "assembly",
            "session",
            "open",
            "2f1c0f7e-8a51-4f1e-9d0e-2b2d3c4e5f60",
            "--minutes",
            "5",
            "--db",
            "/tmp/assembly.db",
        ])
        .expect("valid arguments");
        assert_eq!(cli.db.as_deref(), Some(std::path::Path::new("/tmp/assembly.db")));
        match cli.command {
            Commands::Session {
                action: SessionAction::Open { minutes, .. },
            } => assert_eq!(minutes, Some(5)),
            _ => panic!("expected session open"),
        }
    }

    #[test]
    fn vote_requires_all_positionals() {
        assert!(Cli::try_parse_from(["assembly", "vote", "id-only"]).is_err());
    }

    #[test]
    fn malformed_agenda_id_is_invalid_request() {
        let err = parse_agenda_id("not-a-uuid").expect_err("bad uuid");
        assert_eq!(err.code(), "INVALID_REQUEST");
    }

    #[test]
    fn unknown_choice_maps_to_invalid_request() {
        let (config, runtime) = offline_runtime();
        let agenda = runtime.voting.create_agenda("Choice").expect("agenda");
        let err = dispatch(
            &runtime,
            &config,
            Commands::Vote {
                agenda_id: agenda.id.to_string(),
                voter_id: "12345678901".to_string(),
                choice: "maybe".to_string(),
            },
        )
        .expect_err("unknown choice");
        assert_eq!(err.code(), "INVALID_REQUEST");
    }

    #[test]
    fn voting_errors_keep_their_codes() {
        let (config, runtime) = offline_runtime();
        let err = dispatch(
            &runtime,
            &config,
            Commands::Tally {
                agenda_id: "2f1c0f7e-8a51-4f1e-9d0e-2b2d3c4e5f60".to_string(),
                notifications: false,
            },
        )
        .expect_err("unknown agenda");
        assert!(matches!(err, CliError::Voting(_)));
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn tally_report_lists_buffered_notifications_on_request() {
        let (_, runtime) = offline_runtime();
        let agenda = runtime.voting.create_agenda("Viewer").expect("agenda");
        let agenda_id = agenda.id.to_string();

        let plain = tally_report(&runtime, &agenda_id, false).expect("tally");
        assert!(plain.notifications.is_none());
        let json = serde_json::to_value(&plain).expect("serializes");
        assert!(json.get("notifications").is_none());

        let listed = tally_report(&runtime, &agenda_id, true).expect("tally");
        assert_eq!(listed.published_notifications, 1);
        let json = serde_json::to_value(&listed).expect("serializes");
        assert_eq!(json["notifications"][0]["result"]["agenda_id"], agenda_id);
        assert_eq!(json["session_status"], "closed");
    }

    #[test]
    fn tally_flag_parses() {
        let cli = Cli::try_parse_from(["assembly", "tally", "some-id", "--notifications"])
            .expect("valid arguments");
        assert!(matches!(
            cli.command,
            Commands::Tally {
                notifications: true,
                ..
            }
        ));
    }

    #[test]
    fn eligibility_check_reports_masked_answer() {
        let (config, runtime) = offline_runtime();
        let report = eligibility_report(&runtime, "12345678901").expect("report");
        assert_eq!(report.eligible, Some(true));
        let json = serde_json::to_string(&report).expect("serializes");
        assert!(json.contains("***8901"));
        assert!(!json.contains("12345678901"));

        dispatch(
            &runtime,
            &config,
            Commands::Eligibility {
                action: EligibilityAction::Check {
                    voter_id: "12345678901".to_string(),
                },
            },
        )
        .expect("check succeeds");
    }

    #[test]
    fn eligibility_check_reports_unreachable_service() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let base_url = format!("http://{}", listener.local_addr().expect("addr"));
        drop(listener);
        let mut config = CoreConfig::default();
        config.eligibility.base_url = base_url;
        config.eligibility.timeout_ms = 500;
        let runtime = VotingRuntime::from_config(&config).expect("runtime");

        let report = eligibility_report(&runtime, "12345678901").expect("report");

        assert_eq!(report.eligible, None);
        assert_eq!(report.error_code, Some("EXTERNAL_SERVICE_UNAVAILABLE"));
        assert!(!report.error.unwrap_or_default().contains("12345678901"));
    }

    #[test]
    fn eligibility_check_rejects_malformed_id() {
        let (_, runtime) = offline_runtime();
        let err = eligibility_report(&runtime, "12-34").err().expect("malformed id");
        assert_eq!(err.code(), "INVALID_REQUEST");
    }
}
