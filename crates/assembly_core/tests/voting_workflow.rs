mod common;

use assembly_core::clock::MINUTE_MS;
use assembly_core::{ConflictReason, SessionStatus, ValidationError, VoteChoice, VotingError};
use common::{harness, Answer, START_MS, VOTER_A, VOTER_B};
use uuid::Uuid;

#[test]
fn create_agenda_returns_title_and_fresh_id() {
    let h = harness(Answer::Eligible);

    let first = h.runtime.voting.create_agenda("Approve 2025 budget").unwrap();
    let second = h.runtime.voting.create_agenda("Approve 2025 budget").unwrap();

    assert_eq!(first.title, "Approve 2025 budget");
    assert_eq!(first.created_at, START_MS);
    assert_ne!(first.id, second.id);
    let stored = h.runtime.voting.get_agenda(first.id).unwrap().unwrap();
    assert_eq!(stored, first);
}

#[test]
fn create_agenda_rejects_blank_title() {
    let h = harness(Answer::Eligible);

    for title in ["", "   ", "\n\t"] {
        let err = h.runtime.voting.create_agenda(title).unwrap_err();
        assert!(matches!(
            err,
            VotingError::InvalidInput(ValidationError::BlankTitle)
        ));
        assert_eq!(err.code(), "INVALID_REQUEST");
    }
}

#[test]
fn open_session_defaults_to_one_minute() {
    let h = harness(Answer::Eligible);
    let agenda = h.runtime.voting.create_agenda("Default window").unwrap();

    let session = h.runtime.voting.open_session(agenda.id, None).unwrap();

    assert_eq!(session.agenda_id, agenda.id);
    assert_eq!(session.opened_at, START_MS);
    assert_eq!(session.closes_at, START_MS + MINUTE_MS);
    assert_eq!(session.status(START_MS), SessionStatus::Open);
}

#[test]
fn open_session_uses_explicit_duration() {
    let h = harness(Answer::Eligible);
    let agenda = h.runtime.voting.create_agenda("Five minutes").unwrap();

    let session = h.runtime.voting.open_session(agenda.id, Some(5)).unwrap();

    assert_eq!(session.closes_at, session.opened_at + 5 * MINUTE_MS);
}

#[test]
fn open_session_rejects_non_positive_duration() {
    let h = harness(Answer::Eligible);
    let agenda = h.runtime.voting.create_agenda("Bad window").unwrap();

    for minutes in [0, -1, -60] {
        let err = h
            .runtime
            .voting
            .open_session(agenda.id, Some(minutes))
            .unwrap_err();
        assert!(matches!(
            err,
            VotingError::InvalidInput(ValidationError::NonPositiveDuration(m)) if m == minutes
        ));
    }
    assert!(h.runtime.voting.get_session(agenda.id).unwrap().is_none());
}

#[test]
fn open_session_for_unknown_agenda_is_not_found() {
    let h = harness(Answer::Eligible);

    let err = h.runtime.voting.open_session(Uuid::new_v4(), None).unwrap_err();

    assert!(matches!(err, VotingError::AgendaNotFound(_)));
    assert_eq!(err.code(), "NOT_FOUND");
}

#[test]
fn second_open_session_conflicts_even_after_expiry() {
    let h = harness(Answer::Eligible);
    let agenda = h.runtime.voting.create_agenda("Single session").unwrap();
    h.runtime.voting.open_session(agenda.id, Some(1)).unwrap();

    let err = h.runtime.voting.open_session(agenda.id, Some(3)).unwrap_err();
    assert_eq!(err.conflict_reason(), Some(ConflictReason::SessionAlreadyOpen));

    h.clock.advance_minutes(10);
    let err = h.runtime.voting.open_session(agenda.id, None).unwrap_err();
    assert_eq!(err.conflict_reason(), Some(ConflictReason::SessionAlreadyOpen));
}

#[test]
fn cast_vote_persists_one_vote() {
    let h = harness(Answer::Eligible);
    let agenda = h.runtime.voting.create_agenda("Cast").unwrap();
    h.runtime.voting.open_session(agenda.id, None).unwrap();

    let vote = h
        .runtime
        .voting
        .cast_vote(agenda.id, VOTER_A, VoteChoice::For)
        .unwrap();

    assert_eq!(vote.agenda_id, agenda.id);
    assert_eq!(vote.voter_id.as_str(), VOTER_A);
    assert_eq!(vote.created_at, START_MS);
    assert_eq!(h.checker.calls(), 1);
    let tally = h.runtime.tally.evaluate(agenda.id).unwrap();
    assert_eq!(tally.total, 1);
}

#[test]
fn duplicate_vote_conflicts_regardless_of_choice() {
    let h = harness(Answer::Eligible);
    let agenda = h.runtime.voting.create_agenda("Duplicate").unwrap();
    h.runtime.voting.open_session(agenda.id, None).unwrap();
    h.runtime
        .voting
        .cast_vote(agenda.id, VOTER_A, VoteChoice::For)
        .unwrap();

    let err = h
        .runtime
        .voting
        .cast_vote(agenda.id, VOTER_A, VoteChoice::Against)
        .unwrap_err();

    assert_eq!(err.conflict_reason(), Some(ConflictReason::DuplicateVote));
    assert_eq!(err.code(), "CONFLICT");
    // Duplicate detection precedes the eligibility call.
    assert_eq!(h.checker.calls(), 1);
    assert!(!err.to_string().contains(VOTER_A));
}

#[test]
fn cast_vote_on_closed_session_skips_eligibility() {
    let h = harness(Answer::Eligible);
    let agenda = h.runtime.voting.create_agenda("Closed").unwrap();
    h.runtime.voting.open_session(agenda.id, Some(2)).unwrap();

    h.clock.advance_minutes(2);
    let err = h
        .runtime
        .voting
        .cast_vote(agenda.id, VOTER_A, VoteChoice::For)
        .unwrap_err();

    assert_eq!(err.conflict_reason(), Some(ConflictReason::SessionClosed));
    assert_eq!(h.checker.calls(), 0);
}

#[test]
fn vote_one_millisecond_before_close_is_accepted() {
    let h = harness(Answer::Eligible);
    let agenda = h.runtime.voting.create_agenda("Boundary").unwrap();
    h.runtime.voting.open_session(agenda.id, Some(1)).unwrap();

    h.clock.advance_ms(MINUTE_MS - 1);
    h.runtime
        .voting
        .cast_vote(agenda.id, VOTER_A, VoteChoice::For)
        .unwrap();

    h.clock.advance_ms(1);
    let err = h
        .runtime
        .voting
        .cast_vote(agenda.id, VOTER_B, VoteChoice::For)
        .unwrap_err();
    assert_eq!(err.conflict_reason(), Some(ConflictReason::SessionClosed));
}

#[test]
fn cast_vote_without_session_conflicts() {
    let h = harness(Answer::Eligible);
    let agenda = h.runtime.voting.create_agenda("No session").unwrap();

    let err = h
        .runtime
        .voting
        .cast_vote(agenda.id, VOTER_A, VoteChoice::For)
        .unwrap_err();

    assert_eq!(err.conflict_reason(), Some(ConflictReason::NoSession));
    assert_eq!(h.checker.calls(), 0);
}

#[test]
fn cast_vote_on_unknown_agenda_is_not_found() {
    let h = harness(Answer::Eligible);

    let err = h
        .runtime
        .voting
        .cast_vote(Uuid::new_v4(), VOTER_A, VoteChoice::For)
        .unwrap_err();

    assert!(matches!(err, VotingError::AgendaNotFound(_)));
    assert_eq!(h.checker.calls(), 0);
}

#[test]
fn malformed_voter_id_is_invalid_input() {
    let h = harness(Answer::Eligible);
    let agenda = h.runtime.voting.create_agenda("Malformed").unwrap();
    h.runtime.voting.open_session(agenda.id, None).unwrap();

    let err = h
        .runtime
        .voting
        .cast_vote(agenda.id, "123-456-789-01", VoteChoice::For)
        .unwrap_err();

    assert!(matches!(
        err,
        VotingError::InvalidInput(ValidationError::MalformedVoterId(_))
    ));
    assert_eq!(h.checker.calls(), 0);
}

#[test]
fn ineligible_voter_is_forbidden_and_not_persisted() {
    let h = harness(Answer::Ineligible);
    let agenda = h.runtime.voting.create_agenda("Forbidden").unwrap();
    h.runtime.voting.open_session(agenda.id, None).unwrap();

    let err = h
        .runtime
        .voting
        .cast_vote(agenda.id, VOTER_A, VoteChoice::For)
        .unwrap_err();

    assert!(matches!(err, VotingError::Forbidden(ref masked) if masked == "***8901"));
    assert_eq!(err.code(), "FORBIDDEN");
    assert!(!err.to_string().contains(VOTER_A));
    assert_eq!(h.runtime.tally.evaluate(agenda.id).unwrap().total, 0);
}

#[test]
fn unknown_voter_identifier_is_distinct_from_ineligible() {
    let h = harness(Answer::Unknown);
    let agenda = h.runtime.voting.create_agenda("Unknown").unwrap();
    h.runtime.voting.open_session(agenda.id, None).unwrap();

    let err = h
        .runtime
        .voting
        .cast_vote(agenda.id, VOTER_A, VoteChoice::For)
        .unwrap_err();

    assert!(matches!(err, VotingError::InvalidVoterIdentifier(_)));
    assert_eq!(err.code(), "INVALID_VOTER_ID");
}

#[test]
fn unavailable_checker_surfaces_and_is_not_retried() {
    let h = harness(Answer::Down);
    let agenda = h.runtime.voting.create_agenda("Down").unwrap();
    h.runtime.voting.open_session(agenda.id, None).unwrap();

    let err = h
        .runtime
        .voting
        .cast_vote(agenda.id, VOTER_A, VoteChoice::For)
        .unwrap_err();

    assert!(matches!(err, VotingError::ExternalServiceUnavailable(_)));
    assert_eq!(err.code(), "EXTERNAL_SERVICE_UNAVAILABLE");
    assert_eq!(h.checker.calls(), 1);
    assert_eq!(h.runtime.tally.evaluate(agenda.id).unwrap().total, 0);
}
