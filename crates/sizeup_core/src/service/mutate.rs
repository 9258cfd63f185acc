//! Pure session mutations.
//!
//! # Responsibility
//! - Compute the next whole document for roster and estimate changes.
//! - Enforce name uniqueness and option validity before producing output.
//!
//! # Invariants
//! - Inputs are never modified; a failed precondition yields an error and no
//!   document.
//! - Every returned document has `all_submitted` recomputed.
//! - Resubmitting overwrites the previous estimate; no history is kept.

use crate::model::estimation::EstimationModeId;
use crate::model::session::{Participant, Session, SessionId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type MutationResult<T> = Result<T, MutationError>;

/// Reason a submission was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidSubmission {
    UnknownParticipant(String),
    UnknownEstimate {
        mode: EstimationModeId,
        value: String,
    },
}

impl Display for InvalidSubmission {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownParticipant(name) => write!(f, "unknown participant `{name}`"),
            Self::UnknownEstimate { mode, value } => {
                write!(f, "`{value}` is not a {} estimate", mode.as_str())
            }
        }
    }
}

/// Precondition failures raised by session mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    InvalidSubmission(InvalidSubmission),
    DuplicateParticipant(String),
    InvalidParticipantName(String),
}

impl Display for MutationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSubmission(reason) => write!(f, "invalid submission: {reason}"),
            Self::DuplicateParticipant(name) => {
                write!(f, "participant already exists: `{name}`")
            }
            Self::InvalidParticipantName(name) => {
                write!(f, "participant name must not be blank: `{name}`")
            }
        }
    }
}

impl Error for MutationError {}

impl From<InvalidSubmission> for MutationError {
    fn from(value: InvalidSubmission) -> Self {
        Self::InvalidSubmission(value)
    }
}

/// Builds the initial document for a new session.
///
/// Names are used verbatim as roster keys; a repeated name is rejected
/// instead of being silently merged.
pub fn new_session<I, N>(
    id: impl Into<SessionId>,
    task_description: impl Into<String>,
    mode: EstimationModeId,
    names: I,
    created_at: i64,
) -> MutationResult<Session>
where
    I: IntoIterator<Item = N>,
    N: Into<String>,
{
    let mut session = Session::new(id, task_description, mode, created_at);
    for name in names {
        session = add_participant(&session, name)?;
    }
    Ok(session)
}

/// Records `value` as the estimate of `participant_name`.
///
/// # Errors
/// - `InvalidSubmission::UnknownParticipant` when the name is not on the
///   roster.
/// - `InvalidSubmission::UnknownEstimate` when `value` is not an option of
///   the session's mode.
pub fn submit_estimate(
    session: &Session,
    participant_name: &str,
    value: &str,
) -> MutationResult<Session> {
    if !session.has_participant(participant_name) {
        return Err(InvalidSubmission::UnknownParticipant(participant_name.to_string()).into());
    }

    let mode = session.mode();
    if !mode.accepts(value) {
        return Err(InvalidSubmission::UnknownEstimate {
            mode: mode.id,
            value: value.to_string(),
        }
        .into());
    }

    let mut next = session.clone();
    if let Some(participant) = next.participants.get_mut(participant_name) {
        participant.estimate = Some(value.to_string());
        participant.submitted = true;
    }
    next.recompute_all_submitted();
    Ok(next)
}

/// Adds an unsubmitted participant named `name`.
///
/// # Errors
/// - `DuplicateParticipant` when the exact name already exists.
/// - `InvalidParticipantName` when the name is blank.
pub fn add_participant(session: &Session, name: impl Into<String>) -> MutationResult<Session> {
    let name = name.into();
    if name.trim().is_empty() {
        return Err(MutationError::InvalidParticipantName(name));
    }
    if session.has_participant(&name) {
        return Err(MutationError::DuplicateParticipant(name));
    }

    let mut next = session.clone();
    next.participants.insert(name.clone(), Participant::new(name));
    next.recompute_all_submitted();
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::{add_participant, new_session, submit_estimate, InvalidSubmission, MutationError};
    use crate::model::estimation::EstimationModeId;

    fn roster(names: &[&str]) -> crate::model::session::Session {
        new_session(
            "lusab-babad",
            "Implement login",
            EstimationModeId::Tshirt,
            names.iter().copied(),
            0,
        )
        .expect("roster should build")
    }

    #[test]
    fn submit_sets_estimate_and_recomputes_flag() {
        let session = roster(&["Alice", "Bob"]);
        let next = submit_estimate(&session, "Alice", "M").expect("valid submission");
        let alice = next.participant("Alice").expect("alice exists");
        assert_eq!(alice.estimate.as_deref(), Some("M"));
        assert!(alice.submitted);
        assert!(!next.all_submitted);

        let done = submit_estimate(&next, "Bob", "L").expect("valid submission");
        assert!(done.all_submitted);
        // Input documents stay untouched.
        assert!(!session.participant("Alice").expect("alice exists").submitted);
    }

    #[test]
    fn submit_is_idempotent_and_resubmission_overwrites() {
        let session = roster(&["Alice", "Bob"]);
        let once = submit_estimate(&session, "Alice", "S").expect("valid");
        let twice = submit_estimate(&once, "Alice", "S").expect("valid");
        assert_eq!(once, twice);

        let changed = submit_estimate(&twice, "Alice", "XL").expect("valid");
        assert_eq!(
            changed.participant("Alice").and_then(|p| p.estimate.as_deref()),
            Some("XL")
        );
    }

    #[test]
    fn submit_rejects_unknown_participant_and_value() {
        let session = roster(&["Alice"]);
        let err = submit_estimate(&session, "Mallory", "M").unwrap_err();
        assert_eq!(
            err,
            MutationError::InvalidSubmission(InvalidSubmission::UnknownParticipant(
                "Mallory".to_string()
            ))
        );

        let err = submit_estimate(&session, "Alice", "13").unwrap_err();
        assert!(matches!(
            err,
            MutationError::InvalidSubmission(InvalidSubmission::UnknownEstimate {
                mode: EstimationModeId::Tshirt,
                ..
            })
        ));

        let err = submit_estimate(&session, "Alice", "m").unwrap_err();
        assert!(matches!(err, MutationError::InvalidSubmission(_)));
    }

    #[test]
    fn add_participant_rejects_duplicates_without_mutation() {
        let session = roster(&["Alice"]);
        let before = session.clone();
        let err = add_participant(&session, "Alice").unwrap_err();
        assert_eq!(err, MutationError::DuplicateParticipant("Alice".to_string()));
        assert_eq!(session, before);

        // Names are case-sensitive keys.
        let next = add_participant(&session, "alice").expect("distinct key");
        assert_eq!(next.participants.len(), 2);
    }

    #[test]
    fn add_participant_flips_all_submitted_to_false() {
        let session = roster(&["Alice"]);
        let submitted = submit_estimate(&session, "Alice", "M").expect("valid");
        assert!(submitted.all_submitted);

        let joined = add_participant(&submitted, "Bob").expect("new name");
        assert!(!joined.all_submitted);
        let bob = joined.participant("Bob").expect("bob exists");
        assert_eq!(bob.estimate, None);
        assert!(!bob.submitted);
    }

    #[test]
    fn blank_names_are_rejected() {
        let session = roster(&[]);
        assert!(matches!(
            add_participant(&session, "   "),
            Err(MutationError::InvalidParticipantName(_))
        ));
    }

    #[test]
    fn new_session_rejects_repeated_names() {
        let err = new_session(
            "lusab-babad",
            "task",
            EstimationModeId::Fibonacci,
            ["Alice", "Bob", "Alice"],
            0,
        )
        .unwrap_err();
        assert_eq!(err, MutationError::DuplicateParticipant("Alice".to_string()));
    }
}
