//! Session use-case service.
//!
//! # Responsibility
//! - Wrap the pure mutator in read → mutate → write round trips.
//! - Resolve viewer contexts against the stored roster.
//!
//! # Invariants
//! - A rejected mutation never reaches the store.
//! - Store errors are returned unchanged (`NotFound` is lifted to
//!   `SessionError::NotFound`); nothing is retried.
//! - Log events carry ids and counts only, never names or task text.

use crate::model::estimation::EstimationModeId;
use crate::model::input::{generate_session_id, normalize_session_id};
use crate::model::session::{Session, SessionId};
use crate::service::mutate::{self, InvalidSubmission, MutationError};
use crate::service::reconcile::{compute_view_model, ViewModel};
use crate::service::viewer::ViewerPhase;
use crate::store::{SessionStore, StoreError, Subscription};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub type SessionResult<T> = Result<T, SessionError>;

/// Error surfaced to session callers.
#[derive(Debug)]
pub enum SessionError {
    /// Unknown participant or estimate value.
    InvalidSubmission(InvalidSubmission),
    /// Name collision on join.
    DuplicateParticipant(String),
    /// Blank participant name.
    InvalidParticipantName(String),
    /// Session creation without any participant.
    EmptyRoster,
    /// Viewer name is not on the roster of the session being opened.
    UnknownViewer { session_id: SessionId, name: String },
    /// Action needs a named participant but the context is view-only.
    ViewOnly,
    /// Store reported the session missing.
    NotFound(SessionId),
    /// Subscription delivered an error instead of a snapshot.
    SubscriptionFailed(String),
    /// Viewer state machine rejected the action in its current phase.
    InvalidTransition {
        phase: ViewerPhase,
        action: &'static str,
    },
    /// Opaque backend failure.
    Store(StoreError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSubmission(reason) => write!(f, "invalid submission: {reason}"),
            Self::DuplicateParticipant(name) => write!(f, "participant already exists: `{name}`"),
            Self::InvalidParticipantName(name) => {
                write!(f, "participant name must not be blank: `{name}`")
            }
            Self::EmptyRoster => write!(f, "a session needs at least one participant"),
            Self::UnknownViewer { session_id, name } => {
                write!(f, "`{name}` is not a participant of session {session_id}")
            }
            Self::ViewOnly => write!(f, "view-only viewers cannot submit estimates"),
            Self::NotFound(id) => write!(f, "session not found: {id}"),
            Self::SubscriptionFailed(message) => {
                write!(f, "session subscription failed: {message}")
            }
            Self::InvalidTransition { phase, action } => {
                write!(f, "cannot {action} while {}", phase.as_str())
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

impl From<MutationError> for SessionError {
    fn from(value: MutationError) -> Self {
        match value {
            MutationError::InvalidSubmission(reason) => Self::InvalidSubmission(reason),
            MutationError::DuplicateParticipant(name) => Self::DuplicateParticipant(name),
            MutationError::InvalidParticipantName(name) => Self::InvalidParticipantName(name),
        }
    }
}

/// Explicit "current session + viewer" pair carried by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub session_id: SessionId,
    /// `None` means view-only.
    pub viewer_name: Option<String>,
}

impl SessionContext {
    pub fn participant(session_id: &str, name: impl Into<String>) -> Self {
        Self {
            session_id: normalize_session_id(session_id),
            viewer_name: Some(name.into()),
        }
    }

    pub fn view_only(session_id: &str) -> Self {
        Self {
            session_id: normalize_session_id(session_id),
            viewer_name: None,
        }
    }

    pub fn is_view_only(&self) -> bool {
        self.viewer_name.is_none()
    }
}

/// Session use-cases over a store implementation.
pub struct SessionService<S: SessionStore> {
    store: S,
}

impl<S: SessionStore> SessionService<S> {
    /// Creates a service using the provided store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a session with a generated id and an unsubmitted roster.
    ///
    /// # Errors
    /// - `EmptyRoster` when `names` is empty.
    /// - `DuplicateParticipant` / `InvalidParticipantName` from roster checks.
    /// - Store errors from `create`.
    pub fn create_session(
        &self,
        task_description: impl Into<String>,
        mode: EstimationModeId,
        names: &[String],
    ) -> SessionResult<Session> {
        if names.is_empty() {
            return Err(SessionError::EmptyRoster);
        }

        let session = mutate::new_session(
            generate_session_id(),
            task_description,
            mode,
            names.iter().cloned(),
            now_epoch_ms(),
        )?;
        self.store.create(&session).inspect_err(|err| {
            warn!("event=session_create module=service status=error error={err}");
        })?;

        info!(
            "event=session_create module=service status=ok session_id={} mode={} participants={}",
            session.id,
            mode.as_str(),
            session.participants.len()
        );
        Ok(session)
    }

    /// Reads a session and checks the viewer belongs to it.
    ///
    /// `viewer_name = None` opens the session view-only.
    pub fn open_session(
        &self,
        session_id: &str,
        viewer_name: Option<&str>,
    ) -> SessionResult<(SessionContext, Session)> {
        let session_id = normalize_session_id(session_id);
        let session = self.store.read(&session_id)?;

        if let Some(name) = viewer_name {
            if !session.has_participant(name) {
                return Err(SessionError::UnknownViewer {
                    session_id,
                    name: name.to_string(),
                });
            }
        }

        let context = SessionContext {
            session_id,
            viewer_name: viewer_name.map(str::to_string),
        };
        Ok((context, session))
    }

    /// Adds `name` to the roster and returns its participant context.
    pub fn join_session(&self, session_id: &str, name: &str) -> SessionResult<SessionContext> {
        let next = self.add_participant(session_id, name)?;
        Ok(SessionContext::participant(&next.id, name))
    }

    /// Adds an unsubmitted participant to a stored session.
    pub fn add_participant(&self, session_id: &str, name: &str) -> SessionResult<Session> {
        let current = self.store.read(&normalize_session_id(session_id))?;
        let next = mutate::add_participant(&current, name)?;
        self.store.write(&next)?;

        info!(
            "event=session_join module=service status=ok session_id={} participants={}",
            next.id,
            next.participants.len()
        );
        Ok(next)
    }

    /// Records the context viewer's estimate and writes the new document.
    pub fn submit_estimate(&self, context: &SessionContext, value: &str) -> SessionResult<Session> {
        let Some(name) = context.viewer_name.as_deref() else {
            return Err(SessionError::ViewOnly);
        };

        let current = self.store.read(&context.session_id)?;
        let next = mutate::submit_estimate(&current, name, value)?;
        self.store.write(&next)?;

        info!(
            "event=session_submit module=service status=ok session_id={} submitted={} participants={} all_submitted={}",
            next.id,
            next.submitted_count(),
            next.participants.len(),
            next.all_submitted
        );
        Ok(next)
    }

    /// Reads the current document and reconciles it for the context viewer.
    pub fn view(&self, context: &SessionContext) -> SessionResult<ViewModel> {
        let session = self.store.read(&context.session_id)?;
        Ok(compute_view_model(&session, context.viewer_name.as_deref()))
    }

    /// Subscribes to changes of the context's session.
    pub fn subscribe(&self, context: &SessionContext) -> SessionResult<Subscription> {
        Ok(self.store.subscribe(&context.session_id)?)
    }

    /// Deletes a session document.
    pub fn delete_session(&self, session_id: &str) -> SessionResult<()> {
        let session_id = normalize_session_id(session_id);
        self.store.delete(&session_id)?;
        info!("event=session_delete module=service status=ok session_id={session_id}");
        Ok(())
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}
