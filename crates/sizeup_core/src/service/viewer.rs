//! Per-viewer session state machine.
//!
//! # Responsibility
//! - Hold the explicit `SessionContext`, the single live subscription and
//!   the latest view model for one viewer.
//! - Gate user actions on the current phase.
//!
//! # Invariants
//! - At most one subscription is alive; loading a session cancels the
//!   previous one first.
//! - `submit` is only accepted in `Estimating`.
//! - `leave` always returns to `NoSession` and can be followed by `load`.

use crate::model::session::Session;
use crate::service::reconcile::{compute_view_model, Panel, ViewModel};
use crate::service::session_service::{SessionContext, SessionError, SessionResult, SessionService};
use crate::store::{SessionEvent, SessionStore, Subscription};
use log::{debug, warn};

/// Viewer lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerPhase {
    NoSession,
    Estimating,
    Waiting,
    Results,
}

impl ViewerPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoSession => "no_session",
            Self::Estimating => "estimating",
            Self::Waiting => "waiting",
            Self::Results => "results",
        }
    }
}

impl From<Panel> for ViewerPhase {
    fn from(value: Panel) -> Self {
        match value {
            Panel::Estimating => Self::Estimating,
            Panel::Waiting => Self::Waiting,
            Panel::Results => Self::Results,
        }
    }
}

/// Outcome of one pushed store event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    /// View model re-rendered; holds the resulting phase.
    Updated(ViewerPhase),
    /// Session disappeared; the viewer is back in `NoSession`.
    SessionEnded,
    /// Subscription reported an error; the last view is kept.
    Failed(String),
}

struct ActiveSession {
    context: SessionContext,
    subscription: Subscription,
    view: ViewModel,
}

/// State machine for one viewer.
#[derive(Default)]
pub struct ViewerSession {
    active: Option<ActiveSession>,
}

impl ViewerSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ViewerPhase {
        self.active
            .as_ref()
            .map_or(ViewerPhase::NoSession, |active| active.view.panel.into())
    }

    pub fn context(&self) -> Option<&SessionContext> {
        self.active.as_ref().map(|active| &active.context)
    }

    pub fn view(&self) -> Option<&ViewModel> {
        self.active.as_ref().map(|active| &active.view)
    }

    /// Subscribes to `context`'s session and renders its first snapshot.
    ///
    /// Any previous session is left first, so its subscription is cancelled
    /// even when this load fails.
    pub fn load<S: SessionStore>(
        &mut self,
        service: &SessionService<S>,
        context: SessionContext,
    ) -> SessionResult<ViewerPhase> {
        self.leave();

        let subscription = service.subscribe(&context)?;
        let session = match subscription.try_next() {
            Some(SessionEvent::Changed(session)) => session,
            Some(SessionEvent::Failed(message)) => {
                return Err(SessionError::SubscriptionFailed(message));
            }
            Some(SessionEvent::Deleted) | None => {
                return Err(SessionError::NotFound(context.session_id));
            }
        };

        let view = render(&context, &session);
        let phase: ViewerPhase = view.panel.into();
        self.active = Some(ActiveSession {
            context,
            subscription,
            view,
        });
        debug!("event=viewer_load module=viewer status=ok phase={}", phase.as_str());
        Ok(phase)
    }

    /// Applies every queued store event, oldest first.
    pub fn poll(&mut self) -> Vec<ViewerEvent> {
        let Some(active) = self.active.as_mut() else {
            return Vec::new();
        };

        let mut outcomes = Vec::new();
        let mut ended = false;
        for event in active.subscription.drain() {
            match event {
                SessionEvent::Changed(session) => {
                    active.view = render(&active.context, &session);
                    outcomes.push(ViewerEvent::Updated(active.view.panel.into()));
                }
                SessionEvent::Failed(message) => {
                    warn!("event=viewer_poll module=viewer status=error error={message}");
                    outcomes.push(ViewerEvent::Failed(message));
                }
                SessionEvent::Deleted => {
                    outcomes.push(ViewerEvent::SessionEnded);
                    ended = true;
                    break;
                }
            }
        }
        if ended {
            self.leave();
        }
        outcomes
    }

    /// Submits the viewer's estimate and re-renders from the new document.
    pub fn submit<S: SessionStore>(
        &mut self,
        service: &SessionService<S>,
        value: &str,
    ) -> SessionResult<ViewerPhase> {
        let phase = self.phase();
        match self.active.as_mut() {
            Some(active) if phase == ViewerPhase::Estimating => {
                let next = service.submit_estimate(&active.context, value)?;
                active.view = render(&active.context, &next);
                Ok(active.view.panel.into())
            }
            _ => Err(SessionError::InvalidTransition {
                phase,
                action: "submit",
            }),
        }
    }

    /// Drops the subscription and returns to `NoSession`.
    pub fn leave(&mut self) {
        if let Some(active) = self.active.take() {
            debug!("event=viewer_leave module=viewer status=ok");
            active.subscription.unsubscribe();
        }
    }
}

fn render(context: &SessionContext, session: &Session) -> ViewModel {
    compute_view_model(session, context.viewer_name.as_deref())
}
