//! Core domain logic for SizeUp collaborative estimation.
//! This crate is the single source of truth for session invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status, LogSettings, LoggingError};
pub use model::estimation::{
    get_mode, mode_by_id, EstimateOption, EstimationMode, EstimationModeId, ALL_MODES,
};
pub use model::input::{
    generate_session_id, is_valid_session_id, normalize_session_id, parse_participant_names,
};
pub use model::session::{Participant, Session, SessionId};
pub use service::mutate::{
    add_participant, new_session, submit_estimate, InvalidSubmission, MutationError,
    MutationResult,
};
pub use service::reconcile::{
    compute_view_model, DistributionBucket, EstimateSummary, Panel, ParticipantRow,
    ParticipantStatus, ViewModel, ViewerStatus,
};
pub use service::session_service::{SessionContext, SessionError, SessionResult, SessionService};
pub use service::viewer::{ViewerEvent, ViewerPhase, ViewerSession};
pub use store::{
    InMemorySessionStore, SessionEvent, SessionStore, SqliteSessionStore, StoreError, StoreResult,
    Subscription,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
