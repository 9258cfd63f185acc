//! Session document model.
//!
//! # Responsibility
//! - Define the shared document every viewer reconciles against.
//! - Keep the cached `all_submitted` flag derivable from the roster.
//!
//! # Invariants
//! - Participant names are unique, case-sensitive keys of `participants`.
//! - `all_submitted` equals "every participant submitted" after any helper
//!   in this module mutates the roster; an empty roster counts as submitted.
//! - Participants are never removed.

use crate::model::estimation::{get_mode, EstimationMode, EstimationModeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Session document key.
///
/// Kept as a type alias because documents created by other clients may use
/// any string as their id.
pub type SessionId = String;

/// One roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    /// Chosen option value, `None` until the first submission.
    pub estimate: Option<String>,
    pub submitted: bool,
}

impl Participant {
    /// Creates an unsubmitted participant.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            estimate: None,
            submitted: false,
        }
    }
}

/// Shared estimation document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub id: SessionId,
    pub task_description: String,
    /// Raw mode identifier; resolved through `get_mode` so unknown values
    /// degrade to the default scale instead of failing to load.
    #[serde(default, alias = "estimationType")]
    pub estimation_mode: Option<String>,
    #[serde(default)]
    pub participants: BTreeMap<String, Participant>,
    /// Cached copy of "every participant submitted".
    #[serde(default)]
    pub all_submitted: bool,
    /// Unix epoch milliseconds.
    #[serde(default)]
    pub created_at: i64,
}

impl Session {
    /// Creates an empty-roster session.
    pub fn new(
        id: impl Into<SessionId>,
        task_description: impl Into<String>,
        mode: EstimationModeId,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            task_description: task_description.into(),
            estimation_mode: Some(mode.as_str().to_string()),
            participants: BTreeMap::new(),
            all_submitted: true,
            created_at,
        }
    }

    /// Resolved estimation mode for this document.
    pub fn mode(&self) -> &'static EstimationMode {
        get_mode(self.estimation_mode.as_deref())
    }

    /// Looks up one participant by exact name.
    pub fn participant(&self, name: &str) -> Option<&Participant> {
        self.participants.get(name)
    }

    /// Returns whether `name` is already on the roster.
    pub fn has_participant(&self, name: &str) -> bool {
        self.participants.contains_key(name)
    }

    /// Derives "every participant submitted" from the roster.
    pub fn every_participant_submitted(&self) -> bool {
        self.participants.values().all(|participant| participant.submitted)
    }

    /// Refreshes the cached `all_submitted` flag.
    pub fn recompute_all_submitted(&mut self) {
        self.all_submitted = self.every_participant_submitted();
    }

    /// Number of participants that have submitted.
    pub fn submitted_count(&self) -> usize {
        self.participants
            .values()
            .filter(|participant| participant.submitted)
            .count()
    }

    /// Number of participants still pending.
    pub fn pending_count(&self) -> usize {
        self.participants.len() - self.submitted_count()
    }
}
