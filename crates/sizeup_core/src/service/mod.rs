//! Core use-case services.
//!
//! # Responsibility
//! - Reconcile session snapshots into view models (`reconcile`).
//! - Compute next documents for user actions (`mutate`).
//! - Orchestrate store round trips and per-viewer state (`session_service`,
//!   `viewer`).

pub mod mutate;
pub mod reconcile;
pub mod session_service;
pub mod viewer;
