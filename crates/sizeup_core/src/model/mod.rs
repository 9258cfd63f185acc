//! Domain model for estimation sessions.
//!
//! # Responsibility
//! - Define the estimation catalog and the shared session document.
//! - Normalize identifiers and roster input before they reach services.
//!
//! # Invariants
//! - A session is the only root; participants are embedded in it.
//! - Catalog data is immutable for the process lifetime.

pub mod estimation;
pub mod input;
pub mod session;
