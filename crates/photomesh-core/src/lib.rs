//! Core types and error definitions for Photomesh.
//!
//! This crate provides the foundational types shared by every Photomesh crate:
//! validated session identifiers, history records, and the unified error type.
//!
//! # Main types
//!
//! - [`PhotomeshError`] — Unified error enum for all Photomesh subsystems.
//! - [`PhotomeshResult`] — Convenience alias for `Result<T, PhotomeshError>`.
//! - [`SessionId`] — Validated, path-safe session identifier.
//! - [`Step`] — One recorded outcome of initial generation or an edit.
//! - [`StepKind`] — Whether a step came from initial generation or an edit.

/// Error type shared across crates.
pub mod error;
/// Validated session identifiers.
pub mod id;
/// History records.
pub mod step;

pub use error::{PhotomeshError, PhotomeshResult};
pub use id::SessionId;
pub use step::{Step, StepKind};
