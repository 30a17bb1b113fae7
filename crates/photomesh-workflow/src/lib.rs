//! Session workflow for Photomesh.
//!
//! [`WorkflowController`] sequences calls to the model generation service and
//! records the results in the session store. Per-session state is derived from
//! the stored history as a [`WorkflowState`].

/// The controller.
pub mod controller;
/// Derived per-session state.
pub mod state;

pub use controller::WorkflowController;
pub use state::WorkflowState;
