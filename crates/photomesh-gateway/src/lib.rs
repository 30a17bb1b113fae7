//! HTTP surface for Photomesh.
//!
//! Routes camera uploads and client workflow requests to the
//! [`photomesh_workflow::WorkflowController`], stores uploaded bytes under a
//! static root, and serves stored artifacts back.

/// Mapping of workflow errors to HTTP responses.
pub mod error;
/// Request handlers.
pub mod handlers;
/// CORS handling.
pub mod middleware;
/// Router construction.
pub mod server;
/// On-disk artifact storage under the static root.
pub mod storage;

pub use error::ApiError;
pub use server::{GatewayOptions, GatewayServer};
pub use storage::ArtifactStorage;
