//! Model generation service for Photomesh.
//!
//! The workflow controller only sees [`ModelGenerator`]. Concrete backends:
//!
//! - [`StubGenerator`] — fixed delay plus a deterministic placeholder artifact.
//! - [`HttpGenerator`] — JSON-over-HTTP client for a remote image-to-3D service.
//! - [`RetryingGenerator`] — wraps any backend with exponential-backoff retries.
//!
//! [`build_generator`] picks one from a [`GeneratorConfig`].

/// Backend selection and construction.
pub mod config;
/// Networked backend.
pub mod http;
/// Retry decorator.
pub mod retry;
/// Deterministic stand-in backend.
pub mod stub;

pub use config::{build_generator, GeneratorConfig, GeneratorProvider};
pub use http::HttpGenerator;
pub use retry::{is_retryable, RetryPolicy, RetryingGenerator};
pub use stub::StubGenerator;

use async_trait::async_trait;
use photomesh_core::PhotomeshResult;
use serde::{Deserialize, Serialize};

/// Result of an edit: the regenerated model and the (possibly edited) images
/// it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOutcome {
    pub model_reference: String,
    pub images: Vec<String>,
}

/// Image-to-3D collaborator.
///
/// Calls may take seconds; implementations must suspend rather than block the
/// runtime so other sessions keep progressing. Failures are reported as
/// [`photomesh_core::PhotomeshError::ExternalService`].
#[async_trait]
pub trait ModelGenerator: Send + Sync {
    /// Synthesise an initial model from the uploaded images.
    async fn generate_initial(&self, images: &[String]) -> PhotomeshResult<String>;

    /// Apply `prompt` to the images and regenerate the model.
    ///
    /// `step_index` is the history position the result will occupy.
    async fn generate_edit(
        &self,
        images: &[String],
        prompt: &str,
        step_index: usize,
    ) -> PhotomeshResult<EditOutcome>;
}
