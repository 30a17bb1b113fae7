use thiserror::Error;

/// A convenience `Result` alias using [`PhotomeshError`].
pub type PhotomeshResult<T> = Result<T, PhotomeshError>;

/// Top-level error type for Photomesh.
///
/// The first three variants are the workflow taxonomy surfaced to clients;
/// the rest are infrastructure failures.
#[derive(Error, Debug)]
pub enum PhotomeshError {
    /// Operation preconditions were violated (e.g. generating with no images).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A session required to exist was never created.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The model generation service failed or timed out.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Configuration could not be parsed or is inconsistent.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PhotomeshError {
    /// True for errors caused by the caller rather than by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_) | Self::NotFound(_))
    }
}
