use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use photomesh_core::PhotomeshError;
use tracing::error;

/// A workflow error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub PhotomeshError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PhotomeshError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            PhotomeshError::NotFound(_) => StatusCode::NOT_FOUND,
            PhotomeshError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            PhotomeshError::Config(_)
            | PhotomeshError::Serialization(_)
            | PhotomeshError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PhotomeshError> for ApiError {
    fn from(err: PhotomeshError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self.0, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}
