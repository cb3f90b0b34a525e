//! HTTP error responses.
//!
//! Wraps [`RagError`] so every handler can use `?` and still produce a
//! structured JSON body carrying the error kind and message.

use askdocs_rag::error::RagError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

/// A pipeline error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub RagError);

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        Self(err)
    }
}

/// Wire name of the error kind, stable for clients.
fn kind(err: &RagError) -> &'static str {
    match err {
        RagError::InvalidArgument(_) => "invalid_argument",
        RagError::NotFound(_) => "not_found",
        RagError::VectorStoreUnavailable { .. } => "vector_store_unavailable",
        RagError::Generation { .. } => "generation_error",
        RagError::Embedding { .. } => "embedding_error",
        RagError::Config(_) => "configuration_error",
    }
}

fn status(err: &RagError) -> StatusCode {
    match err {
        RagError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        RagError::NotFound(_) => StatusCode::NOT_FOUND,
        // Retryable: the store is down, not the request wrong.
        RagError::VectorStoreUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        RagError::Generation { .. } => StatusCode::BAD_GATEWAY,
        RagError::Embedding { .. } => StatusCode::BAD_GATEWAY,
        RagError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status(&self.0);
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        } else {
            warn!(error = %self.0, "request rejected");
        }
        let body = json!({
            "error": kind(&self.0),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

/// Shorthand for a 400 without threading through `RagError` construction.
pub fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError(RagError::InvalidArgument(message.into()))
}
