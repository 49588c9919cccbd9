//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are automatically converted
//! to a JSON-body HTTP response with an appropriate status code.
//!
//! **Security note:** pipeline, cache and database failures are logged with
//! full detail but the client only receives a generic message, so upstream
//! response bodies, SQL and connection strings never leak.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use newsrag_core::RagError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::history::HistoryError;

/// All errors that can occur in the newsrag-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Propagated from the conversation history store.
    #[error(transparent)]
    History(#[from] HistoryError),

    /// The retrieve-and-answer pipeline failed at one of its stages.
    #[error(transparent)]
    Rag(#[from] RagError),

    /// Propagated from the durable store outside the history layer.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The caller referenced a resource that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// An unclassified internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            // Client-facing errors: expose the message directly.
            ServerError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::History(HistoryError::SessionNotFound(_)) => {
                (StatusCode::NOT_FOUND, "Session not found".to_owned())
            }

            // Internal errors: log the full detail, return a generic message.
            ServerError::History(e @ HistoryError::Cache(_)) => {
                error!(error = %e, "session cache initialisation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to initialize session cache".to_owned(),
                )
            }
            ServerError::History(e) => {
                error!(error = %e, "history store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
            ServerError::Rag(e) => {
                error!(stage = e.stage(), error = %e, "retrieve-and-answer failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to process chat".to_owned(),
                )
            }
            ServerError::Database(e) => {
                error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
            ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(e: anyhow::Error) -> Self {
        error!(error = ?e, "converting anyhow error to ServerError::Internal");
        ServerError::Internal(e.to_string())
    }
}
