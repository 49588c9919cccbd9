use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use tracing::debug;
use utoipa::OpenApi;

use crate::entities::Role;
use crate::error::ServerError;
use crate::schemas::api::message::{CreateMessageRequest, MessageResponse};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(add_message, list_messages),
    components(schemas(CreateMessageRequest, MessageResponse))
)]
pub struct MessageApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/message/{token}", post(add_message).get(list_messages))
}

#[utoipa::path(
    post,
    path = "/api/message/{token}",
    tag = "messages",
    params(("token" = String, Path, description = "Session token")),
    request_body = CreateMessageRequest,
    responses(
        (status = 200, description = "Stored message", body = MessageResponse),
        (status = 400, description = "Invalid role or missing content"),
        (status = 404, description = "Session not found"),
        (status = 500, description = "Backend error"),
    )
)]
pub async fn add_message(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    payload: Result<Json<CreateMessageRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ServerError> {
    let Json(req) = payload.map_err(|e| {
        debug!(error = %e, "unusable message body");
        ServerError::BadRequest("Role must be 'user' or 'bot'".into())
    })?;
    let role: Role = req
        .role
        .as_deref()
        .and_then(|r| r.parse().ok())
        .ok_or_else(|| ServerError::BadRequest("Role must be 'user' or 'bot'".into()))?;
    let content = req
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ServerError::BadRequest("Content is required".into()))?;

    let message = state.history.record_turn(&token, role, &content).await?;
    Ok(Json(message.to_response()))
}

/// Durable messages of a session, oldest first. Does not consult the cache.
#[utoipa::path(
    get,
    path = "/api/message/{token}",
    tag = "messages",
    params(("token" = String, Path, description = "Session token")),
    responses(
        (status = 200, description = "Stored messages", body = Vec<MessageResponse>),
        (status = 404, description = "Session not found"),
        (status = 500, description = "Backend error"),
    )
)]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<Vec<MessageResponse>>, ServerError> {
    let messages = state.history.list_messages(&token).await?;
    Ok(Json(messages.iter().map(|m| m.to_response()).collect()))
}
