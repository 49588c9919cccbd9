use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use tracing::{debug, info};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::api::chat::{ChatRequest, ChatResponse};
use crate::schemas::api::message::MessageResponse;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(chat),
    components(schemas(ChatRequest, ChatResponse, MessageResponse))
)]
pub struct ChatApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/chat/{token}", post(chat))
}

/// Answer a question from the indexed news and record the exchange.
///
/// The session is resolved before any provider is called, and nothing is
/// stored unless the whole pipeline succeeds.
#[utoipa::path(
    post,
    path = "/api/chat/{token}",
    tag = "chat",
    params(("token" = String, Path, description = "Session token")),
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Answer and the two stored turns", body = ChatResponse),
        (status = 400, description = "Query missing"),
        (status = 404, description = "Session not found"),
        (status = 500, description = "Embedding, search, generation or store failure"),
    )
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ServerError> {
    let query = payload
        .inspect_err(|e| debug!(error = %e, "unusable chat body"))
        .ok()
        .and_then(|Json(req)| req.query)
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ServerError::BadRequest("Query is required".into()))?;

    state.history.resolve_session(&token).await?;
    let answer = state.pipeline.answer(&query).await?;
    let (user, bot) = state.history.record_exchange(&token, &query, &answer).await?;

    info!(session = %token, answer_len = answer.len(), "chat turn recorded");
    Ok(Json(ChatResponse {
        answer,
        messages: vec![user.to_response(), bot.to_response()],
    }))
}
