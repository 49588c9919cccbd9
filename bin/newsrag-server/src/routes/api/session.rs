use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::ServerError;
use crate::schemas::api::session::{
    HistoryEntryResponse, SessionClearedResponse, SessionHistoryResponse, SessionStartResponse,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(start_session, get_session, clear_session),
    components(schemas(
        SessionStartResponse,
        SessionHistoryResponse,
        HistoryEntryResponse,
        SessionClearedResponse
    ))
)]
pub struct SessionApi;

/// Register session routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/session/start", post(start_session))
        .route("/session/{token}", get(get_session).delete(clear_session))
}

// ── Session handlers ──────────────────────────────────────────────────────────

#[utoipa::path(
    post,
    path = "/api/session/start",
    tag = "sessions",
    responses(
        (status = 201, description = "Session created", body = SessionStartResponse),
        (status = 500, description = "Session cache could not be initialised"),
    )
)]
pub async fn start_session(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<SessionStartResponse>), ServerError> {
    let token = Uuid::new_v4().to_string();
    let session = state.history.create_session(&token).await?;
    Ok((StatusCode::CREATED, Json(session.to_response())))
}

#[utoipa::path(
    get,
    path = "/api/session/{token}",
    tag = "sessions",
    params(("token" = String, Path, description = "Session token")),
    responses(
        (status = 200, description = "Conversation history", body = SessionHistoryResponse),
        (status = 404, description = "Session not found"),
        (status = 500, description = "Backend error"),
    )
)]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<SessionHistoryResponse>, ServerError> {
    let entries = state.history.read_history(&token).await?;
    Ok(Json(SessionHistoryResponse {
        session_token: token,
        messages: entries.iter().map(|e| e.to_response()).collect(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/session/{token}",
    tag = "sessions",
    params(("token" = String, Path, description = "Session token")),
    responses(
        (status = 200, description = "Session cleared", body = SessionClearedResponse),
        (status = 404, description = "Session not found"),
        (status = 500, description = "Backend error"),
    )
)]
pub async fn clear_session(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<SessionClearedResponse>, ServerError> {
    state.history.clear_session(&token).await?;
    Ok(Json(SessionClearedResponse {
        message: "Session cleared".into(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::entities::Role;
    use crate::routes::testing::{call, state};

    #[tokio::test]
    async fn start_read_clear_cycle() {
        let state = state().await;

        let (status, started) = call(&state, Method::POST, "/api/session/start", None).await;
        assert_eq!(status, StatusCode::CREATED);
        let token = started["sessionToken"].as_str().unwrap().to_owned();
        assert!(started["createdAt"].is_string());

        let (status, history) = call(&state, Method::GET, &format!("/api/session/{token}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history["sessionToken"], token.as_str());
        assert_eq!(history["messages"], serde_json::json!([]));

        state.history.record_turn(&token, Role::User, "hello").await.unwrap();
        let (_, history) = call(&state, Method::GET, &format!("/api/session/{token}"), None).await;
        assert_eq!(history["messages"][0]["role"], "user");
        assert_eq!(history["messages"][0]["content"], "hello");

        let (status, body) = call(&state, Method::DELETE, &format!("/api/session/{token}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Session cleared");

        let (status, body) = call(&state, Method::GET, &format!("/api/session/{token}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Session not found");
    }

    #[tokio::test]
    async fn clearing_an_unknown_session_is_404() {
        let state = state().await;
        let (status, _) = call(&state, Method::DELETE, "/api/session/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
