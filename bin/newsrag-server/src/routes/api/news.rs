use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tracing::debug;
use utoipa::OpenApi;

use crate::entities::{ArticleStore, NewArticle};
use crate::error::ServerError;
use crate::schemas::api::news::{ArticleResponse, CreateArticleRequest};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(create_article, list_articles, get_article, delete_article),
    components(schemas(CreateArticleRequest, ArticleResponse))
)]
pub struct NewsApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/news", post(create_article).get(list_articles))
        .route("/news/{id}", get(get_article).delete(delete_article))
}

// ── Article handlers ──────────────────────────────────────────────────────────
// Stored articles reach the vector index through the `embed-news` command.

#[utoipa::path(
    post,
    path = "/api/news",
    tag = "news",
    request_body = CreateArticleRequest,
    responses(
        (status = 201, description = "Article stored", body = ArticleResponse),
        (status = 400, description = "Title or content missing"),
        (status = 500, description = "Backend error"),
    )
)]
pub async fn create_article(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateArticleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ArticleResponse>), ServerError> {
    let Json(req) = payload.map_err(|e| {
        debug!(error = %e, "unusable article body");
        ServerError::BadRequest("Title and content are required".into())
    })?;
    let required = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let (Some(title), Some(content)) = (required(req.title), required(req.content)) else {
        return Err(ServerError::BadRequest("Title and content are required".into()));
    };
    let article = state
        .store
        .create_article(NewArticle {
            title,
            content,
            url: req.url.filter(|u| !u.trim().is_empty()),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(article.to_response())))
}

#[utoipa::path(
    get,
    path = "/api/news",
    tag = "news",
    responses(
        (status = 200, description = "Articles, newest first", body = Vec<ArticleResponse>),
        (status = 404, description = "No articles stored"),
        (status = 500, description = "Backend error"),
    )
)]
pub async fn list_articles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ArticleResponse>>, ServerError> {
    let articles = state.store.list_articles().await?;
    if articles.is_empty() {
        return Err(ServerError::NotFound("No articles found".into()));
    }
    Ok(Json(articles.iter().map(|a| a.to_response()).collect()))
}

#[utoipa::path(
    get,
    path = "/api/news/{id}",
    tag = "news",
    params(("id" = i64, Path, description = "Article id")),
    responses(
        (status = 200, description = "Article", body = ArticleResponse),
        (status = 404, description = "Article not found"),
        (status = 500, description = "Backend error"),
    )
)]
pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ArticleResponse>, ServerError> {
    state
        .store
        .get_article(id)
        .await?
        .map(|a| Json(a.to_response()))
        .ok_or_else(|| ServerError::NotFound("Article not found".into()))
}

#[utoipa::path(
    delete,
    path = "/api/news/{id}",
    tag = "news",
    params(("id" = i64, Path, description = "Article id")),
    responses(
        (status = 200, description = "Article deleted", body = Value),
        (status = 404, description = "Article not found"),
        (status = 500, description = "Backend error"),
    )
)]
pub async fn delete_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ServerError> {
    if !state.store.delete_article(id).await? {
        return Err(ServerError::NotFound("Article not found".into()));
    }
    Ok(Json(json!({ "message": "Article deleted" })))
}
