pub mod chat;
pub mod message;
pub mod news;
pub mod session;

use crate::state::AppState;
use utoipa::OpenApi;

use axum::Router;
use std::sync::Arc;

/// Routes nested under `/api`.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(session::router())
        .merge(chat::router())
        .merge(message::router())
        .merge(news::router())
}

#[derive(OpenApi)]
#[openapi()]
pub struct Api;

pub fn api_docs() -> utoipa::openapi::OpenApi {
    let mut doc = Api::openapi();
    doc.merge(session::SessionApi::openapi());
    doc.merge(chat::ChatApi::openapi());
    doc.merge(message::MessageApi::openapi());
    doc.merge(news::NewsApi::openapi());
    doc
}
