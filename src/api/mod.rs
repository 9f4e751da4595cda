pub mod images;
pub mod recipes;

use crate::{RecipeError, RecipeService};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::error;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Application state shared across all handlers
pub type AppState = Arc<RecipeService>;

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Every route the service exposes
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ping))
        .route("/save-recipe", post(recipes::save_recipe))
        .route("/get-recipe/{name}", get(recipes::get_recipe))
        .route("/get-recipes", get(recipes::list_recipes))
        .route("/images/{file}", get(images::get_image))
        .layer(cors())
        .with_state(state)
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

async fn ping() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Pong".to_string(),
    })
}

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Map a pipeline or storage failure onto an HTTP response
pub(crate) fn recipe_error_response(context: &str, err: &RecipeError) -> Response {
    match err {
        RecipeError::NotFound(key) => {
            error_response(StatusCode::NOT_FOUND, format!("{} not found", key))
        }
        _ => {
            error!("{}: {}", context, err);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{}: {}", context, err),
            )
        }
    }
}
