use super::{error_response, recipe_error_response, AppState};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct SaveRecipeRequest {
    /// Page to capture the recipe from
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveRecipeResponse {
    pub message: String,
    /// Storage key of the saved recipe
    pub filename: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListRecipesQuery {
    pub category: Option<String>,
}

pub async fn save_recipe(
    State(service): State<AppState>,
    request: Result<Json<SaveRecipeRequest>, JsonRejection>,
) -> Response {
    let url = match request {
        Ok(Json(request)) if !request.url.trim().is_empty() => request.url.trim().to_string(),
        _ => return error_response(StatusCode::BAD_REQUEST, "URL is required"),
    };

    if let Err(e) = reqwest::Url::parse(&url) {
        return error_response(StatusCode::BAD_REQUEST, format!("Invalid URL: {}", e));
    }

    match service.save_recipe(&url).await {
        Ok(saved) => {
            info!("Saved {} from {}", saved.filename, url);
            Json(SaveRecipeResponse {
                message: "Recipe saved successfully".to_string(),
                filename: saved.filename,
            })
            .into_response()
        }
        Err(e) => recipe_error_response("Failed to save recipe", &e),
    }
}

pub async fn get_recipe(State(service): State<AppState>, Path(name): Path<String>) -> Response {
    match service.get_recipe(&name).await {
        Ok(content) => ([(header::CONTENT_TYPE, "application/json")], content).into_response(),
        Err(e) => recipe_error_response("Failed to fetch recipe", &e),
    }
}

pub async fn list_recipes(
    State(service): State<AppState>,
    query: Result<Query<ListRecipesQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.body_text()),
    };
    match service.list_recipes(query.category.as_deref()).await {
        Ok(recipes) => Json(recipes).into_response(),
        Err(e) => recipe_error_response("Failed to list recipes", &e),
    }
}
