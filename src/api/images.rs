use super::{recipe_error_response, AppState};
use crate::storage::IMAGE_PREFIX;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

pub async fn get_image(State(service): State<AppState>, Path(file): Path<String>) -> Response {
    let key = format!("{}{}", IMAGE_PREFIX, file);
    match service.get_image(&key).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/jpeg")], Bytes::from(bytes)).into_response(),
        Err(e) => recipe_error_response("Failed to fetch image", &e),
    }
}
