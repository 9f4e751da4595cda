use thiserror::Error;

/// Errors that can occur while saving or reading recipes
#[derive(Error, Debug)]
pub enum RecipeError {
    /// Browser launch, navigation or DOM read failed
    #[error("Failed to capture page: {0}")]
    Capture(String),

    /// Captured document could not be turned into prose
    #[error("Failed to parse page: {0}")]
    Parse(String),

    /// LLM call failed or its output did not match the response schema
    #[error("Completion failed: {0}")]
    Completion(String),

    /// Hero image could not be downloaded. Never fatal to a save.
    #[error("Failed to fetch image: {0}")]
    ImageFetch(String),

    /// Object store put/get/list failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Object store has no value under the key
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Response schema file missing or malformed
    #[error("Invalid response schema: {0}")]
    Schema(String),

    /// Builder configuration error
    #[error("Builder error: {0}")]
    Builder(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl RecipeError {
    /// Whether the error aborts a save. Only image fetches are tolerated.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RecipeError::ImageFetch(_))
    }
}
