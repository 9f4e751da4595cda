mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::RecipeError;
use async_trait::async_trait;

/// Prefix images are stored under
pub const IMAGE_PREFIX: &str = "images/";

/// Durable key/value blob store. The sole source of truth for recipes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any previous value
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<(), RecipeError>;

    /// Fetch the value under `key`. Missing keys are `RecipeError::NotFound`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, RecipeError>;

    /// All keys starting with `prefix`, sorted
    async fn list(&self, prefix: &str) -> Result<Vec<String>, RecipeError>;
}

/// Storage key for a recipe document (flat namespace)
pub fn recipe_key(slug: &str) -> String {
    format!("{}.json", slug)
}

/// Storage key for a recipe's hero image
pub fn image_key(slug: &str) -> String {
    format!("{}{}.jpg", IMAGE_PREFIX, slug)
}

/// Whether a listed key names a recipe document rather than an image
pub fn is_recipe_key(key: &str) -> bool {
    key.ends_with(".json") && !key.contains('/')
}

/// Reject keys that could escape the store's namespace
pub(crate) fn validate_key(key: &str) -> Result<(), RecipeError> {
    if key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|part| part == ".." || part == ".")
    {
        return Err(RecipeError::Storage(format!("invalid key '{}'", key)));
    }
    Ok(())
}
