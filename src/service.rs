use crate::cache::ReadCache;
use crate::error::RecipeError;
use crate::model::Recipe;
use crate::pipelines::{RecipeAssembler, SavedRecipe};
use crate::storage::ObjectStore;
use axum::body::Bytes;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// The save pipeline and the read cache, wired to one object store.
///
/// Every successful save evicts the affected cache entries before
/// returning, so no read after a save can see data cached before it.
pub struct RecipeService {
    assembler: RecipeAssembler,
    cache: ReadCache,
    store: Arc<dyn ObjectStore>,
}

impl RecipeService {
    pub(crate) fn new(
        assembler: RecipeAssembler,
        cache: ReadCache,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            assembler,
            cache,
            store,
        }
    }

    /// Capture, structure and store the recipe at `url`
    pub async fn save_recipe(&self, url: &str) -> Result<SavedRecipe, RecipeError> {
        let saved = self.assembler.assemble(url).await?;
        self.cache.invalidate_on_write(&saved.filename).await;
        Ok(saved)
    }

    /// Raw JSON of the recipe stored as `{name}.json`
    pub async fn get_recipe(&self, name: &str) -> Result<Bytes, RecipeError> {
        self.cache.get_recipe(&format!("{}.json", name)).await
    }

    /// All recipes, narrowed to `category` when it is non-empty
    pub async fn list_recipes(&self, category: Option<&str>) -> Result<Vec<Recipe>, RecipeError> {
        self.cache.list_recipes(category).await
    }

    /// Stored image bytes. Images are not cached.
    pub async fn get_image(&self, key: &str) -> Result<Vec<u8>, RecipeError> {
        self.store.get(key).await
    }

    /// Start periodic cache sweeps
    pub fn spawn_cache_sweepers(&self) -> Vec<JoinHandle<()>> {
        self.cache.spawn_sweepers()
    }
}
