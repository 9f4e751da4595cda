use crate::error::RecipeError;
use crate::model::{slugify, CompletionResult, Recipe};
use crate::providers::{build_extraction_prompt, StructuredCompletion, EXTRACTION_SYSTEM_PROMPT};
use crate::storage::{image_key, recipe_key, ObjectStore};
use crate::url_to_text::fetchers::{PageCapture, RequestFetcher};
use crate::url_to_text::text::TextExtractor;
use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Token budget for one extraction call
pub const DEFAULT_MAX_TOKENS: u32 = 16384;

/// Progress of one save. Terminal on the first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Captured,
    Extracted,
    Completed,
    ImageFetched,
    Stored,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Captured => "captured",
            Stage::Extracted => "extracted",
            Stage::Completed => "completed",
            Stage::ImageFetched => "image fetched",
            Stage::Stored => "stored",
        };
        f.write_str(name)
    }
}

/// A recipe that has been written to the object store
#[derive(Debug, Clone, PartialEq)]
pub struct SavedRecipe {
    pub recipe: Recipe,
    /// Storage key of the recipe document, `{slug}.json`
    pub filename: String,
}

/// Runs capture, text extraction and structured completion for a URL, then
/// writes the image and recipe to the object store.
///
/// Nothing is written until every fatal step has succeeded.
pub struct RecipeAssembler {
    capture: Arc<dyn PageCapture>,
    completion: Arc<dyn StructuredCompletion>,
    images: RequestFetcher,
    store: Arc<dyn ObjectStore>,
    public_base_url: String,
    max_tokens: u32,
}

impl RecipeAssembler {
    pub fn new(
        capture: Arc<dyn PageCapture>,
        completion: Arc<dyn StructuredCompletion>,
        images: RequestFetcher,
        store: Arc<dyn ObjectStore>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            capture,
            completion,
            images,
            store,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Public URL an image stored under `key` resolves to
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    pub async fn assemble(&self, url: &str) -> Result<SavedRecipe, RecipeError> {
        let mut stage = Stage::Idle;
        let result = self.run(url, &mut stage).await;
        if let Err(e) = &result {
            warn!("Saving {} failed after stage '{}': {}", url, stage, e);
        }
        result
    }

    async fn run(&self, url: &str, stage: &mut Stage) -> Result<SavedRecipe, RecipeError> {
        let page = self.capture.capture(url).await?;
        *stage = Stage::Captured;

        let text = TextExtractor::extract(&page.html)?;
        *stage = Stage::Extracted;
        debug!("Extracted {} characters of text from {}", text.len(), url);

        let prompt = build_extraction_prompt(&text);
        let before = Instant::now();
        let completion = self
            .completion
            .complete(&prompt, EXTRACTION_SYSTEM_PROMPT, self.max_tokens)
            .await?;
        info!(
            "Time to call AI: {:?} ({} via {}, {} tokens)",
            before.elapsed(),
            completion.id,
            completion.model,
            completion.usage.total_tokens
        );
        *stage = Stage::Completed;

        let slug = slugify(&completion.recipe.title);
        if slug.is_empty() {
            return Err(RecipeError::Completion(format!(
                "Model returned an unusable title: {:?}",
                completion.recipe.title
            )));
        }
        let filename = recipe_key(&slug);
        info!("Saving {} as {}", url, filename);

        let image = match page.image_url.as_deref() {
            Some(image_url) => match self.images.fetch_image(image_url).await {
                Ok(bytes) => Some(bytes),
                Err(e) if !e.is_fatal() => {
                    warn!("Error downloading image {}: {}", image_url, e);
                    None
                }
                Err(e) => return Err(e),
            },
            None => {
                info!("No image found on {}", url);
                None
            }
        };
        *stage = Stage::ImageFetched;

        let image_url = match image {
            Some(bytes) => self.store_image(&slug, bytes).await,
            None => String::new(),
        };

        let recipe = build_recipe(completion, url, &slug, image_url);
        let json = serde_json::to_vec(&recipe)
            .map_err(|e| RecipeError::Storage(format!("Failed to serialize recipe: {}", e)))?;
        self.store.put(&filename, "application/json", json).await?;
        *stage = Stage::Stored;

        Ok(SavedRecipe { recipe, filename })
    }

    /// Upload image bytes, returning the public URL or an empty string if
    /// the upload failed.
    async fn store_image(&self, slug: &str, bytes: Vec<u8>) -> String {
        let key = image_key(slug);
        match self.store.put(&key, "image/jpeg", bytes).await {
            Ok(()) => self.public_url(&key),
            Err(e) => {
                warn!("Error uploading image {}: {}", key, e);
                String::new()
            }
        }
    }
}

fn build_recipe(completion: CompletionResult, url: &str, slug: &str, image: String) -> Recipe {
    let payload = completion.recipe;
    Recipe {
        link: format!("/recipes/{}/{}", payload.category, slug),
        category: payload.category,
        cook_time: payload.cook_time,
        date: chrono::Utc::now().to_rfc3339(),
        image,
        ingredients: payload.ingredients,
        instructions: payload.instructions,
        prep_time: payload.prep_time,
        // A recipe serves at least one
        servings: payload.servings.max(1),
        title: payload.title,
        total_time: payload.total_time,
        original_url: url.to_string(),
    }
}
