use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheSettings, ReadCache};
use crate::config::{AppConfig, CaptureMode, StorageBackend};
use crate::pipelines::{RecipeAssembler, DEFAULT_MAX_TOKENS};
use crate::providers::{OpenAIProvider, ResponseSchema, StructuredCompletion};
use crate::storage::{FileStore, MemoryStore, ObjectStore};
use crate::url_to_text::fetchers::{ChromeFetcher, PageCapture, RequestFetcher};
use crate::{RecipeError, RecipeService};

/// Builder for wiring a [`RecipeService`] from its parts
pub struct RecipeServiceBuilder {
    capture: Option<Arc<dyn PageCapture>>,
    completion: Option<Arc<dyn StructuredCompletion>>,
    store: Option<Arc<dyn ObjectStore>>,
    public_base_url: Option<String>,
    cache: CacheSettings,
    max_tokens: u32,
    image_timeout: Option<Duration>,
}

impl Default for RecipeServiceBuilder {
    fn default() -> Self {
        Self {
            capture: None,
            completion: None,
            store: None,
            public_base_url: None,
            cache: CacheSettings::default(),
            max_tokens: DEFAULT_MAX_TOKENS,
            image_timeout: None,
        }
    }
}

impl RecipeServiceBuilder {
    /// Set how pages are captured
    ///
    /// # Example
    /// ```
    /// use recipe_saver::url_to_text::fetchers::RequestFetcher;
    /// use recipe_saver::RecipeService;
    ///
    /// let builder = RecipeService::builder()
    ///     .capture(RequestFetcher::new(None).unwrap());
    /// ```
    pub fn capture(mut self, capture: impl PageCapture + 'static) -> Self {
        self.capture = Some(Arc::new(capture));
        self
    }

    /// Set the structured completion client
    pub fn completion(mut self, completion: impl StructuredCompletion + 'static) -> Self {
        self.completion = Some(Arc::new(completion));
        self
    }

    /// Set the object store recipes and images are written to
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use recipe_saver::storage::MemoryStore;
    /// use recipe_saver::RecipeService;
    ///
    /// let builder = RecipeService::builder()
    ///     .store(Arc::new(MemoryStore::new()));
    /// ```
    pub fn store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the base URL stored images are publicly served from
    pub fn public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = Some(url.into());
        self
    }

    /// Set cache lifetimes
    pub fn cache_settings(mut self, settings: CacheSettings) -> Self {
        self.cache = settings;
        self
    }

    /// Set the token budget for each extraction call
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set a timeout for hero image downloads
    pub fn image_timeout(mut self, duration: Duration) -> Self {
        self.image_timeout = Some(duration);
        self
    }

    /// Assemble the service
    ///
    /// # Errors
    /// Returns `RecipeError::Builder` if the capture, completion or store
    /// component was not set, or if no public base URL was given.
    pub fn build(self) -> Result<RecipeService, RecipeError> {
        let capture = self
            .capture
            .ok_or_else(|| RecipeError::Builder("No page capture specified".to_string()))?;
        let completion = self.completion.ok_or_else(|| {
            RecipeError::Builder("No completion client specified".to_string())
        })?;
        let store = self
            .store
            .ok_or_else(|| RecipeError::Builder("No object store specified".to_string()))?;
        let public_base_url = self
            .public_base_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| RecipeError::Builder("No public base URL specified".to_string()))?;

        let images = RequestFetcher::new(self.image_timeout)?;
        let assembler = RecipeAssembler::new(
            capture,
            completion,
            images,
            store.clone(),
            public_base_url,
        )
        .with_max_tokens(self.max_tokens);
        let cache = ReadCache::new(store.clone(), self.cache);

        Ok(RecipeService::new(assembler, cache, store))
    }
}

impl RecipeService {
    /// Creates a new builder for wiring the service
    pub fn builder() -> RecipeServiceBuilder {
        RecipeServiceBuilder::default()
    }

    /// Wire the production components described by `config`.
    ///
    /// Reads the response schema from `openai.schema_path`.
    pub fn from_config(config: &AppConfig) -> Result<Self, RecipeError> {
        let schema = ResponseSchema::from_file(&config.openai.schema_path)?;
        let completion = OpenAIProvider::new(&config.openai, schema)?;

        let store: Arc<dyn ObjectStore> = match config.storage.backend {
            StorageBackend::Filesystem => Arc::new(FileStore::new(&config.storage.root)),
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
        };

        let builder = Self::builder()
            .completion(completion)
            .store(store)
            .public_base_url(config.storage.public_base_url.clone())
            .cache_settings(CacheSettings::from(&config.cache))
            .max_tokens(config.openai.max_tokens)
            .image_timeout(config.browser.timeout());

        let builder = match config.browser.mode {
            CaptureMode::Chrome => builder.capture(ChromeFetcher::new(
                config.browser.chrome_path.clone(),
                config.browser.timeout(),
            )),
            CaptureMode::Request => {
                builder.capture(RequestFetcher::new(Some(config.browser.timeout()))?)
            }
        };

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenAiConfig;

    #[test]
    fn test_build_without_capture() {
        let result = RecipeService::builder()
            .store(Arc::new(MemoryStore::new()))
            .public_base_url("https://img.example.com")
            .build();

        match result {
            Err(RecipeError::Builder(msg)) => assert!(msg.contains("page capture")),
            _ => panic!("Expected BuilderError"),
        }
    }

    #[test]
    fn test_build_without_completion() {
        let result = RecipeService::builder()
            .capture(RequestFetcher::new(None).unwrap())
            .store(Arc::new(MemoryStore::new()))
            .public_base_url("https://img.example.com")
            .build();

        match result {
            Err(RecipeError::Builder(msg)) => assert!(msg.contains("completion")),
            _ => panic!("Expected BuilderError"),
        }
    }

    #[test]
    fn test_build_complete() {
        let schema = ResponseSchema::from_value(serde_json::json!({"type": "object"})).unwrap();
        let result = RecipeService::builder()
            .capture(RequestFetcher::new(None).unwrap())
            .completion(OpenAIProvider::with_api_key(
                "key".to_string(),
                "gpt-4o-mini".to_string(),
                schema,
            ))
            .store(Arc::new(MemoryStore::new()))
            .public_base_url("https://img.example.com")
            .build();

        assert!(result.is_ok());
    }

    #[test]
    fn test_from_config_missing_schema() {
        let mut config = AppConfig::default();
        config.openai = OpenAiConfig {
            api_key: Some("key".to_string()),
            schema_path: "/no/such/schema.json".into(),
            ..Default::default()
        };

        let result = RecipeService::from_config(&config);
        assert!(matches!(result, Err(RecipeError::Schema(_))));
    }

    #[test]
    fn test_from_config_request_mode() {
        let mut config = AppConfig::default();
        config.openai.api_key = Some("key".to_string());
        config.openai.schema_path = concat!(env!("CARGO_MANIFEST_DIR"), "/schema.json").into();
        config.browser.mode = CaptureMode::Request;
        config.storage.backend = StorageBackend::Memory;

        assert!(RecipeService::from_config(&config).is_ok());
    }
}
