use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// HTTP listener settings
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Structured completion endpoint settings
#[derive(Debug, Deserialize, Clone)]
pub struct OpenAiConfig {
    /// API key for authentication (can also be set via environment variable)
    pub api_key: Option<String>,
    /// Base URL for API endpoint (for custom or proxy endpoints)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Request timeout in seconds
    #[serde(default = "default_openai_timeout")]
    pub timeout_secs: u64,
    /// Log full request and response bodies
    #[serde(default)]
    pub debug: bool,
    /// Path of the JSON schema the model output must validate against
    #[serde(default = "default_schema_path")]
    pub schema_path: PathBuf,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_openai_timeout(),
            debug: false,
            schema_path: default_schema_path(),
        }
    }
}

impl OpenAiConfig {
    /// API key from config, falling back to `OPENAI_API_KEY` then `OPENAI_KEY`
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .or_else(|| std::env::var("OPENAI_KEY").ok())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// How pages are captured
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Headless Chrome, renders JavaScript
    #[default]
    Chrome,
    /// Plain HTTP GET, no JavaScript
    Request,
}

/// Page capture settings
#[derive(Debug, Deserialize, Clone)]
pub struct BrowserConfig {
    #[serde(default)]
    pub mode: CaptureMode,
    /// Chrome/Chromium executable; autodetected when unset
    pub chrome_path: Option<PathBuf>,
    /// Navigation and element lookup timeout in seconds
    #[serde(default = "default_browser_timeout")]
    pub timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            mode: CaptureMode::default(),
            chrome_path: None,
            timeout_secs: default_browser_timeout(),
        }
    }
}

impl BrowserConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Which object store backs the service
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Filesystem,
    Memory,
}

/// Object store settings
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Root directory for the filesystem backend
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Base URL images are publicly resolvable under
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            root: default_storage_root(),
            public_base_url: default_public_base_url(),
        }
    }
}

/// Read cache lifetimes
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_recipe_ttl")]
    pub recipe_ttl_secs: u64,
    #[serde(default = "default_recipe_sweep")]
    pub recipe_sweep_secs: u64,
    #[serde(default = "default_collection_ttl")]
    pub collection_ttl_secs: u64,
    #[serde(default = "default_collection_sweep")]
    pub collection_sweep_secs: u64,
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            recipe_ttl_secs: default_recipe_ttl(),
            recipe_sweep_secs: default_recipe_sweep(),
            collection_ttl_secs: default_collection_ttl(),
            collection_sweep_secs: default_collection_sweep(),
            max_capacity: default_max_capacity(),
        }
    }
}

// Default value functions
fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini-2024-07-18".to_string()
}

fn default_max_tokens() -> u32 {
    16384
}

fn default_openai_timeout() -> u64 {
    120
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("schema.json")
}

fn default_browser_timeout() -> u64 {
    60
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("data")
}

fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_recipe_ttl() -> u64 {
    30 * 24 * 60 * 60
}

fn default_recipe_sweep() -> u64 {
    60 * 60
}

fn default_collection_ttl() -> u64 {
    60 * 60
}

fn default_collection_sweep() -> u64 {
    10 * 60
}

fn default_max_capacity() -> u64 {
    10_000
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPES__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPES__OPENAI__MODEL
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }
}

/// Load configuration from file and environment variables
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        // Use double underscore for nested: RECIPES__STORAGE__ROOT
        .add_source(
            Environment::with_prefix("RECIPES")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> AppConfig {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_default_values() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.openai.model, "gpt-4o-mini-2024-07-18");
        assert_eq!(config.openai.max_tokens, 16384);
        assert_eq!(config.browser.mode, CaptureMode::Chrome);
        assert_eq!(config.storage.backend, StorageBackend::Filesystem);
        assert_eq!(config.cache.recipe_ttl_secs, 30 * 24 * 60 * 60);
        assert_eq!(config.cache.collection_ttl_secs, 60 * 60);
    }

    #[test]
    fn test_sweeps_are_shorter_than_ttls() {
        let cache = CacheConfig::default();
        assert!(cache.recipe_sweep_secs < cache.recipe_ttl_secs);
        assert!(cache.collection_sweep_secs < cache.collection_ttl_secs);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = from_toml("");
        assert_eq!(config.storage.root, PathBuf::from("data"));
        assert_eq!(config.openai.schema_path, PathBuf::from("schema.json"));
    }

    #[test]
    fn test_partial_sections() {
        let config = from_toml(
            r#"
            [browser]
            mode = "request"

            [storage]
            backend = "memory"
            public_base_url = "https://img.example.com"

            [cache]
            collection_ttl_secs = 5
            "#,
        );

        assert_eq!(config.browser.mode, CaptureMode::Request);
        assert_eq!(config.browser.timeout_secs, 60);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.public_base_url, "https://img.example.com");
        assert_eq!(config.cache.collection_ttl_secs, 5);
        assert_eq!(config.cache.recipe_ttl_secs, 30 * 24 * 60 * 60);
    }

    #[test]
    fn test_api_key_from_config_wins() {
        let config = OpenAiConfig {
            api_key: Some("from-config".to_string()),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("from-config"));
    }
}
