//! Capture a recipe from any web page, structure it with an LLM and keep
//! it in an object store.
//!
//! # Example
//!
//! ```no_run
//! use recipe_saver::{AppConfig, RecipeService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = RecipeService::from_config(&config)?;
//!
//!     let saved = service
//!         .save_recipe("https://www.bbcgoodfood.com/recipes/classic-lasagne")
//!         .await?;
//!     println!("{} -> {}", saved.filename, saved.recipe.link);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod pipelines;
pub mod providers;
pub mod service;
pub mod storage;
pub mod url_to_text;

pub use builder::RecipeServiceBuilder;
pub use cache::CacheSettings;
pub use config::AppConfig;
pub use error::RecipeError;
pub use model::{Category, Recipe};
pub use pipelines::SavedRecipe;
pub use service::RecipeService;
pub use storage::ObjectStore;
