//! Read-through caches in front of the object store.
//!
//! Two independent [`TtlCache`] instances back [`ReadCache`]: one keyed by
//! recipe filename with a long lifetime, and one holding the decoded list of
//! every recipe under a single sentinel key with a short lifetime. Both are
//! evicted after every successful write.

use crate::error::RecipeError;
use crate::model::Recipe;
use crate::storage::{is_recipe_key, ObjectStore};
use axum::body::Bytes;
use log::{debug, info, warn};
use moka::future::Cache;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Key of the single collection cache entry
pub const ALL_RECIPES_KEY: &str = "all_recipes";

/// Time-boxed concurrent cache
pub struct TtlCache<K, V> {
    inner: Cache<K, V>,
}

impl<K, V> Clone for TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create cache whose entries expire `ttl` after insertion
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: K, value: V) {
        self.inner.insert(key, value).await;
    }

    pub async fn invalidate(&self, key: &K) {
        self.inner.invalidate(key).await;
    }

    /// Approximate number of live entries
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Flush expired entries and pending evictions now
    pub async fn sweep(&self) {
        self.inner.run_pending_tasks().await;
    }

    /// Sweep expired entries every `interval` until the handle is aborted
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                cache.sweep().await;
            }
        })
    }
}

/// Lifetimes for the two read caches
#[derive(Debug, Clone, Copy)]
pub struct CacheSettings {
    pub max_capacity: u64,
    pub recipe_ttl: Duration,
    pub recipe_sweep: Duration,
    pub collection_ttl: Duration,
    pub collection_sweep: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            recipe_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            recipe_sweep: Duration::from_secs(60 * 60),
            collection_ttl: Duration::from_secs(60 * 60),
            collection_sweep: Duration::from_secs(10 * 60),
        }
    }
}

impl From<&crate::config::CacheConfig> for CacheSettings {
    fn from(config: &crate::config::CacheConfig) -> Self {
        Self {
            max_capacity: config.max_capacity,
            recipe_ttl: Duration::from_secs(config.recipe_ttl_secs),
            recipe_sweep: Duration::from_secs(config.recipe_sweep_secs),
            collection_ttl: Duration::from_secs(config.collection_ttl_secs),
            collection_sweep: Duration::from_secs(config.collection_sweep_secs),
        }
    }
}

/// Recipe reads served from cache, falling back to the object store.
///
/// A store read that overlaps a write must not repopulate the cache with
/// what it read. Every write bumps `generation`; a reader that sees the
/// counter move between its snapshot and its insert evicts what it inserted.
pub struct ReadCache {
    store: Arc<dyn ObjectStore>,
    settings: CacheSettings,
    recipes: TtlCache<String, Bytes>,
    collection: TtlCache<&'static str, Arc<Vec<Recipe>>>,
    generation: AtomicU64,
}

impl ReadCache {
    pub fn new(store: Arc<dyn ObjectStore>, settings: CacheSettings) -> Self {
        Self {
            store,
            settings,
            recipes: TtlCache::new(settings.max_capacity, settings.recipe_ttl),
            // Only ever holds the sentinel entry
            collection: TtlCache::new(1, settings.collection_ttl),
            generation: AtomicU64::new(0),
        }
    }

    /// Start the periodic sweeps for both caches
    pub fn spawn_sweepers(&self) -> Vec<JoinHandle<()>> {
        vec![
            self.recipes.spawn_sweeper(self.settings.recipe_sweep),
            self.collection.spawn_sweeper(self.settings.collection_sweep),
        ]
    }

    /// Raw JSON bytes of one stored recipe. Storage errors propagate and
    /// leave the cache untouched.
    pub async fn get_recipe(&self, filename: &str) -> Result<Bytes, RecipeError> {
        let key = filename.to_string();
        if let Some(bytes) = self.recipes.get(&key).await {
            info!("Cache hit {}", filename);
            return Ok(bytes);
        }

        let generation = self.generation();
        let bytes = Bytes::from(self.store.get(filename).await?);
        self.recipes.insert(key.clone(), bytes.clone()).await;
        if self.generation() != generation {
            debug!("Write raced read of {}, not caching", filename);
            self.recipes.invalidate(&key).await;
        }
        Ok(bytes)
    }

    /// Every stored recipe, optionally narrowed to one category.
    ///
    /// An empty category means no filter. The collection cache always holds
    /// the unfiltered list.
    pub async fn list_recipes(&self, category: Option<&str>) -> Result<Vec<Recipe>, RecipeError> {
        let all = match self.collection.get(&ALL_RECIPES_KEY).await {
            Some(all) => {
                info!("Cache hit for all recipes");
                all
            }
            None => {
                let generation = self.generation();
                let all = Arc::new(self.load_all().await?);
                self.collection.insert(ALL_RECIPES_KEY, all.clone()).await;
                if self.generation() != generation {
                    debug!("Write raced recipe listing, not caching");
                    self.collection.invalidate(&ALL_RECIPES_KEY).await;
                }
                all
            }
        };

        Ok(filter_by_category(&all, category))
    }

    /// Evict the written recipe and the collection entry. Call only after a
    /// successful write.
    pub async fn invalidate_on_write(&self, filename: &str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.recipes.invalidate(&filename.to_string()).await;
        self.collection.invalidate(&ALL_RECIPES_KEY).await;
        debug!("Invalidated cache for {}", filename);
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    async fn load_all(&self) -> Result<Vec<Recipe>, RecipeError> {
        let keys = self.store.list("").await?;
        let mut recipes = Vec::with_capacity(keys.len());

        for key in keys.iter().filter(|key| is_recipe_key(key)) {
            let content = match self.store.get(key).await {
                Ok(content) => content,
                Err(e) => {
                    warn!("Error reading recipe {}: {}", key, e);
                    continue;
                }
            };

            match serde_json::from_slice::<Recipe>(&content) {
                Ok(recipe) => recipes.push(recipe),
                Err(e) => warn!("Error parsing recipe JSON {}: {}", key, e),
            }
        }

        Ok(recipes)
    }
}

fn filter_by_category(recipes: &[Recipe], category: Option<&str>) -> Vec<Recipe> {
    match category.filter(|c| !c.is_empty()) {
        Some(category) => recipes
            .iter()
            .filter(|recipe| recipe.category.as_str() == category)
            .cloned()
            .collect(),
        None => recipes.to_vec(),
    }
}
