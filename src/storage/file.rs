use super::{validate_key, ObjectStore};
use crate::error::RecipeError;
use async_trait::async_trait;
use log::debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;

/// Suffix for staged writes. `list` never reports these.
const TMP_SUFFIX: &str = ".tmp";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Object store backed by a local directory. Keys map to relative paths,
/// so `images/x.jpg` lives at `<root>/images/x.jpg`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, RecipeError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

/// Staging path next to `path`, unique per write so concurrent puts of one
/// key never share a file
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(
        ".{}.{}.{}{}",
        name,
        std::process::id(),
        n,
        TMP_SUFFIX
    ))
}

#[async_trait]
impl ObjectStore for FileStore {
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<(), RecipeError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| RecipeError::Storage(format!("create {}: {}", parent.display(), e)))?;
        }

        // Write then rename so readers never observe a half-written object
        let tmp = temp_path_for(&path);
        let staged = match fs::write(&tmp, &bytes).await {
            Ok(()) => fs::rename(&tmp, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = staged {
            let _ = fs::remove_file(&tmp).await;
            return Err(RecipeError::Storage(format!("write {}: {}", path.display(), e)));
        }

        debug!("Stored {} ({}, {} bytes)", key, content_type, bytes.len());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, RecipeError> {
        let path = self.path_for(key)?;
        fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => RecipeError::NotFound(key.to_string()),
            _ => RecipeError::Storage(format!("read {}: {}", path.display(), e)),
        })
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, RecipeError> {
        let mut keys = Vec::new();
        let mut pending = vec![(self.root.clone(), String::new())];

        while let Some((dir, key_prefix)) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                // An empty store has no root directory yet
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(RecipeError::Storage(format!(
                        "list {}: {}",
                        dir.display(),
                        e
                    )))
                }
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| RecipeError::Storage(format!("list {}: {}", dir.display(), e)))?
            {
                let name = entry.file_name().to_string_lossy().into_owned();
                let key = format!("{}{}", key_prefix, name);
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| RecipeError::Storage(format!("stat {}: {}", key, e)))?;

                if file_type.is_dir() {
                    pending.push((entry.path(), format!("{}/", key)));
                } else if !name.ends_with(TMP_SUFFIX) && key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}
