use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::{
    fs,
    sync::{Mutex, RwLock},
};
use tracing::{debug, info, warn};

use crate::{error::CacheError, types::VideoId};

/// Joins the video id and model in a cache key. Video ids never contain a
/// colon, so the first separator always splits the key unambiguously.
pub const KEY_SEPARATOR: &str = "::";

/// String key/value storage that outlives a single summary request.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn put(&self, key: &str, value: &str) -> Result<(), CacheError>;
}

/// Process-local store.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SummaryStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store persisted as a single JSON object on disk.
///
/// Writes go to a sibling temp file first and are renamed into place.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<String, String>, CacheError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(source) => {
                return Err(CacheError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }

        serde_json::from_str(&content).map_err(|source| CacheError::Json {
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self, entries: &HashMap<String, String>) -> Result<(), CacheError> {
        let io_err = |source: std::io::Error| CacheError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let pretty_json = serde_json::to_string_pretty(entries).map_err(|source| {
            CacheError::Json {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, pretty_json).await.map_err(io_err)?;
        fs::rename(&tmp_path, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}

#[async_trait]
impl SummaryStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.load().await?.remove(key))
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = match self.load().await {
            Ok(entries) => entries,
            Err(CacheError::Json { path, source }) => {
                warn!(path = %path.display(), error = %source, "replacing unreadable cache file");
                HashMap::new()
            }
            Err(e) => return Err(e),
        };
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries).await
    }
}

/// Cache of clean summaries keyed by video and model.
///
/// Store failures never reach the caller: a failed read is a miss and a
/// failed write is logged and dropped. An empty cached summary is a miss.
#[derive(Clone)]
pub struct SummaryCache {
    store: Arc<dyn SummaryStore>,
    default_model: String,
}

impl SummaryCache {
    pub fn new(store: Arc<dyn SummaryStore>, default_model: impl Into<String>) -> Self {
        Self {
            store,
            default_model: default_model.into(),
        }
    }

    pub fn in_memory(default_model: impl Into<String>) -> Self {
        Self::new(Arc::new(MemoryStore::new()), default_model)
    }

    pub fn key(&self, video_id: &VideoId, model: Option<&str>) -> String {
        cache_key(
            video_id,
            model
                .filter(|m| !m.is_empty())
                .unwrap_or(&self.default_model),
        )
    }

    pub async fn get(&self, video_id: &VideoId, model: Option<&str>) -> Option<String> {
        let key = self.key(video_id, model);
        match self.store.get(&key).await {
            Ok(Some(summary)) if !summary.is_empty() => {
                info!(%key, "cache hit");
                Some(summary)
            }
            Ok(_) => {
                debug!(%key, "cache miss");
                None
            }
            Err(e) => {
                warn!(%key, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Unconditionally replace the entry for this video and model.
    pub async fn put(&self, video_id: &VideoId, model: Option<&str>, summary: &str) {
        let key = self.key(video_id, model);
        match self.store.put(&key, summary).await {
            Ok(()) => debug!(%key, "summary cached"),
            Err(e) => warn!(%key, error = %e, "failed to cache summary"),
        }
    }
}

pub fn cache_key(video_id: &VideoId, model: &str) -> String {
    format!("{video_id}{KEY_SEPARATOR}{model}")
}
