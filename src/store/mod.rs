//! # Persistence
//!
//! Two stores, both holding the exact document shape and nothing else:
//!
//! - [`LocalStore`]: the single working document under a schema-versioned
//!   filename. Bumping [`LOCAL_SCHEMA_VERSION`] deliberately invalidates
//!   every previously-stored document instead of attempting migration;
//!   older files are simply never read again.
//! - [`DesignStore`]: id-keyed saved designs for the share/viewer flow,
//!   one JSON file per id plus an in-memory cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::document::CardDocument;
use crate::error::TarjetaError;
use crate::sync::autosave::DesignSink;

/// Bump to invalidate all locally-stored documents.
pub const LOCAL_SCHEMA_VERSION: u32 = 3;

/// The versioned filename the working document lives under.
pub fn local_file_name() -> String {
    format!("card-v{LOCAL_SCHEMA_VERSION}.json")
}

/// Working-document persistence in a data directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(local_file_name())
    }

    pub fn save(&self, doc: &CardDocument) -> Result<(), TarjetaError> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(doc)?;
        std::fs::write(self.path(), json)?;
        Ok(())
    }

    /// Load the working document. `None` when nothing was stored under the
    /// current schema version (including after a version bump).
    pub fn load(&self) -> Result<Option<CardDocument>, TarjetaError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }
}

#[async_trait]
impl DesignSink for LocalStore {
    async fn persist(&self, doc: &CardDocument) -> Result<(), TarjetaError> {
        self.save(doc)
    }
}

/// Saved-design storage: `save` issues an id, `load` fetches by id.
pub struct DesignStore {
    dir: PathBuf,
    cache: RwLock<HashMap<String, CardDocument>>,
}

impl DesignStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Persist a design and hand back its new id.
    pub async fn save(&self, doc: &CardDocument) -> Result<String, TarjetaError> {
        let id = Uuid::new_v4().to_string();
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_string(doc)?;
        tokio::fs::write(self.path_for(&id), json).await?;
        self.cache.write().await.insert(id.clone(), doc.clone());
        Ok(id)
    }

    /// Fetch a design by id. Ids that don't parse as UUIDs are rejected
    /// before touching the filesystem.
    pub async fn load(&self, id: &str) -> Result<Option<CardDocument>, TarjetaError> {
        if Uuid::parse_str(id).is_err() {
            return Ok(None);
        }
        if let Some(doc) = self.cache.read().await.get(id) {
            return Ok(Some(doc.clone()));
        }
        let path = self.path_for(id);
        match tokio::fs::read_to_string(&path).await {
            Ok(json) => {
                let doc: CardDocument = serde_json::from_str(&json)?;
                self.cache.write().await.insert(id.to_string(), doc.clone());
                Ok(Some(doc))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Uploads directory beneath a data directory.
pub fn uploads_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("uploads")
}
