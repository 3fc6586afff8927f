//! Server state and configuration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use image::DynamicImage;
use tokio::sync::RwLock;

use crate::error::TarjetaError;
use crate::render::ImageResolver;
use crate::store::DesignStore;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Directory holding designs and uploads.
    pub data_dir: PathBuf,
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    /// Saved designs (share/viewer flow).
    pub designs: DesignStore,
    /// Decoded-image cache shared by every render.
    pub image_cache: Arc<RwLock<HashMap<String, DynamicImage>>>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let designs = DesignStore::new(config.data_dir.join("designs"));
        Self {
            config,
            designs,
            image_cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Image source for renders: uploads resolve under the data dir,
    /// remote URIs over HTTP with the shared cache.
    pub fn resolver(&self) -> Result<ImageResolver, TarjetaError> {
        ImageResolver::with_cache(self.config.data_dir.clone(), self.image_cache.clone())
    }
}
