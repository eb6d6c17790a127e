use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::assets::io::{AssetReader, FileAssetReader, base_uri};
use crate::assets::loaders::GltfLoader;
use crate::assets::prefab::SharedPrefab;
use crate::errors::Result;

/// Outcome of a background model load.
pub type ModelLoadResult = Result<SharedPrefab>;

/// Loads model files and caches the parsed prefabs by path.
///
/// Cheap to clone; clones share the reader and the cache.
#[derive(Clone)]
pub struct AssetServer {
    reader: Arc<FileAssetReader>,
    models: Arc<RwLock<FxHashMap<String, SharedPrefab>>>,
}

impl AssetServer {
    /// Creates a server reading from the asset root `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            reader: Arc::new(FileAssetReader::new(root)),
            models: Arc::new(RwLock::new(FxHashMap::default())),
        }
    }

    #[must_use]
    pub fn reader(&self) -> &FileAssetReader {
        &self.reader
    }

    /// Loads and parses the model at `path` (relative to the asset root).
    ///
    /// A path that was loaded before returns the cached prefab.
    pub async fn load_model(&self, path: &str) -> Result<SharedPrefab> {
        if let Some(prefab) = self.cached(path) {
            log::debug!("Model cache hit: {path}");
            return Ok(prefab);
        }

        log::info!("Loading model {path}");
        let bytes = self.reader.read_bytes(path).await?;
        let prefab = Arc::new(GltfLoader::parse(&bytes, base_uri(path), self.reader.as_ref()).await?);

        log::debug!(
            "Parsed {path}: {} nodes, {} skins, {} clips",
            prefab.nodes.len(),
            prefab.skeletons.len(),
            prefab.animations.len()
        );

        // Concurrent loads of one path keep whichever finished first
        let mut models = self.models.write();
        Ok(models.entry(path.to_string()).or_insert(prefab).clone())
    }

    /// Starts loading `path` on `runtime` without waiting for it.
    ///
    /// The result arrives on the returned channel exactly once.
    pub fn spawn_model(&self, runtime: &tokio::runtime::Handle, path: &str) -> flume::Receiver<ModelLoadResult> {
        let (tx, rx) = flume::bounded(1);
        let server = self.clone();
        let path = path.to_string();

        runtime.spawn(async move {
            let result = server.load_model(&path).await;
            // The receiver may be gone if the viewer shut down first
            let _ = tx.send(result);
        });

        rx
    }

    /// Previously loaded prefab for `path`, if any.
    #[must_use]
    pub fn cached(&self, path: &str) -> Option<SharedPrefab> {
        self.models.read().get(path).cloned()
    }
}
