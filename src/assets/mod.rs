//! Asset loading: file reading, glTF parsing into [`Prefab`]s, and the
//! caching [`AssetServer`].

pub mod io;
pub mod loaders;
pub mod prefab;
pub mod server;

pub use io::{AssetReader, FileAssetReader};
pub use loaders::GltfLoader;
pub use prefab::{Prefab, PrefabInstance, PrefabNode, PrefabSkeleton, SharedPrefab};
pub use server::{AssetServer, ModelLoadResult};
