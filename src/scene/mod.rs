//! Scene Graph Module
//!
//! Manages the scene hierarchy and its components:
//! - [`Node`]: hierarchy and transform (hot data)
//! - [`Transform`]: position, rotation, scale with cached matrices
//! - [`Scene`]: node storage plus component maps (names, meshes, cameras, lights)
//! - [`Skeleton`]: ordered bones with inverse bind matrices
//! - [`Camera`], [`Light`], [`Environment`]
//! - `transform_system`: iterative world-matrix propagation

pub mod camera;
pub mod environment;
pub mod light;
pub mod node;
pub mod scene;
pub mod skeleton;
pub mod transform;
pub mod transform_system;

pub use camera::Camera;
pub use environment::{Environment, Fog};
pub use light::{DirectionalLight, HemisphereLight, Light, ShadowConfig};
pub use node::Node;
pub use scene::Scene;
pub use skeleton::{SkinBinding, Skeleton};
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
    pub struct SkeletonKey;
}
