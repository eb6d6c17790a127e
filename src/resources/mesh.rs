use std::sync::Arc;

use crate::resources::{Geometry, Material};
use crate::scene::SkinBinding;

/// Mesh component.
///
/// Geometry and material are shared; the mesh only adds per-instance
/// rendering flags and the optional skeleton binding.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: Arc<Geometry>,
    pub material: Arc<Material>,

    pub cast_shadow: bool,
    pub receive_shadow: bool,

    /// Skinned meshes are positioned by their joint matrices, not their node
    pub skin: Option<SkinBinding>,
}

impl Mesh {
    #[must_use]
    pub fn new(geometry: Arc<Geometry>, material: Arc<Material>) -> Self {
        Self {
            geometry,
            material,
            cast_shadow: false,
            receive_shadow: false,
            skin: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_skinned(&self) -> bool {
        self.skin.is_some() && self.geometry.is_skinned()
    }

    /// Binds this mesh to a skeleton.
    pub fn bind(&mut self, binding: SkinBinding) {
        self.skin = Some(binding);
    }
}
