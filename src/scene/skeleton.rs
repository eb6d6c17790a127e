use glam::{Affine3A, Mat4};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use uuid::Uuid;

use crate::scene::{Node, NodeHandle, SkeletonKey};

/// Links a mesh to the skeleton that deforms it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkinBinding {
    pub skeleton: SkeletonKey,
}

#[derive(Debug, Clone)]
pub struct Skeleton {
    pub id: Uuid,
    pub name: String,

    // Ordered bone list: bones[i] is joint i in the vertex data
    pub bones: Vec<NodeHandle>,

    // Mesh space -> bone local space, one per bone. Static after load.
    pub(crate) inverse_bind_matrices: Vec<Affine3A>,

    pub(crate) root_bone_index: usize,

    // bone_world * inverse_bind, refreshed every frame
    pub(crate) joint_matrices: Vec<Mat4>,
}

impl Skeleton {
    /// Creates a skeleton. Missing inverse bind matrices default to identity.
    #[must_use]
    pub fn new(
        name: &str,
        bones: Vec<NodeHandle>,
        mut inverse_bind_matrices: Vec<Affine3A>,
        root_bone_index: usize,
    ) -> Self {
        let count = bones.len();
        inverse_bind_matrices.resize(count, Affine3A::IDENTITY);

        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            bones,
            inverse_bind_matrices,
            root_bone_index,
            joint_matrices: vec![Mat4::IDENTITY; count],
        }
    }

    /// Root bone handle (usually `bones[0]`).
    #[inline]
    #[must_use]
    pub fn root_bone(&self) -> Option<NodeHandle> {
        self.bones.get(self.root_bone_index).copied()
    }

    #[inline]
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    #[must_use]
    pub fn inverse_bind_matrices(&self) -> &[Affine3A] {
        &self.inverse_bind_matrices
    }

    /// Joint matrices from the last [`compute_joint_matrices`](Self::compute_joint_matrices).
    #[inline]
    #[must_use]
    pub fn joint_matrices(&self) -> &[Mat4] {
        &self.joint_matrices
    }

    /// Index of `bone` in this skeleton.
    #[must_use]
    pub fn bone_index(&self, bone: NodeHandle) -> Option<usize> {
        self.bones.iter().position(|&b| b == bone)
    }

    /// Recomputes joint matrices from the bones' current world matrices.
    ///
    /// Joint matrices are expressed in world space, so a vertex skinned with
    /// them lands in world space regardless of where its mesh node sits.
    pub fn compute_joint_matrices(&mut self, nodes: &SlotMap<NodeHandle, Node>) {
        for (i, &bone_handle) in self.bones.iter().enumerate() {
            let Some(bone_node) = nodes.get(bone_handle) else {
                continue;
            };
            let bone_world = bone_node.transform.world_matrix;
            self.joint_matrices[i] = (bone_world * self.inverse_bind_matrices[i]).into();
        }
    }

    /// Returns the bones to the bind pose described by the inverse bind
    /// matrices.
    ///
    /// Each bone's bind world matrix is `inverse_bind⁻¹`. A bone whose parent
    /// belongs to this skeleton gets `parent_bind_world⁻¹ * bind_world` as
    /// its local transform; other bones take the bind world matrix as local.
    pub fn pose(&self, nodes: &mut SlotMap<NodeHandle, Node>) {
        let bind_worlds: FxHashMap<NodeHandle, Affine3A> = self
            .bones
            .iter()
            .zip(&self.inverse_bind_matrices)
            .map(|(&bone, ibm)| (bone, ibm.inverse()))
            .collect();

        for (&bone, world) in self.bones.iter().zip(self.inverse_bind_matrices.iter().map(Affine3A::inverse)) {
            let Some(node) = nodes.get_mut(bone) else {
                continue;
            };

            let local = match node.parent.and_then(|p| bind_worlds.get(&p)) {
                Some(parent_world) => parent_world.inverse() * world,
                None => world,
            };

            node.transform.apply_local_matrix(local);
            node.transform.set_world_matrix(world);
        }
    }
}
