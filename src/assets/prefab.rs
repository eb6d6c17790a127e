use std::sync::Arc;

use glam::Affine3A;

use crate::animation::clip::AnimationClip;
use crate::resources::Mesh;
use crate::scene::transform::Transform;
use crate::scene::{NodeHandle, Scene, SkeletonKey, SkinBinding, Skeleton};

/// Prefab node: plain data, children referenced by index.
#[derive(Debug, Clone)]
pub struct PrefabNode {
    pub name: String,
    pub transform: Transform,
    /// Indices into `Prefab::nodes`
    pub children_indices: Vec<usize>,
    /// Mesh component; its `skin` is unset until instantiation
    pub mesh: Option<Mesh>,
    /// Index into `Prefab::skeletons`
    pub skin_index: Option<usize>,
}

impl PrefabNode {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            transform: Transform::new(),
            children_indices: Vec::new(),
            mesh: None,
            skin_index: None,
        }
    }

    /// True when the node has a mesh bound to a skin with per-vertex joints.
    #[must_use]
    pub fn is_skinned_mesh(&self) -> bool {
        self.skin_index.is_some() && self.mesh.as_ref().is_some_and(|m| m.geometry.is_skinned())
    }
}

#[derive(Debug, Clone)]
pub struct PrefabSkeleton {
    pub name: String,
    /// Index of the root bone within `bone_indices`
    pub root_bone_index: usize,
    /// Indices into `Prefab::nodes`, in joint order
    pub bone_indices: Vec<usize>,
    pub inverse_bind_matrices: Vec<Affine3A>,
}

/// Parsed model file, not yet part of any scene.
///
/// A prefab holds no handles, so one loaded file can be instantiated any
/// number of times.
#[derive(Debug, Clone, Default)]
pub struct Prefab {
    /// Scene name from the file, used for the instance root
    pub name: String,
    pub nodes: Vec<PrefabNode>,
    pub root_indices: Vec<usize>,
    pub skeletons: Vec<PrefabSkeleton>,
    pub animations: Vec<Arc<AnimationClip>>,
}

/// Handles created by [`Prefab::instantiate`].
#[derive(Debug, Clone)]
pub struct PrefabInstance {
    /// Container node holding the prefab roots
    pub root: NodeHandle,
    /// `nodes[i]` is the scene node created for prefab node `i`
    pub nodes: Vec<NodeHandle>,
    /// `skeletons[i]` is the scene skeleton created for prefab skeleton `i`
    pub skeletons: Vec<SkeletonKey>,
}

impl Prefab {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Pre-order walk over all root trees.
    pub fn traverse<F>(&self, mut visit: F)
    where
        F: FnMut(usize, &PrefabNode),
    {
        let mut stack: Vec<usize> = self.root_indices.iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                continue;
            };
            visit(index, node);
            stack.extend(node.children_indices.iter().rev().copied());
        }
    }

    /// Indices of skinned mesh nodes in traversal order.
    #[must_use]
    pub fn skinned_meshes(&self) -> Vec<usize> {
        let mut out = Vec::new();
        self.traverse(|i, node| {
            if node.is_skinned_mesh() {
                out.push(i);
            }
        });
        out
    }

    /// First node named `name` in traversal order.
    #[must_use]
    pub fn find_node(&self, name: &str) -> Option<usize> {
        let mut found = None;
        self.traverse(|i, node| {
            if found.is_none() && node.name == name {
                found = Some(i);
            }
        });
        found
    }

    /// Bone names of skeleton `skin_index`, in joint order.
    #[must_use]
    pub fn bone_names(&self, skin_index: usize) -> Vec<&str> {
        self.skeletons.get(skin_index).map_or_else(Vec::new, |skel| {
            skel.bone_indices
                .iter()
                .filter_map(|&i| self.nodes.get(i).map(|n| n.name.as_str()))
                .collect()
        })
    }

    /// Copies the prefab into `scene` with fresh nodes and skeletons.
    ///
    /// The new skeletons are bound to the new bones, so posing or animating
    /// one instance leaves every other instance untouched. The container is
    /// attached under `parent`, or becomes a scene root.
    pub fn instantiate(&self, scene: &mut Scene, parent: Option<NodeHandle>) -> PrefabInstance {
        let root = scene.create_node_with_name(&self.name);
        match parent {
            Some(p) => scene.attach(root, p),
            None => scene.root_nodes.push(root),
        }

        let nodes: Vec<NodeHandle> = self
            .nodes
            .iter()
            .map(|pn| {
                let handle = scene.create_node_with_name(&pn.name);
                if let Some(node) = scene.get_node_mut(handle) {
                    node.transform = pn.transform.clone();
                    node.transform.mark_dirty();
                }
                handle
            })
            .collect();

        for (i, pn) in self.nodes.iter().enumerate() {
            for &child in &pn.children_indices {
                if let Some(&child_handle) = nodes.get(child) {
                    scene.attach(child_handle, nodes[i]);
                }
            }
        }
        for &r in &self.root_indices {
            if let Some(&h) = nodes.get(r) {
                scene.attach(h, root);
            }
        }

        let skeletons: Vec<SkeletonKey> = self
            .skeletons
            .iter()
            .map(|ps| {
                let bones = ps.bone_indices.iter().filter_map(|&i| nodes.get(i).copied()).collect();
                scene.add_skeleton(Skeleton::new(
                    &ps.name,
                    bones,
                    ps.inverse_bind_matrices.clone(),
                    ps.root_bone_index,
                ))
            })
            .collect();

        for (i, pn) in self.nodes.iter().enumerate() {
            let Some(mesh) = &pn.mesh else { continue };
            let mut mesh = mesh.clone();
            if let Some(&skeleton) = pn.skin_index.and_then(|s| skeletons.get(s)) {
                mesh.bind(SkinBinding { skeleton });
            }
            scene.set_mesh(nodes[i], mesh);
        }

        PrefabInstance {
            root,
            nodes,
            skeletons,
        }
    }
}

/// Thread-safe shared prefab.
pub type SharedPrefab = Arc<Prefab>;
