use glam::Vec3;
use slotmap::{SecondaryMap, SlotMap, SparseSecondaryMap};

use crate::resources::Mesh;
use crate::scene::camera::Camera;
use crate::scene::environment::Environment;
use crate::scene::light::Light;
use crate::scene::node::Node;
use crate::scene::skeleton::Skeleton;
use crate::scene::transform_system;
use crate::scene::{NodeHandle, SkeletonKey};

/// Scene graph.
///
/// Nodes hold only hierarchy and transform. Everything else is a component
/// keyed by the node handle, so adding a mesh or a light never changes the
/// node layout.
pub struct Scene {
    pub nodes: SlotMap<NodeHandle, Node>,
    pub root_nodes: Vec<NodeHandle>,

    // ==== Components ====
    pub names: SecondaryMap<NodeHandle, String>,
    pub meshes: SparseSecondaryMap<NodeHandle, Mesh>,
    pub cameras: SparseSecondaryMap<NodeHandle, Camera>,
    pub lights: SparseSecondaryMap<NodeHandle, Light>,

    // ==== Resource pools ====
    pub skeletons: SlotMap<SkeletonKey, Skeleton>,

    pub environment: Environment,
    pub active_camera: Option<NodeHandle>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root_nodes: Vec::new(),
            names: SecondaryMap::new(),
            meshes: SparseSecondaryMap::new(),
            cameras: SparseSecondaryMap::new(),
            lights: SparseSecondaryMap::new(),
            skeletons: SlotMap::with_key(),
            environment: Environment::new(),
            active_camera: None,
        }
    }

    // ========================================================================
    // Node lifecycle
    // ========================================================================

    /// Inserts a detached node (neither root nor child).
    pub fn create_node(&mut self) -> NodeHandle {
        self.nodes.insert(Node::new())
    }

    /// Inserts a detached, named node.
    pub fn create_node_with_name(&mut self, name: &str) -> NodeHandle {
        let handle = self.nodes.insert(Node::new());
        self.names.insert(handle, name.to_string());
        handle
    }

    /// Adds a node as a scene root.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        handle
    }

    /// Adds an empty named container at the root.
    pub fn add_group(&mut self, name: &str) -> NodeHandle {
        let handle = self.create_node_with_name(name);
        self.root_nodes.push(handle);
        handle
    }

    /// Makes `child_handle` the last child of `parent_handle`, detaching it
    /// from its previous parent or from the root list.
    pub fn attach(&mut self, child_handle: NodeHandle, parent_handle: NodeHandle) {
        if child_handle == parent_handle {
            log::warn!("Cannot attach node to itself!");
            return;
        }
        if !self.nodes.contains_key(parent_handle) || !self.nodes.contains_key(child_handle) {
            log::error!("Attach failed: parent or child node does not exist");
            return;
        }
        if self.is_ancestor(child_handle, parent_handle) {
            log::warn!("Cannot attach a node under its own descendant");
            return;
        }

        self.detach_from_parent(child_handle);

        if let Some(p) = self.nodes.get_mut(parent_handle) {
            p.children.push(child_handle);
        }
        if let Some(c) = self.nodes.get_mut(child_handle) {
            c.parent = Some(parent_handle);
            c.transform.mark_dirty();
        }
    }

    /// Moves a node back to the root list.
    pub fn detach(&mut self, handle: NodeHandle) {
        if !self.nodes.contains_key(handle) {
            return;
        }
        self.detach_from_parent(handle);
        if let Some(node) = self.nodes.get_mut(handle) {
            node.parent = None;
            node.transform.mark_dirty();
        }
        self.root_nodes.push(handle);
    }

    fn detach_from_parent(&mut self, handle: NodeHandle) {
        let old_parent = self.nodes.get(handle).and_then(|n| n.parent);
        if let Some(p) = old_parent {
            if let Some(n) = self.nodes.get_mut(p) {
                n.children.retain(|&c| c != handle);
            }
        } else {
            self.root_nodes.retain(|&r| r != handle);
        }
    }

    /// Returns true when `ancestor` appears on the parent chain of `node`.
    fn is_ancestor(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        let mut current = self.nodes.get(node).and_then(|n| n.parent);
        while let Some(h) = current {
            if h == ancestor {
                return true;
            }
            current = self.nodes.get(h).and_then(|n| n.parent);
        }
        false
    }

    /// Removes a node together with its whole subtree and their components.
    ///
    /// Skeletons are pooled separately and are not removed.
    pub fn remove_node(&mut self, handle: NodeHandle) {
        if !self.nodes.contains_key(handle) {
            return;
        }
        self.detach_from_parent(handle);

        let mut doomed = Vec::new();
        self.traverse(handle, |h, _| doomed.push(h));

        for h in doomed {
            self.names.remove(h);
            self.meshes.remove(h);
            self.cameras.remove(h);
            self.lights.remove(h);
            self.nodes.remove(h);
            if self.active_camera == Some(h) {
                self.active_camera = None;
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    #[inline]
    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    #[must_use]
    pub fn get_name(&self, handle: NodeHandle) -> Option<&str> {
        self.names.get(handle).map(String::as_str)
    }

    pub fn set_name(&mut self, handle: NodeHandle, name: &str) {
        if self.nodes.contains_key(handle) {
            self.names.insert(handle, name.to_string());
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Pre-order depth-first walk of the subtree rooted at `root`.
    pub fn traverse<F>(&self, root: NodeHandle, mut visit: F)
    where
        F: FnMut(NodeHandle, &Node),
    {
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            visit(handle, node);
            stack.extend(node.children.iter().rev().copied());
        }
    }

    /// First node named `name` in pre-order under `root` (including `root`).
    #[must_use]
    pub fn find_node_by_name(&self, root: NodeHandle, name: &str) -> Option<NodeHandle> {
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            if self.get_name(handle) == Some(name) {
                return Some(handle);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// Searches every root tree in order.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<NodeHandle> {
        self.root_nodes
            .iter()
            .find_map(|&root| self.find_node_by_name(root, name))
    }

    /// World-space translation of a node, as of the last matrix update.
    #[must_use]
    pub fn world_position(&self, handle: NodeHandle) -> Option<Vec3> {
        self.nodes
            .get(handle)
            .map(|n| n.transform.world_matrix.translation.into())
    }

    /// Visible mesh nodes, in pre-order from the roots. Hidden nodes prune
    /// their subtree.
    #[must_use]
    pub fn visible_meshes(&self) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeHandle> = self.root_nodes.iter().rev().copied().collect();
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            if self.meshes.contains_key(handle) {
                out.push(handle);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    // ========================================================================
    // Components
    // ========================================================================

    pub fn set_mesh(&mut self, handle: NodeHandle, mesh: Mesh) {
        if self.nodes.contains_key(handle) {
            self.meshes.insert(handle, mesh);
        }
    }

    #[must_use]
    pub fn get_mesh(&self, handle: NodeHandle) -> Option<&Mesh> {
        self.meshes.get(handle)
    }

    pub fn get_mesh_mut(&mut self, handle: NodeHandle) -> Option<&mut Mesh> {
        self.meshes.get_mut(handle)
    }

    pub fn add_skeleton(&mut self, skeleton: Skeleton) -> SkeletonKey {
        self.skeletons.insert(skeleton)
    }

    #[must_use]
    pub fn get_skeleton(&self, key: SkeletonKey) -> Option<&Skeleton> {
        self.skeletons.get(key)
    }

    /// Adds a camera on a new root node and makes it active if none is.
    pub fn add_camera(&mut self, camera: Camera) -> NodeHandle {
        let handle = self.create_node_with_name("Camera");
        self.root_nodes.push(handle);
        self.cameras.insert(handle, camera);
        if self.active_camera.is_none() {
            self.active_camera = Some(handle);
        }
        handle
    }

    /// Adds a light on a new root node.
    pub fn add_light(&mut self, light: Light) -> NodeHandle {
        let name = match light {
            Light::Hemisphere(_) => "HemisphereLight",
            Light::Directional(_) => "DirectionalLight",
        };
        let handle = self.create_node_with_name(name);
        self.root_nodes.push(handle);
        self.lights.insert(handle, light);
        handle
    }

    /// Active camera component, if any.
    #[must_use]
    pub fn main_camera(&self) -> Option<&Camera> {
        self.cameras.get(self.active_camera?)
    }

    pub fn main_camera_mut(&mut self) -> Option<&mut Camera> {
        self.cameras.get_mut(self.active_camera?)
    }

    // ========================================================================
    // Per-frame updates
    // ========================================================================

    /// Recomputes world matrices for the whole graph.
    pub fn update_matrix_world(&mut self) {
        transform_system::update_hierarchy_iterative(&mut self.nodes, &mut self.cameras, &self.root_nodes);
    }

    /// Recomputes world matrices below `root` only.
    pub fn update_subtree(&mut self, root: NodeHandle) {
        transform_system::update_subtree(&mut self.nodes, &mut self.cameras, root);
    }

    /// Recomputes every skeleton's joint matrices from current bone poses.
    pub fn update_skeletons(&mut self) {
        let nodes = &self.nodes;
        for (_, skeleton) in &mut self.skeletons {
            skeleton.compute_joint_matrices(nodes);
        }
    }

    /// Returns a skeleton's bones to their bind pose.
    pub fn pose_skeleton(&mut self, key: SkeletonKey) {
        if let Some(skeleton) = self.skeletons.get(key) {
            skeleton.pose(&mut self.nodes);
        }
    }

    /// Frame update: matrices first, then skinning data.
    pub fn update(&mut self) {
        self.update_matrix_world();
        self.update_skeletons();
    }
}
