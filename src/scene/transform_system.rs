//! Transform System
//!
//! World-matrix propagation for the scene graph, kept apart from [`Scene`]
//! so it only borrows the node storage and the camera components.
//!
//! [`Scene`]: crate::scene::Scene

use glam::Affine3A;
use slotmap::{SlotMap, SparseSecondaryMap};

use crate::scene::NodeHandle;
use crate::scene::camera::Camera;
use crate::scene::node::Node;

/// Updates world matrices for every tree under `roots`.
///
/// Uses an explicit stack instead of recursion so deep bone chains cannot
/// overflow. A node's world matrix is recomputed when its local matrix or
/// any ancestor changed.
pub fn update_hierarchy_iterative(
    nodes: &mut SlotMap<NodeHandle, Node>,
    cameras: &mut SparseSecondaryMap<NodeHandle, Camera>,
    roots: &[NodeHandle],
) {
    // (node, parent world, parent changed)
    let mut stack: Vec<(NodeHandle, Affine3A, bool)> = Vec::with_capacity(64);

    for &root_handle in roots.iter().rev() {
        stack.push((root_handle, Affine3A::IDENTITY, false));
    }

    while let Some((node_handle, parent_world_matrix, parent_changed)) = stack.pop() {
        let Some(node) = nodes.get_mut(node_handle) else {
            continue;
        };

        let local_changed = node.transform.update_local_matrix();
        let world_needs_update = local_changed || parent_changed;

        if world_needs_update {
            let new_world = parent_world_matrix * *node.transform.local_matrix();
            node.transform.set_world_matrix(new_world);

            if let Some(camera) = cameras.get_mut(node_handle) {
                camera.update_view_projection(&new_world);
            }
        }

        let current_world = node.transform.world_matrix;
        for &child_handle in node.children.iter().rev() {
            stack.push((child_handle, current_world, world_needs_update));
        }
    }
}

/// Updates the subtree rooted at `root_handle`, reading the parent's
/// current world matrix as the starting point.
pub fn update_subtree(
    nodes: &mut SlotMap<NodeHandle, Node>,
    cameras: &mut SparseSecondaryMap<NodeHandle, Camera>,
    root_handle: NodeHandle,
) {
    let parent = {
        let Some(node) = nodes.get_mut(root_handle) else {
            return;
        };
        // Force the root so the whole subtree is refreshed
        node.transform.mark_dirty();
        node.parent
    };

    let parent_world = parent
        .and_then(|p| nodes.get(p))
        .map_or(Affine3A::IDENTITY, |p| p.transform.world_matrix);

    let mut stack = vec![(root_handle, parent_world, true)];
    while let Some((node_handle, parent_world_matrix, parent_changed)) = stack.pop() {
        let Some(node) = nodes.get_mut(node_handle) else {
            continue;
        };
        let world_needs_update = node.transform.update_local_matrix() || parent_changed;
        if world_needs_update {
            let new_world = parent_world_matrix * *node.transform.local_matrix();
            node.transform.set_world_matrix(new_world);
            if let Some(camera) = cameras.get_mut(node_handle) {
                camera.update_view_projection(&new_world);
            }
        }
        let current_world = node.transform.world_matrix;
        for &child_handle in node.children.iter().rev() {
            stack.push((child_handle, current_world, world_needs_update));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_hierarchy_update() {
        let mut nodes: SlotMap<NodeHandle, Node> = SlotMap::with_key();
        let mut cameras: SparseSecondaryMap<NodeHandle, Camera> = SparseSecondaryMap::new();

        let mut parent = Node::new();
        parent.transform.position = Vec3::new(1.0, 0.0, 0.0);
        let parent_handle = nodes.insert(parent);

        let mut child = Node::new();
        child.transform.position = Vec3::new(0.0, 1.0, 0.0);
        child.parent = Some(parent_handle);
        let child_handle = nodes.insert(child);

        nodes.get_mut(parent_handle).unwrap().children.push(child_handle);

        update_hierarchy_iterative(&mut nodes, &mut cameras, &[parent_handle]);

        let child_world_pos = nodes.get(child_handle).unwrap().transform.world_matrix.translation;
        assert!((child_world_pos.x - 1.0).abs() < 1e-5);
        assert!((child_world_pos.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_parent_change_propagates_on_next_update() {
        let mut nodes: SlotMap<NodeHandle, Node> = SlotMap::with_key();
        let mut cameras: SparseSecondaryMap<NodeHandle, Camera> = SparseSecondaryMap::new();

        let parent_handle = nodes.insert(Node::new());
        let mut child = Node::new();
        child.parent = Some(parent_handle);
        child.transform.position = Vec3::new(0.0, 0.0, 2.0);
        let child_handle = nodes.insert(child);
        nodes.get_mut(parent_handle).unwrap().children.push(child_handle);

        update_hierarchy_iterative(&mut nodes, &mut cameras, &[parent_handle]);
        nodes.get_mut(parent_handle).unwrap().transform.scale = Vec3::splat(0.5);
        update_hierarchy_iterative(&mut nodes, &mut cameras, &[parent_handle]);

        let z = nodes.get(child_handle).unwrap().transform.world_matrix.translation.z;
        assert!((z - 1.0).abs() < 1e-5);
    }
}
