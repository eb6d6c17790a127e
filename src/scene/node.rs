use crate::scene::NodeHandle;
use crate::scene::transform::Transform;
use glam::Affine3A;

/// A minimal scene node containing only the data walked every frame.
///
/// Names, meshes, cameras and lights live in the [`Scene`](crate::scene::Scene)
/// component maps keyed by the node's handle.
#[derive(Debug, Clone)]
pub struct Node {
    /// Parent node handle (None for root nodes)
    pub(crate) parent: Option<NodeHandle>,
    /// Child node handles, in insertion order
    pub(crate) children: Vec<NodeHandle>,

    /// Local TRS plus cached local/world matrices
    pub transform: Transform,

    /// Hidden nodes (and their subtrees) are skipped by the renderer
    pub visible: bool,
}

impl Node {
    /// Creates a new node with default transform and visibility.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            visible: true,
        }
    }

    /// Returns the parent node handle, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Returns a read-only slice of child node handles.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// Returns the world matrix computed by the last hierarchy update.
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}
