use crate::scene::NodeHandle;

/// Node property an animation track writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetPath {
    Translation,
    Rotation,
    Scale,
}

/// Track `track_index` of a clip resolved to a node in the scene.
#[derive(Debug, Clone)]
pub struct PropertyBinding {
    pub track_index: usize,
    pub node_handle: NodeHandle,
    pub target: TargetPath,
}
