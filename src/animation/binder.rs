use crate::animation::binding::PropertyBinding;
use crate::animation::clip::AnimationClip;
use crate::scene::{NodeHandle, Scene};

pub struct Binder;

impl Binder {
    /// Resolves each track of `clip` to the first node under `root` with the
    /// track's node name. Unresolved tracks are skipped.
    #[must_use]
    pub fn bind(scene: &Scene, root: NodeHandle, clip: &AnimationClip) -> Vec<PropertyBinding> {
        let mut bindings = Vec::with_capacity(clip.tracks.len());

        for (track_index, track) in clip.tracks.iter().enumerate() {
            let node_name = &track.meta.node_name;

            match scene.find_node_by_name(root, node_name) {
                Some(node_handle) => bindings.push(PropertyBinding {
                    track_index,
                    node_handle,
                    target: track.meta.target,
                }),
                None => log::debug!("Clip '{}': no node named '{}', track skipped", clip.name, node_name),
            }
        }

        bindings
    }
}
