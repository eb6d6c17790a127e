use std::sync::Arc;

use crate::animation::action::{AnimationAction, TrackValue};
use crate::animation::binder::Binder;
use crate::animation::binding::TargetPath;
use crate::animation::clip::AnimationClip;
use crate::scene::{NodeHandle, Scene};

/// Plays actions against the nodes under one root.
pub struct AnimationMixer {
    root: NodeHandle,
    actions: Vec<AnimationAction>,
}

impl AnimationMixer {
    #[must_use]
    pub fn new(root: NodeHandle) -> Self {
        Self {
            root,
            actions: Vec::new(),
        }
    }

    #[must_use]
    pub fn root(&self) -> NodeHandle {
        self.root
    }

    /// Returns the index of the action for `clip`, creating and binding it
    /// on first use. Actions keep creation order.
    pub fn clip_action(&mut self, scene: &Scene, clip: Arc<AnimationClip>) -> usize {
        if let Some(index) = self.actions.iter().position(|a| Arc::ptr_eq(a.clip(), &clip)) {
            return index;
        }

        let mut action = AnimationAction::new(clip);
        action.bindings = Binder::bind(scene, self.root, action.clip());
        log::debug!(
            "Bound clip '{}': {}/{} tracks",
            action.clip().name,
            action.bindings.len(),
            action.clip().tracks.len()
        );

        self.actions.push(action);
        self.actions.len() - 1
    }

    #[must_use]
    pub fn action(&self, index: usize) -> Option<&AnimationAction> {
        self.actions.get(index)
    }

    pub fn action_mut(&mut self, index: usize) -> Option<&mut AnimationAction> {
        self.actions.get_mut(index)
    }

    #[must_use]
    pub fn actions(&self) -> &[AnimationAction] {
        &self.actions
    }

    /// Stops every action.
    pub fn stop_all_actions(&mut self) {
        for action in &mut self.actions {
            action.stop();
        }
    }

    /// Advances every running action and writes the sampled values into the
    /// bound node transforms.
    pub fn update(&mut self, dt: f32, scene: &mut Scene) {
        for action in &mut self.actions {
            action.update(dt);

            if !action.is_playing() || action.weight <= 0.0 {
                continue;
            }
            let weight = action.weight.min(1.0);

            for i in 0..action.bindings.len() {
                let (track_index, node_handle, target) = {
                    let b = &action.bindings[i];
                    (b.track_index, b.node_handle, b.target)
                };
                let Some(value) = action.sample_track(track_index) else {
                    continue;
                };
                let Some(node) = scene.get_node_mut(node_handle) else {
                    continue;
                };

                let transform = &mut node.transform;
                let full = weight >= 1.0;
                match (value, target) {
                    (TrackValue::Vector3(v), TargetPath::Translation) => {
                        transform.position = if full { v } else { transform.position.lerp(v, weight) };
                    }
                    (TrackValue::Vector3(v), TargetPath::Scale) => {
                        transform.scale = if full { v } else { transform.scale.lerp(v, weight) };
                    }
                    (TrackValue::Quaternion(q), TargetPath::Rotation) => {
                        transform.rotation = if full { q } else { transform.rotation.slerp(q, weight) };
                    }
                    _ => {}
                }
            }
        }
    }
}
