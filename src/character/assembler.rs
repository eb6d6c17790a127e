use glam::{Quat, Vec3};

use crate::animation::AnimationMixer;
use crate::assets::AssetServer;
use crate::character::body::{BodyRig, load_body};
use crate::character::slot::load_slot;
use crate::config::CharacterConfig;
use crate::errors::{PeopleError, Result};
use crate::scene::{NodeHandle, Scene};

/// A fully assembled, animated character.
pub struct Character {
    /// Group holding the body and every slot
    pub group: NodeHandle,
    pub body: BodyRig,
    /// Slot groups in load order
    pub slots: Vec<NodeHandle>,
    pub mixer: AnimationMixer,
    /// Index of the action started at load
    pub active_action: usize,
}

impl Character {
    /// Advances the character's animation by `dt` seconds.
    pub fn update(&mut self, dt: f32, scene: &mut Scene) {
        self.mixer.update(dt, scene);
    }
}

/// Loads the body and its slots and wires them into one animated group.
pub struct CharacterAssembler<'a> {
    server: &'a AssetServer,
    config: &'a CharacterConfig,
}

impl<'a> CharacterAssembler<'a> {
    #[must_use]
    pub fn new(server: &'a AssetServer, config: &'a CharacterConfig) -> Self {
        Self { server, config }
    }

    /// Loads the body first, then each slot in order, then starts the
    /// configured clip.
    pub async fn load(&self, scene: &mut Scene) -> Result<Character> {
        let config = self.config;

        let body = load_body(self.server, scene, &config.body).await?;

        let mut slots = Vec::with_capacity(config.slots.len());
        for slot in &config.slots {
            slots.push(load_slot(self.server, scene, &body, slot).await?);
        }

        let group = scene.add_group(&config.group_name);
        scene.attach(body.body_mesh, group);
        for &slot in &slots {
            scene.attach(slot, group);
        }

        if let Some(node) = scene.get_node_mut(group) {
            node.transform.rotation = Quat::from_rotation_x(config.rotation_x);
            node.transform.scale = Vec3::splat(config.scale);
        }

        let mut mixer = AnimationMixer::new(group);
        for clip in &body.animations {
            mixer.clip_action(scene, clip.clone());
        }

        let count = mixer.actions().len();
        let action = mixer
            .action_mut(config.clip_index)
            .ok_or(PeopleError::ClipIndexOutOfRange {
                index: config.clip_index,
                count,
            })?;
        action.play();
        log::info!("Playing clip '{}'", action.clip().name);

        Ok(Character {
            group,
            body,
            slots,
            mixer,
            active_action: config.clip_index,
        })
    }
}
