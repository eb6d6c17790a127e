//! Viewer State
//!
//! [`Viewer`] owns the scene and everything that changes it between frames:
//! the orbit camera, the animated character and the optional room. It has no
//! GPU state, so the whole scene setup runs without a window.

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::Vec3;

use crate::app::input::Input;
use crate::assets::{AssetServer, ModelLoadResult};
use crate::character::{Character, CharacterAssembler};
use crate::config::{RoomConfig, ViewerConfig};
use crate::errors::Result;
use crate::resources::primitives::{PlaneOptions, create_grid, create_plane};
use crate::resources::{Material, Mesh};
use crate::scene::{Camera, Fog, Light, Node, NodeHandle, Scene};
use crate::utils::OrbitControls;

/// Pending background load of the room model.
struct RoomLoad {
    config: RoomConfig,
    rx: flume::Receiver<ModelLoadResult>,
}

pub struct Viewer {
    pub scene: Scene,
    pub config: ViewerConfig,
    pub assets: AssetServer,

    pub camera: NodeHandle,
    pub controls: OrbitControls,
    pub hemisphere_light: Option<NodeHandle>,
    pub directional_light: Option<NodeHandle>,
    pub plane: Option<NodeHandle>,
    pub grid: Option<NodeHandle>,

    pub character: Option<Character>,
    pub room: Option<NodeHandle>,
    room_load: Option<RoomLoad>,
}

impl Viewer {
    /// Builds the static scene: atmosphere, camera, lights, ground and grid.
    ///
    /// `width` and `height` give the initial camera aspect.
    #[must_use]
    pub fn new(config: ViewerConfig, width: u32, height: u32) -> Self {
        let assets = AssetServer::new(&config.asset_root);
        let mut scene = Scene::new();

        let camera = Self::init_camera(&mut scene, &config, width, height);
        let controls = OrbitControls::looking_at(
            Vec3::from_array(config.camera.position),
            Vec3::from_array(config.camera.target),
        )
        .with_config(&config.controls);

        let mut viewer = Self {
            scene,
            config,
            assets,
            camera,
            controls,
            hemisphere_light: None,
            directional_light: None,
            plane: None,
            grid: None,
            character: None,
            room: None,
            room_load: None,
        };

        viewer.init_scene();
        viewer.init_lights();
        viewer.init_plane();
        viewer.enable_shadow();
        viewer.init_grid();
        viewer
    }

    /// Background color and fog.
    fn init_scene(&mut self) {
        let env = &mut self.scene.environment;
        env.background = self.config.scene.background;
        env.fog = self
            .config
            .scene
            .fog
            .as_ref()
            .map(|f| Fog::new(f.color, f.near, f.far));
    }

    fn init_camera(scene: &mut Scene, config: &ViewerConfig, width: u32, height: u32) -> NodeHandle {
        let cfg = &config.camera;
        let mut camera = Camera::new_perspective(cfg.fov, 1.0, cfg.near, cfg.far);
        camera.set_aspect(width, height);

        let handle = scene.add_camera(camera);
        if let Some(node) = scene.get_node_mut(handle) {
            node.transform.position = Vec3::from_array(cfg.position);
            node.transform.look_at(Vec3::from_array(cfg.target), Vec3::Y);
        }
        handle
    }

    fn init_lights(&mut self) {
        let cfg = &self.config.lights;

        let hemi = self.scene.add_light(Light::hemisphere(
            cfg.hemisphere_sky,
            cfg.hemisphere_ground,
            cfg.hemisphere_intensity,
        ));

        let dir = self
            .scene
            .add_light(Light::directional(cfg.directional_color, cfg.directional_intensity));
        if let Some(node) = self.scene.get_node_mut(dir) {
            node.transform.position = Vec3::from_array(cfg.directional_position);
        }

        self.hemisphere_light = Some(hemi);
        self.directional_light = Some(dir);
    }

    /// Ground plane, lying flat on XZ.
    fn init_plane(&mut self) {
        let cfg = &self.config.ground;
        if !cfg.enabled {
            return;
        }

        let geometry = create_plane(&PlaneOptions {
            width: cfg.size,
            height: cfg.size,
            ..Default::default()
        });
        let material = Material::phong(cfg.color, cfg.shininess).with_name("ground");
        let mesh = Mesh::new(Arc::new(geometry), Arc::new(material));

        let handle = self.scene.add_node(Node::new());
        self.scene.set_name(handle, "ground");
        self.scene.set_mesh(handle, mesh);
        if let Some(node) = self.scene.get_node_mut(handle) {
            node.transform.rotate_x(-FRAC_PI_2);
        }
        self.plane = Some(handle);
    }

    /// Turns on the directional shadow and marks the ground as a receiver.
    fn enable_shadow(&mut self) {
        let cast = self.config.lights.cast_shadow;

        if let Some(Light::Directional(light)) = self.directional_light.and_then(|h| self.scene.lights.get_mut(h)) {
            light.cast_shadow = cast;
        }

        if let Some(plane) = self.plane
            && let Some(mesh) = self.scene.get_mesh_mut(plane)
        {
            mesh.receive_shadow = self.config.ground.receive_shadow;
        }
    }

    fn init_grid(&mut self) {
        let cfg = &self.config.grid;
        if !cfg.enabled {
            return;
        }

        let geometry = create_grid(cfg.size, cfg.divisions, cfg.center_color, cfg.grid_color);
        let mesh = Mesh::new(Arc::new(geometry), Arc::new(Material::line().with_name("grid")));

        let handle = self.scene.add_node(Node::new());
        self.scene.set_name(handle, "grid");
        self.scene.set_mesh(handle, mesh);
        self.grid = Some(handle);
    }

    /// Loads and assembles the character, then starts its clip.
    pub async fn attach_character(&mut self) -> Result<()> {
        let assembler = CharacterAssembler::new(&self.assets, &self.config.character);
        let character = assembler.load(&mut self.scene).await?;

        log::info!(
            "Character '{}' ready: {} slots, {} clips",
            self.config.character.group_name,
            character.slots.len(),
            character.mixer.actions().len()
        );
        self.character = Some(character);
        Ok(())
    }

    /// Starts loading the configured room on `runtime`.
    ///
    /// Does nothing when the config has no room.
    pub fn spawn_room(&mut self, runtime: &tokio::runtime::Handle) {
        let Some(config) = self.config.room.clone() else {
            return;
        };
        let rx = self.assets.spawn_model(runtime, &config.path);
        self.room_load = Some(RoomLoad { config, rx });
    }

    /// True while a background load has not delivered its result.
    #[must_use]
    pub fn has_pending_loads(&self) -> bool {
        self.room_load.is_some()
    }

    /// Adds finished background loads to the scene. Never blocks.
    pub fn poll_background_loads(&mut self) {
        let Some(load) = &self.room_load else {
            return;
        };

        let result = match load.rx.try_recv() {
            Ok(result) => result,
            Err(flume::TryRecvError::Empty) => return,
            Err(flume::TryRecvError::Disconnected) => {
                log::warn!("Room loader stopped without a result");
                self.room_load = None;
                return;
            }
        };

        let Some(load) = self.room_load.take() else {
            return;
        };

        match result {
            Ok(prefab) => {
                let instance = prefab.instantiate(&mut self.scene, None);
                let cfg = &load.config;

                if let Some(node) = self.scene.get_node_mut(instance.root) {
                    node.transform.position = Vec3::from_array(cfg.position);
                    node.transform.scale = Vec3::splat(cfg.scale);
                }
                for &handle in &instance.nodes {
                    if let Some(mesh) = self.scene.get_mesh_mut(handle) {
                        mesh.cast_shadow = cfg.cast_shadow;
                        mesh.receive_shadow = cfg.receive_shadow;
                    }
                }

                log::info!("Room '{}' added ({} nodes)", cfg.path, instance.nodes.len());
                self.room = Some(instance.root);
            }
            Err(e) => log::error!("Failed to load room '{}': {e}", load.config.path),
        }
    }

    /// Window resize: camera aspect and projection.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        if let Some(camera) = self.scene.cameras.get_mut(self.camera) {
            camera.set_aspect(width, height);
        }
    }

    /// One frame of logic.
    pub fn tick(&mut self, dt: f32, input: &Input) {
        self.poll_background_loads();

        let fov = self
            .scene
            .cameras
            .get(self.camera)
            .map_or(self.config.camera.fov, |c| c.fov.to_degrees());
        if let Some(node) = self.scene.get_node_mut(self.camera) {
            self.controls.update(&mut node.transform, input, fov, dt);
        }

        if let Some(character) = &mut self.character {
            character.update(dt, &mut self.scene);
        }

        self.scene.update();
    }
}
