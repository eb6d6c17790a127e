//! Viewer Configuration
//!
//! [`ViewerConfig`] describes everything the viewer sets up: window, scene
//! atmosphere, camera, lights, ground, grid, the character and the optional
//! room. Every field has a default, so a manifest only lists what it
//! changes:
//!
//! ```json
//! {
//!   "scene": { "background": "#202020" },
//!   "character": { "clip_index": 0 }
//! }
//! ```
//!
//! Three built-in presets cover the stock scenes: `people`, `room` and
//! `room-grid` (see [`ViewerConfig::preset`]).

use std::f32::consts::FRAC_PI_2;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{PeopleError, Result};
use crate::resources::Color;

/// Names accepted by [`ViewerConfig::preset`].
pub const PRESETS: &[&str] = &["people", "room", "room-grid"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Directory model paths are resolved against
    pub asset_root: PathBuf,
    pub window: WindowConfig,
    pub render: RenderConfig,
    pub scene: SceneConfig,
    pub camera: CameraConfig,
    pub lights: LightsConfig,
    pub ground: GroundConfig,
    pub grid: GridConfig,
    pub controls: ControlsConfig,
    pub character: CharacterConfig,
    /// Loaded in the background when present
    pub room: Option<RoomConfig>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            window: WindowConfig::default(),
            render: RenderConfig::default(),
            scene: SceneConfig::default(),
            camera: CameraConfig::default(),
            lights: LightsConfig::default(),
            ground: GroundConfig::default(),
            grid: GridConfig::default(),
            controls: ControlsConfig::default(),
            character: CharacterConfig::default(),
            room: None,
        }
    }
}

impl ViewerConfig {
    /// Built-in configuration by name.
    ///
    /// - `people`: character on a shadowed ground plane with a grid
    /// - `room`: character inside the room model, no plane or grid
    /// - `room-grid`: like `room`, with the grid kept
    pub fn preset(name: &str) -> Result<Self> {
        let mut config = Self::default();
        match name {
            "people" => {}
            "room" => {
                config.window.title = "People: room".to_string();
                config.room = Some(RoomConfig::default());
                config.ground.enabled = false;
                config.grid.enabled = false;
            }
            "room-grid" => {
                config.window.title = "People: room + grid".to_string();
                config.room = Some(RoomConfig::default());
                config.ground.enabled = false;
            }
            other => return Err(PeopleError::UnknownPreset(other.to_string())),
        }
        Ok(config)
    }

    /// Parses a JSON manifest. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON manifest from disk.
    ///
    /// A relative `asset_root` in the file is resolved against the manifest's
    /// directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| PeopleError::AssetRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_json(&json)?;

        if config.asset_root.is_relative()
            && let Some(dir) = path.parent()
        {
            config.asset_root = dir.join(&config.asset_root);
        }
        Ok(config)
    }

    /// Preset name or manifest path, as given on the command line.
    pub fn from_arg(arg: &str) -> Result<Self> {
        if arg.ends_with(".json") {
            Self::from_file(arg)
        } else {
            Self::preset(arg)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "People".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub vsync: bool,
    /// Prefer the discrete GPU
    pub high_performance: bool,
    /// Shadow map edge length in texels
    pub shadow_map_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            vsync: true,
            high_performance: true,
            shadow_map_size: 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub background: Color,
    pub fog: Option<FogConfig>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: Color::from_hex(0x88_8888),
            fog: Some(FogConfig::default()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FogConfig {
    pub color: Color,
    pub near: f32,
    pub far: f32,
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            color: Color::from_hex(0xa0_a0a0),
            near: 10.0,
            far: 50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view, degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    /// Orbit pivot
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 45.0,
            near: 0.1,
            far: 1000.0,
            position: [5.0, 5.0, 10.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LightsConfig {
    pub hemisphere_sky: Color,
    pub hemisphere_ground: Color,
    pub hemisphere_intensity: f32,
    pub directional_color: Color,
    pub directional_intensity: f32,
    pub directional_position: [f32; 3],
    pub cast_shadow: bool,
}

impl Default for LightsConfig {
    fn default() -> Self {
        Self {
            hemisphere_sky: Color::from_hex(0xa0_a0a0),
            hemisphere_ground: Color::from_hex(0x88_8888),
            hemisphere_intensity: 1.0,
            directional_color: Color::WHITE,
            directional_intensity: 1.0,
            directional_position: [5.0, 5.0, 5.0],
            cast_shadow: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    pub enabled: bool,
    pub size: f32,
    pub color: Color,
    pub shininess: f32,
    pub receive_shadow: bool,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            size: 100.0,
            color: Color::WHITE,
            shininess: 30.0,
            receive_shadow: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub enabled: bool,
    pub size: f32,
    pub divisions: u32,
    pub center_color: Color,
    pub grid_color: Color,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            size: 100.0,
            divisions: 100,
            center_color: Color::from_hex(0xff_0000),
            grid_color: Color::from_hex(0x88_8888),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
        }
    }
}

/// Base body: the mesh that owns the shared skeleton.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    pub path: String,
    /// Name of the skinned mesh node inside the body file
    pub mesh_name: String,
    pub color: Color,
    pub roughness: f32,
    pub metalness: f32,
    pub cast_shadow: bool,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            path: "models/gltf/body.glb".to_string(),
            mesh_name: "body_fixed".to_string(),
            color: Color::from_hex(0xff_c0cb),
            roughness: 0.4,
            metalness: 0.0,
            cast_shadow: true,
        }
    }
}

/// One clothing or appendage file bound to the body skeleton.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotConfig {
    /// Group name for the slot's meshes
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub cast_shadow: bool,
}

impl SlotConfig {
    #[must_use]
    pub fn new(name: &str, path: &str, cast_shadow: bool) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            cast_shadow,
        }
    }
}

/// The stock outfit, in load order.
#[must_use]
pub fn default_slots() -> Vec<SlotConfig> {
    vec![
        SlotConfig::new("hair", "models/gltf/hair/hair02.glb", true),
        SlotConfig::new("eyes", "models/gltf/eyes/eyes02.glb", false),
        SlotConfig::new("eyebrow", "models/gltf/eyebrow/eyebrow01.glb", false),
        SlotConfig::new("mouth", "models/gltf/mouth/mouth01.glb", false),
        SlotConfig::new("top", "models/gltf/top/top02.glb", false),
        SlotConfig::new("bottom", "models/gltf/bottom/bottom02.glb", false),
        SlotConfig::new("shoes", "models/gltf/shoes/shoes01.glb", false),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    /// Name of the group holding the body and every slot
    pub group_name: String,
    pub body: BodyConfig,
    pub slots: Vec<SlotConfig>,
    /// Rotation of the group about X, radians
    pub rotation_x: f32,
    pub scale: f32,
    /// Clip played once the character is assembled
    pub clip_index: usize,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            group_name: "character".to_string(),
            body: BodyConfig::default(),
            slots: default_slots(),
            rotation_x: FRAC_PI_2,
            scale: 0.01,
            clip_index: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    pub path: String,
    pub position: [f32; 3],
    pub scale: f32,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            path: "models/gltf/room/room.glb".to_string(),
            position: [0.0, 0.0, 0.0],
            scale: 1.0,
            cast_shadow: false,
            receive_shadow: true,
        }
    }
}
