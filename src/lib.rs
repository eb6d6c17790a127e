//! # People
//!
//! A skinned character viewer. A base body and a set of clothing slots
//! (hair, eyes, top, shoes, ...) are loaded from glTF files and bound to
//! the body's single skeleton, then one animation clip drives them all.
//!
//! - [`scene`]: node graph, transforms, cameras, lights, skeletons
//! - [`resources`]: geometry, materials, images, primitive shapes
//! - [`animation`]: keyframe tracks, clips, actions and the mixer
//! - [`assets`]: glTF loading into reusable [`assets::Prefab`]s
//! - [`character`]: body extraction, slot binding, assembly
//! - [`renderer`]: wgpu forward renderer with a directional shadow map
//! - [`app`]: winit application and the [`app::Viewer`] scene logic
//! - [`config`]: serde configuration and built-in presets

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod animation;
pub mod app;
pub mod assets;
pub mod character;
pub mod config;
pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod utils;

pub use animation::{AnimationAction, AnimationClip, AnimationMixer, LoopMode};
pub use app::{App, Input, Viewer};
pub use assets::{AssetServer, Prefab, PrefabInstance};
pub use character::{BodyRig, Character, CharacterAssembler};
pub use config::ViewerConfig;
pub use errors::{PeopleError, Result};
pub use renderer::{RenderSettings, Renderer, WgpuContext};
pub use resources::{Color, Geometry, Image, Material, Mesh};
pub use scene::{Camera, Light, Node, NodeHandle, Scene, Skeleton, SkeletonKey};
pub use utils::OrbitControls;
