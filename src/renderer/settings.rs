//! Renderer Settings
//!
//! [`RenderSettings`] is consumed once by [`Renderer::new`](super::Renderer::new)
//! to set up the GPU context and the shadow map.

use crate::config::RenderConfig;

/// Global configuration for renderer initialization.
///
/// | Field              | Description                       | Default            |
/// |--------------------|-----------------------------------|--------------------|
/// | `vsync`            | Vertical sync enabled             | `true`             |
/// | `power_preference` | GPU adapter selection strategy    | `HighPerformance`  |
/// | `required_features`| Required wgpu features            | Empty              |
/// | `required_limits`  | Required wgpu limits              | Default            |
/// | `depth_format`     | Depth buffer texture format       | `Depth32Float`     |
/// | `shadow_map_size`  | Shadow map edge length in texels  | `1024`             |
#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Enable vertical synchronization (VSync).
    ///
    /// When `true`, the frame rate is capped to the display refresh rate.
    pub vsync: bool,

    /// GPU adapter selection preference.
    ///
    /// - `HighPerformance`: Prefer discrete / dedicated GPU
    /// - `LowPower`: Prefer integrated GPU (better battery life)
    pub power_preference: wgpu::PowerPreference,

    /// Required wgpu features that must be supported by the adapter.
    pub required_features: wgpu::Features,

    /// Required wgpu limits (max buffer sizes, binding counts, etc.).
    pub required_limits: wgpu::Limits,

    /// Depth buffer texture format, shared by the main pass and the shadow map.
    pub depth_format: wgpu::TextureFormat,

    /// Edge length of the square directional shadow map.
    pub shadow_map_size: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            vsync: true,
            power_preference: wgpu::PowerPreference::HighPerformance,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            depth_format: wgpu::TextureFormat::Depth32Float,
            shadow_map_size: 1024,
        }
    }
}

impl From<&RenderConfig> for RenderSettings {
    fn from(config: &RenderConfig) -> Self {
        Self {
            vsync: config.vsync,
            power_preference: if config.high_performance {
                wgpu::PowerPreference::HighPerformance
            } else {
                wgpu::PowerPreference::LowPower
            },
            shadow_map_size: config.shadow_map_size.max(1),
            ..Default::default()
        }
    }
}
