use glam::{Mat4, Vec3};

use crate::resources::Color;

/// Shadow camera parameters for a directional light.
///
/// The shadow camera is orthographic, centred on the light target and
/// looking from the light position. The map resolution is a renderer
/// setting.
#[derive(Debug, Clone)]
pub struct ShadowConfig {
    pub bias: f32,
    /// Half extent of the orthographic shadow frustum
    pub extent: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            bias: 0.0005,
            extent: 5.0,
            near: 0.5,
            far: 500.0,
        }
    }
}

/// Sky/ground gradient ambient light.
#[derive(Debug, Clone)]
pub struct HemisphereLight {
    pub sky_color: Color,
    pub ground_color: Color,
    pub intensity: f32,
}

/// Parallel light shining from the node position towards `target`.
#[derive(Debug, Clone)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    /// World-space point the light aims at
    pub target: Vec3,
    pub cast_shadow: bool,
    pub shadow: ShadowConfig,
}

impl DirectionalLight {
    /// View-projection of the shadow camera for a light placed at `position`.
    #[must_use]
    pub fn shadow_view_projection(&self, position: Vec3) -> Mat4 {
        let dir = (self.target - position).normalize_or_zero();
        let up = if dir.cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(position, self.target, up);
        let e = self.shadow.extent;
        let proj = Mat4::orthographic_rh(-e, e, -e, e, self.shadow.near, self.shadow.far);
        proj * view
    }
}

/// Light component attached to a scene node.
#[derive(Debug, Clone)]
pub enum Light {
    Hemisphere(HemisphereLight),
    Directional(DirectionalLight),
}

impl Light {
    #[must_use]
    pub fn hemisphere(sky_color: Color, ground_color: Color, intensity: f32) -> Self {
        Self::Hemisphere(HemisphereLight {
            sky_color,
            ground_color,
            intensity,
        })
    }

    #[must_use]
    pub fn directional(color: Color, intensity: f32) -> Self {
        Self::Directional(DirectionalLight {
            color,
            intensity,
            target: Vec3::ZERO,
            cast_shadow: false,
            shadow: ShadowConfig::default(),
        })
    }
}
