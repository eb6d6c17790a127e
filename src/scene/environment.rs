use crate::resources::Color;

/// Linear distance fog.
#[derive(Debug, Clone, Copy)]
pub struct Fog {
    pub color: Color,
    pub near: f32,
    pub far: f32,
}

impl Fog {
    #[must_use]
    pub fn new(color: Color, near: f32, far: f32) -> Self {
        Self { color, near, far }
    }

    /// Fog blend factor at `distance` from the camera, in `[0, 1]`.
    #[must_use]
    pub fn factor(&self, distance: f32) -> f32 {
        if self.far <= self.near {
            return 0.0;
        }
        ((distance - self.near) / (self.far - self.near)).clamp(0.0, 1.0)
    }
}

/// Scene-wide background and atmosphere settings.
#[derive(Debug, Clone)]
pub struct Environment {
    pub background: Color,
    pub fog: Option<Fog>,
}

impl Environment {
    #[must_use]
    pub fn new() -> Self {
        Self {
            background: Color::BLACK,
            fog: None,
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
