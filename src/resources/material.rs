use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use crate::resources::{Color, Image};

static NEXT_MATERIAL_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AlphaMode {
    #[default]
    Opaque,
    /// Fragments below the cutoff are discarded
    Mask(f32),
    Blend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Front,
    Double,
}

/// Pipeline-affecting state.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialSettings {
    pub alpha_mode: AlphaMode,
    pub side: Side,
    pub depth_write: bool,
}

impl Default for MaterialSettings {
    fn default() -> Self {
        Self {
            alpha_mode: AlphaMode::Opaque,
            side: Side::Front,
            depth_write: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MeshStandardMaterial {
    pub color: Color,
    pub roughness: f32,
    pub metalness: f32,
}

#[derive(Debug, Clone)]
pub struct MeshPhongMaterial {
    pub color: Color,
    pub specular: Color,
    pub shininess: f32,
}

/// Unlit lines; the color multiplies the per-vertex colors.
#[derive(Debug, Clone)]
pub struct LineBasicMaterial {
    pub color: Color,
}

#[derive(Debug, Clone)]
pub enum MaterialData {
    Standard(MeshStandardMaterial),
    Phong(MeshPhongMaterial),
    Line(LineBasicMaterial),
}

/// Surface description shared by meshes through an `Arc`.
///
/// Materials do not change after creation; the renderer builds one bind
/// group per [`Material::id`].
#[derive(Debug)]
pub struct Material {
    id: u64,
    pub uuid: Uuid,
    pub name: Option<String>,
    pub data: MaterialData,
    pub settings: MaterialSettings,
    pub opacity: f32,
    /// Base color texture, sampled with uv0
    pub map: Option<Image>,
}

impl Material {
    fn from_data(data: MaterialData) -> Self {
        Self {
            id: NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed),
            uuid: Uuid::new_v4(),
            name: None,
            data,
            settings: MaterialSettings::default(),
            opacity: 1.0,
            map: None,
        }
    }

    #[must_use]
    pub fn standard(color: Color, roughness: f32, metalness: f32) -> Self {
        Self::from_data(MaterialData::Standard(MeshStandardMaterial {
            color,
            roughness,
            metalness,
        }))
    }

    #[must_use]
    pub fn phong(color: Color, shininess: f32) -> Self {
        Self::from_data(MaterialData::Phong(MeshPhongMaterial {
            color,
            specular: Color::from_hex(0x11_1111),
            shininess,
        }))
    }

    #[must_use]
    pub fn line() -> Self {
        Self::from_data(MaterialData::Line(LineBasicMaterial { color: Color::WHITE }))
    }

    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn with_map(mut self, map: Image) -> Self {
        self.map = Some(map);
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: MaterialSettings) -> Self {
        self.settings = settings;
        self
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn color(&self) -> Color {
        match &self.data {
            MaterialData::Standard(m) => m.color,
            MaterialData::Phong(m) => m.color,
            MaterialData::Line(m) => m.color,
        }
    }

    #[must_use]
    pub fn is_line(&self) -> bool {
        matches!(self.data, MaterialData::Line(_))
    }

    #[must_use]
    pub fn is_blended(&self) -> bool {
        self.settings.alpha_mode == AlphaMode::Blend
    }

    #[must_use]
    pub fn is_double_sided(&self) -> bool {
        self.settings.side == Side::Double
    }

    /// Alpha cutoff, zero unless the material is masked.
    #[must_use]
    pub fn alpha_cutoff(&self) -> f32 {
        match self.settings.alpha_mode {
            AlphaMode::Mask(cutoff) => cutoff,
            _ => 0.0,
        }
    }
}
