//! GPU-side data layouts.
//!
//! Every struct here mirrors a WGSL struct in [`shaders`](super::shaders).
//! Uniform structs use only `mat4x4` and `vec4` members so the Rust and
//! WGSL layouts agree without manual padding.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::resources::{Geometry, Material, MaterialData};

// ============================================================================
// Vertices
// ============================================================================

/// Interleaved vertex for lit meshes. Static meshes carry zero weights.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub joints: [u32; 4],
    pub weights: [f32; 4],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
        3 => Uint32x4,
        4 => Float32x4,
    ];

    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    /// Interleaves the geometry's attribute streams. Missing streams fall
    /// back to +Y normals, zero UVs and zero skin weights.
    #[must_use]
    pub fn interleave(geometry: &Geometry) -> Vec<Self> {
        (0..geometry.vertex_count())
            .map(|i| Self {
                position: geometry.positions[i],
                normal: geometry.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                uv: geometry.uvs.get(i).copied().unwrap_or_default(),
                joints: geometry.joints.get(i).copied().unwrap_or_default(),
                weights: geometry.weights.get(i).copied().unwrap_or_default(),
            })
            .collect()
    }
}

/// Vertex for unlit line geometry.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl LineVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
    ];

    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    /// Vertices without a color are white.
    #[must_use]
    pub fn interleave(geometry: &Geometry) -> Vec<Self> {
        (0..geometry.vertex_count())
            .map(|i| Self {
                position: geometry.positions[i],
                color: geometry.colors.get(i).copied().unwrap_or([1.0; 3]),
            })
            .collect()
    }
}

// ============================================================================
// Group 0: frame
// ============================================================================

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_projection: Mat4,
    pub light_view_projection: Mat4,
    /// xyz: camera world position
    pub camera_position: Vec4,
    /// rgb: sky color, w: intensity
    pub hemisphere_sky: Vec4,
    /// rgb: ground color
    pub hemisphere_ground: Vec4,
    /// xyz: unit vector towards the light, w: intensity
    pub light_direction: Vec4,
    /// rgb: light color, w: 1 when the shadow map is valid
    pub light_color: Vec4,
    /// rgb: fog color, w: 1 when fog is on
    pub fog_color: Vec4,
    /// x: fog near, y: fog far, z: shadow bias, w: shadow texel size
    pub params: Vec4,
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self {
            view_projection: Mat4::IDENTITY,
            light_view_projection: Mat4::IDENTITY,
            camera_position: Vec4::ZERO,
            hemisphere_sky: Vec4::ZERO,
            hemisphere_ground: Vec4::ZERO,
            light_direction: Vec4::new(0.0, 1.0, 0.0, 0.0),
            light_color: Vec4::ZERO,
            fog_color: Vec4::ZERO,
            params: Vec4::ZERO,
        }
    }
}

/// Shadow pass camera.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ShadowUniforms {
    pub light_view_projection: Mat4,
}

// ============================================================================
// Group 1: material
// ============================================================================

/// Shading model selector stored in `MaterialUniforms::params.w`.
const MODEL_STANDARD: f32 = 0.0;
const MODEL_PHONG: f32 = 1.0;
const MODEL_LINE: f32 = 2.0;

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct MaterialUniforms {
    /// rgb: base color, a: opacity
    pub color: Vec4,
    /// rgb: specular color, w: shininess
    pub specular: Vec4,
    /// x: alpha cutoff, y: 1 when a color map is bound, w: shading model
    pub params: Vec4,
}

impl MaterialUniforms {
    /// Maps every material kind onto one Blinn-Phong parameter set.
    ///
    /// Standard materials derive shininess from roughness and tint the
    /// specular by metalness.
    #[must_use]
    pub fn from_material(material: &Material) -> Self {
        let color = material.color().to_vec4(material.opacity);
        let (specular, model) = match &material.data {
            MaterialData::Standard(m) => {
                let r = m.roughness.clamp(0.04, 1.0);
                let shininess = (2.0 / (r * r * r * r) - 2.0).clamp(1.0, 1024.0);
                let f0 = glam::Vec3::splat(0.04).lerp(m.color.to_vec3(), m.metalness.clamp(0.0, 1.0));
                let strength = 1.0 - r;
                ((f0 * strength).extend(shininess), MODEL_STANDARD)
            }
            MaterialData::Phong(m) => (m.specular.to_vec3().extend(m.shininess.max(1.0)), MODEL_PHONG),
            MaterialData::Line(_) => (Vec4::ZERO, MODEL_LINE),
        };

        Self {
            color,
            specular,
            params: Vec4::new(
                material.alpha_cutoff(),
                if material.map.is_some() { 1.0 } else { 0.0 },
                0.0,
                model,
            ),
        }
    }
}

// ============================================================================
// Group 2: object
// ============================================================================

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ObjectUniforms {
    pub model: Mat4,
    /// Inverse transpose of `model`
    pub normal_matrix: Mat4,
    /// x: 1 when skinned, y: 1 when receiving shadows
    pub flags: Vec4,
}

impl ObjectUniforms {
    #[must_use]
    pub fn new(model: Mat4, skinned: bool, receive_shadow: bool) -> Self {
        Self {
            model,
            normal_matrix: model.inverse().transpose(),
            flags: Vec4::new(
                if skinned { 1.0 } else { 0.0 },
                if receive_shadow { 1.0 } else { 0.0 },
                0.0,
                0.0,
            ),
        }
    }
}
