use glam::Mat4;

use crate::renderer::pipeline::BindGroupLayouts;
use crate::renderer::uniforms::ShadowUniforms;

/// Depth target and light camera for the directional shadow.
pub struct ShadowMap {
    size: u32,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    uniforms: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl ShadowMap {
    #[must_use]
    pub fn new(device: &wgpu::Device, layouts: &BindGroupLayouts, size: u32, format: wgpu::TextureFormat) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Shadow Map"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Comparison Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Shadow Light Uniform Buffer"),
            size: std::mem::size_of::<ShadowUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Light BindGroup"),
            layout: &layouts.shadow,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            }],
        });

        Self {
            size,
            view,
            sampler,
            uniforms,
            bind_group,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue, light_view_projection: Mat4) {
        queue.write_buffer(
            &self.uniforms,
            0,
            bytemuck::bytes_of(&ShadowUniforms { light_view_projection }),
        );
    }

    /// Size of one shadow texel in UV units.
    #[must_use]
    pub fn texel_size(&self) -> f32 {
        1.0 / self.size as f32
    }

    #[must_use]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    #[must_use]
    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}
