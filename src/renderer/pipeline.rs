//! Bind group layouts and the render pipeline cache.
//!
//! Forward pipelines share one layout:
//! - group 0: frame uniforms, shadow map, comparison sampler
//! - group 1: material uniforms, color map, sampler
//! - group 2: object uniforms, joint matrices
//!
//! The shadow pipelines use their own group 0 (light camera) and the object
//! layout as group 1.

use std::borrow::Cow;

use rustc_hash::FxHashMap;

use crate::renderer::shaders;
use crate::renderer::uniforms::{LineVertex, MeshVertex};

/// Distinguishes forward mesh pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub skinned: bool,
    pub blend: bool,
    pub double_sided: bool,
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub struct BindGroupLayouts {
    pub frame: wgpu::BindGroupLayout,
    pub material: wgpu::BindGroupLayout,
    pub object: wgpu::BindGroupLayout,
    pub shadow: wgpu::BindGroupLayout,
}

impl BindGroupLayouts {
    #[must_use]
    pub fn new(device: &wgpu::Device) -> Self {
        let vertex_fragment = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;

        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame BindGroup Layout"),
            entries: &[
                uniform_entry(0, vertex_fragment),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let material = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material BindGroup Layout"),
            entries: &[
                uniform_entry(0, vertex_fragment),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let object = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Object BindGroup Layout"),
            entries: &[
                uniform_entry(0, vertex_fragment),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let shadow = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Light BindGroup Layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
        });

        Self {
            frame,
            material,
            object,
            shadow,
        }
    }
}

/// Lazily built pipelines, one per key.
pub struct PipelineCache {
    color_format: wgpu::TextureFormat,
    depth_format: wgpu::TextureFormat,

    forward_layout: wgpu::PipelineLayout,
    shadow_layout: wgpu::PipelineLayout,

    mesh_shaders: FxHashMap<bool, wgpu::ShaderModule>,
    shadow_shaders: FxHashMap<bool, wgpu::ShaderModule>,

    meshes: FxHashMap<PipelineKey, wgpu::RenderPipeline>,
    shadows: FxHashMap<bool, wgpu::RenderPipeline>,
    line: wgpu::RenderPipeline,
}

impl PipelineCache {
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        layouts: &BindGroupLayouts,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> Self {
        let forward_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Forward Pipeline Layout"),
            bind_group_layouts: &[Some(&layouts.frame), Some(&layouts.material), Some(&layouts.object)],
            immediate_size: 0,
        });

        let shadow_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Pipeline Layout"),
            bind_group_layouts: &[Some(&layouts.shadow), Some(&layouts.object)],
            immediate_size: 0,
        });

        let line = Self::create_line_pipeline(device, &forward_layout, color_format, depth_format);

        Self {
            color_format,
            depth_format,
            forward_layout,
            shadow_layout,
            mesh_shaders: FxHashMap::default(),
            shadow_shaders: FxHashMap::default(),
            meshes: FxHashMap::default(),
            shadows: FxHashMap::default(),
            line,
        }
    }

    fn compile(device: &wgpu::Device, label: &str, source: String) -> wgpu::ShaderModule {
        log::debug!("Compiling shader: {label}");
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(source)),
        })
    }

    /// Builds the forward pipeline for `key` on first use.
    pub fn prepare_mesh(&mut self, device: &wgpu::Device, key: PipelineKey) {
        if self.meshes.contains_key(&key) {
            return;
        }

        let module: &wgpu::ShaderModule = self
            .mesh_shaders
            .entry(key.skinned)
            .or_insert_with(|| Self::compile(device, "Mesh Shader", shaders::mesh_source(key.skinned)));

        let blend = if key.blend {
            wgpu::BlendState::ALPHA_BLENDING
        } else {
            wgpu::BlendState::REPLACE
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Render Pipeline"),
            layout: Some(&self.forward_layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: Some("vs_main"),
                buffers: &[MeshVertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.color_format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: if key.double_sided {
                    None
                } else {
                    Some(wgpu::Face::Back)
                },
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: self.depth_format,
                depth_write_enabled: Some(!key.blend),
                depth_compare: Some(wgpu::CompareFunction::LessEqual),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.meshes.insert(key, pipeline);
    }

    /// Builds the shadow pipeline for one skinning variant on first use.
    pub fn prepare_shadow(&mut self, device: &wgpu::Device, skinned: bool) {
        if self.shadows.contains_key(&skinned) {
            return;
        }

        let module: &wgpu::ShaderModule = self
            .shadow_shaders
            .entry(skinned)
            .or_insert_with(|| Self::compile(device, "Shadow Shader", shaders::shadow_source(skinned)));

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow Pipeline"),
            layout: Some(&self.shadow_layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: Some("vs_main"),
                buffers: &[MeshVertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: self.depth_format,
                depth_write_enabled: Some(true),
                depth_compare: Some(wgpu::CompareFunction::LessEqual),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.shadows.insert(skinned, pipeline);
    }

    fn create_line_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        let module = Self::compile(device, "Line Shader", shaders::line_source());

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Line Render Pipeline"),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[LineVertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_format,
                depth_write_enabled: Some(true),
                depth_compare: Some(wgpu::CompareFunction::LessEqual),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    #[must_use]
    pub fn mesh(&self, key: PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.meshes.get(&key)
    }

    #[must_use]
    pub fn shadow(&self, skinned: bool) -> Option<&wgpu::RenderPipeline> {
        self.shadows.get(&skinned)
    }

    #[must_use]
    pub fn line(&self) -> &wgpu::RenderPipeline {
        &self.line
    }
}
