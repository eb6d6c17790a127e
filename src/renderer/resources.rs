//! GPU resource caches.
//!
//! Geometry buffers, textures and material bind groups are keyed by the id
//! of the CPU resource they mirror, so meshes sharing a geometry or material
//! share the GPU copy. Joint buffers are keyed by skeleton, object buffers
//! by node.

use glam::Mat4;
use rustc_hash::FxHashMap;
use slotmap::SecondaryMap;
use wgpu::util::DeviceExt;

use crate::renderer::pipeline::BindGroupLayouts;
use crate::renderer::uniforms::{LineVertex, MaterialUniforms, MeshVertex, ObjectUniforms};
use crate::resources::{Geometry, Image, Material, Topology};
use crate::scene::{NodeHandle, Scene, SkeletonKey};

pub struct GpuGeometry {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: Option<wgpu::Buffer>,
    /// Index count when indexed, vertex count otherwise
    pub draw_count: u32,
}

pub struct GpuMaterial {
    _uniforms: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

pub struct GpuObject {
    buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    skeleton: Option<SkeletonKey>,
}

pub struct GpuResources {
    geometries: FxHashMap<u64, GpuGeometry>,
    textures: FxHashMap<u64, wgpu::TextureView>,
    materials: FxHashMap<u64, GpuMaterial>,
    joints: SecondaryMap<SkeletonKey, wgpu::Buffer>,
    objects: SecondaryMap<NodeHandle, GpuObject>,

    white_texture: wgpu::TextureView,
    sampler: wgpu::Sampler,
    /// Bound for static meshes, which never read it
    dummy_joints: wgpu::Buffer,
}

impl GpuResources {
    #[must_use]
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let white = Image::solid("White", [255, 255, 255, 255]);
        let white_texture = Self::upload_image(device, queue, &white);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Color Map Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let dummy_joints = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Dummy Joint Buffer"),
            contents: bytemuck::bytes_of(&Mat4::IDENTITY),
            usage: wgpu::BufferUsages::STORAGE,
        });

        Self {
            geometries: FxHashMap::default(),
            textures: FxHashMap::default(),
            materials: FxHashMap::default(),
            joints: SecondaryMap::new(),
            objects: SecondaryMap::new(),
            white_texture,
            sampler,
            dummy_joints,
        }
    }

    fn upload_image(device: &wgpu::Device, queue: &wgpu::Queue, image: &Image) -> wgpu::TextureView {
        let size = wgpu::Extent3d {
            width: image.width(),
            height: image.height(),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(image.label()),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.data(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width()),
                rows_per_image: Some(image.height()),
            },
            size,
        );

        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    // ========================================================================
    // Geometry
    // ========================================================================

    pub fn prepare_geometry(&mut self, device: &wgpu::Device, geometry: &Geometry) {
        if self.geometries.contains_key(&geometry.id()) {
            return;
        }

        let vertex_buffer = match geometry.topology {
            Topology::TriangleList => device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(&MeshVertex::interleave(geometry)),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            Topology::LineList => device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Line Vertex Buffer"),
                contents: bytemuck::cast_slice(&LineVertex::interleave(geometry)),
                usage: wgpu::BufferUsages::VERTEX,
            }),
        };

        let index_buffer = geometry.indices.as_ref().map(|indices| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });

        self.geometries.insert(
            geometry.id(),
            GpuGeometry {
                vertex_buffer,
                index_buffer,
                draw_count: geometry.draw_count(),
            },
        );
    }

    #[must_use]
    pub fn geometry(&self, id: u64) -> Option<&GpuGeometry> {
        self.geometries.get(&id)
    }

    // ========================================================================
    // Material
    // ========================================================================

    pub fn prepare_material(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &BindGroupLayouts,
        material: &Material,
    ) {
        if self.materials.contains_key(&material.id()) {
            return;
        }

        let texture: &wgpu::TextureView = match &material.map {
            Some(image) => self
                .textures
                .entry(image.id())
                .or_insert_with(|| Self::upload_image(device, queue, image)),
            None => &self.white_texture,
        };

        let uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Material Uniforms"),
            contents: bytemuck::bytes_of(&MaterialUniforms::from_material(material)),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material BindGroup"),
            layout: &layouts.material,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(texture),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        self.materials.insert(
            material.id(),
            GpuMaterial {
                _uniforms: uniforms,
                bind_group,
            },
        );
    }

    #[must_use]
    pub fn material(&self, id: u64) -> Option<&GpuMaterial> {
        self.materials.get(&id)
    }

    // ========================================================================
    // Skeletons & objects
    // ========================================================================

    /// Uploads the current joint matrices of every skeleton in the scene.
    pub fn write_joints(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene) {
        for (key, skeleton) in &scene.skeletons {
            let matrices = skeleton.joint_matrices();
            if matrices.is_empty() {
                continue;
            }
            let buffer = self.joints.entry(key).map(|entry| {
                entry.or_insert_with(|| {
                    device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some("Joint Matrices"),
                        size: std::mem::size_of_val(matrices) as u64,
                        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    })
                })
            });
            if let Some(buffer) = buffer {
                queue.write_buffer(buffer, 0, bytemuck::cast_slice(matrices));
            }
        }
    }

    /// Writes the object uniforms for a mesh node, creating its bind group on
    /// first use or when its skeleton changed.
    pub fn prepare_object(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &BindGroupLayouts,
        handle: NodeHandle,
        uniforms: &ObjectUniforms,
        skeleton: Option<SkeletonKey>,
    ) {
        let stale = self.objects.get(handle).is_none_or(|o| o.skeleton != skeleton);

        if stale {
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Object Uniforms"),
                size: std::mem::size_of::<ObjectUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let joints = skeleton
                .and_then(|key| self.joints.get(key))
                .unwrap_or(&self.dummy_joints);

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Object BindGroup"),
                layout: &layouts.object,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: joints.as_entire_binding(),
                    },
                ],
            });

            self.objects.insert(
                handle,
                GpuObject {
                    buffer,
                    bind_group,
                    skeleton,
                },
            );
        }

        if let Some(object) = self.objects.get(handle) {
            queue.write_buffer(&object.buffer, 0, bytemuck::bytes_of(uniforms));
        }
    }

    #[must_use]
    pub fn object(&self, handle: NodeHandle) -> Option<&GpuObject> {
        self.objects.get(handle)
    }

    /// Drops per-node and per-skeleton entries whose owners left the scene.
    pub fn retain_live(&mut self, scene: &Scene) {
        self.objects.retain(|handle, _| scene.meshes.contains_key(handle));
        self.joints.retain(|key, _| scene.skeletons.contains_key(key));
    }
}
