//! Forward Renderer
//!
//! One frame runs two passes:
//!
//! 1. **Shadow**: depth-only render of every shadow caster from the
//!    directional light, when that light casts shadows.
//! 2. **Forward**: clears to the scene background, then draws opaque and
//!    masked meshes, line geometry, and finally blended meshes back to front.
//!
//! Skinning runs in the vertex shader from per-skeleton joint buffers, so
//! the CPU only uploads one matrix per bone per frame.

pub mod core;
pub mod pipeline;
pub mod resources;
pub mod settings;
pub mod shaders;
pub mod shadow;
pub mod uniforms;

use glam::{Mat4, Vec3};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::errors::Result;
use crate::resources::Topology;
use crate::scene::{Camera, Light, NodeHandle, Scene};

pub use self::core::WgpuContext;
use self::pipeline::{BindGroupLayouts, PipelineCache, PipelineKey};
use self::resources::GpuResources;
pub use self::settings::RenderSettings;
use self::shadow::ShadowMap;
use self::uniforms::{FrameUniforms, ObjectUniforms};

#[derive(Debug, Clone, Copy)]
struct DrawItem {
    handle: NodeHandle,
    geometry: u64,
    material: u64,
    key: PipelineKey,
    /// Squared distance to the camera, for blended sorting
    distance_sq: f32,
}

pub struct Renderer {
    context: WgpuContext,
    layouts: BindGroupLayouts,
    pipelines: PipelineCache,
    resources: GpuResources,
    shadow: ShadowMap,

    frame_uniforms: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,

    // Per-frame draw lists, kept to reuse their allocations
    opaque: Vec<DrawItem>,
    lines: Vec<DrawItem>,
    blended: Vec<DrawItem>,
    casters: Vec<DrawItem>,
}

impl Renderer {
    pub async fn new<W>(window: W, settings: &RenderSettings, width: u32, height: u32) -> Result<Self>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        let context = WgpuContext::new(window, settings, width, height).await?;
        let device = &context.device;

        let layouts = BindGroupLayouts::new(device);
        let pipelines = PipelineCache::new(device, &layouts, context.color_format(), context.depth.format);
        let resources = GpuResources::new(device, &context.queue);
        let shadow = ShadowMap::new(device, &layouts, settings.shadow_map_size, context.depth.format);

        let frame_uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame BindGroup"),
            layout: &layouts.frame,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame_uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(shadow.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(shadow.sampler()),
                },
            ],
        });

        log::info!(
            "Renderer ready: {:?} surface, {}x{} shadow map",
            context.color_format(),
            settings.shadow_map_size,
            settings.shadow_map_size
        );

        Ok(Self {
            context,
            layouts,
            pipelines,
            resources,
            shadow,
            frame_uniforms,
            frame_bind_group,
            opaque: Vec::new(),
            lines: Vec::new(),
            blended: Vec::new(),
            casters: Vec::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.context.resize(width, height);
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.context.size()
    }

    #[must_use]
    pub fn context(&self) -> &WgpuContext {
        &self.context
    }

    /// Draws the scene from its active camera.
    ///
    /// Expects world matrices and joint matrices to be current (see
    /// [`Scene::update`]). Surface errors are logged and skip the frame.
    pub fn render(&mut self, scene: &Scene) {
        let Some(camera) = scene.main_camera() else {
            return;
        };

        let (frame, light_view_projection) = build_frame_uniforms(scene, camera, self.shadow.texel_size());
        self.collect_draws(scene, camera.position(), light_view_projection.is_some());

        let output = match self.context.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(output) | wgpu::CurrentSurfaceTexture::Suboptimal(output) => output,
            wgpu::CurrentSurfaceTexture::Lost | wgpu::CurrentSurfaceTexture::Outdated => {
                let (width, height) = self.context.size();
                self.context.resize(width, height);
                return;
            }
            e => {
                log::error!("Render error: {e:?}");
                return;
            }
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let queue = &self.context.queue;
        queue.write_buffer(&self.frame_uniforms, 0, bytemuck::bytes_of(&frame));

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        if let Some(light_view_projection) = light_view_projection {
            self.shadow.write(queue, light_view_projection);
            self.run_shadow_pass(&mut encoder);
        }
        self.run_forward_pass(&mut encoder, &view, scene.environment.background.to_wgpu());

        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }

    /// Uploads everything visible and sorts it into the draw lists.
    fn collect_draws(&mut self, scene: &Scene, camera_position: Vec3, shadows: bool) {
        let device = &self.context.device;
        let queue = &self.context.queue;

        self.opaque.clear();
        self.lines.clear();
        self.blended.clear();
        self.casters.clear();

        self.resources.retain_live(scene);
        self.resources.write_joints(device, queue, scene);

        for handle in scene.visible_meshes() {
            let (Some(mesh), Some(node)) = (scene.get_mesh(handle), scene.get_node(handle)) else {
                continue;
            };
            if mesh.geometry.vertex_count() == 0 {
                continue;
            }

            let skeleton = mesh
                .skin
                .filter(|_| mesh.is_skinned())
                .map(|skin| skin.skeleton)
                .filter(|&key| scene.skeletons.contains_key(key));

            let world = node.transform.world_matrix_as_mat4();

            self.resources.prepare_geometry(device, &mesh.geometry);
            self.resources
                .prepare_material(device, queue, &self.layouts, &mesh.material);
            self.resources.prepare_object(
                device,
                queue,
                &self.layouts,
                handle,
                &ObjectUniforms::new(world, skeleton.is_some(), mesh.receive_shadow),
                skeleton,
            );

            let key = PipelineKey {
                skinned: skeleton.is_some(),
                blend: mesh.material.is_blended(),
                double_sided: mesh.material.is_double_sided(),
            };
            let item = DrawItem {
                handle,
                geometry: mesh.geometry.id(),
                material: mesh.material.id(),
                key,
                distance_sq: world.w_axis.truncate().distance_squared(camera_position),
            };

            if mesh.geometry.topology == Topology::LineList {
                self.lines.push(item);
                continue;
            }

            self.pipelines.prepare_mesh(device, key);
            if key.blend {
                self.blended.push(item);
            } else {
                self.opaque.push(item);
            }

            if shadows && mesh.cast_shadow {
                self.pipelines.prepare_shadow(device, key.skinned);
                self.casters.push(item);
            }
        }

        self.blended
            .sort_by(|a, b| b.distance_sq.total_cmp(&a.distance_sq));
    }

    fn run_shadow_pass(&self, encoder: &mut wgpu::CommandEncoder) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Depth Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: self.shadow.view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_bind_group(0, &self.shadow.bind_group, &[]);
        for item in &self.casters {
            let Some(pipeline) = self.pipelines.shadow(item.key.skinned) else {
                continue;
            };
            pass.set_pipeline(pipeline);
            self.draw(&mut pass, item, 1);
        }
    }

    fn run_forward_pass(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView, clear: wgpu::Color) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Forward Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.context.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_bind_group(0, &self.frame_bind_group, &[]);

        for item in &self.opaque {
            if let Some(pipeline) = self.pipelines.mesh(item.key) {
                pass.set_pipeline(pipeline);
                self.draw_with_material(&mut pass, item);
            }
        }

        pass.set_pipeline(self.pipelines.line());
        for item in &self.lines {
            self.draw_with_material(&mut pass, item);
        }

        for item in &self.blended {
            if let Some(pipeline) = self.pipelines.mesh(item.key) {
                pass.set_pipeline(pipeline);
                self.draw_with_material(&mut pass, item);
            }
        }
    }

    fn draw_with_material(&self, pass: &mut wgpu::RenderPass<'_>, item: &DrawItem) {
        let Some(material) = self.resources.material(item.material) else {
            return;
        };
        pass.set_bind_group(1, &material.bind_group, &[]);
        self.draw(pass, item, 2);
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>, item: &DrawItem, object_group: u32) {
        let (Some(geometry), Some(object)) = (
            self.resources.geometry(item.geometry),
            self.resources.object(item.handle),
        ) else {
            return;
        };

        pass.set_bind_group(object_group, &object.bind_group, &[]);
        pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
        match &geometry.index_buffer {
            Some(index_buffer) => {
                pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..geometry.draw_count, 0, 0..1);
            }
            None => pass.draw(0..geometry.draw_count, 0..1),
        }
    }
}

/// Frame uniforms for `camera`, plus the light camera when the directional
/// light casts shadows.
///
/// The first hemisphere and the first directional light found are used.
#[must_use]
pub fn build_frame_uniforms(scene: &Scene, camera: &Camera, shadow_texel: f32) -> (FrameUniforms, Option<Mat4>) {
    let mut frame = FrameUniforms {
        view_projection: camera.view_projection_matrix(),
        camera_position: camera.position().extend(1.0),
        ..Default::default()
    };
    frame.params.w = shadow_texel;

    let mut has_hemisphere = false;
    let mut has_directional = false;
    let mut light_view_projection = None;

    for (handle, light) in &scene.lights {
        match light {
            Light::Hemisphere(hemi) if !has_hemisphere => {
                has_hemisphere = true;
                frame.hemisphere_sky = hemi.sky_color.to_vec4(hemi.intensity);
                frame.hemisphere_ground = hemi.ground_color.to_vec4(1.0);
            }
            Light::Directional(dir) if !has_directional => {
                has_directional = true;
                let position = scene.world_position(handle).unwrap_or(Vec3::Y);
                let towards_light = (position - dir.target).normalize_or(Vec3::Y);
                frame.light_direction = towards_light.extend(dir.intensity);
                frame.light_color = dir.color.to_vec4(0.0);

                if dir.cast_shadow {
                    let vp = dir.shadow_view_projection(position);
                    frame.light_view_projection = vp;
                    frame.light_color.w = 1.0;
                    frame.params.z = dir.shadow.bias;
                    light_view_projection = Some(vp);
                }
            }
            _ => {}
        }
    }

    if let Some(fog) = scene.environment.fog {
        frame.fog_color = fog.color.to_vec4(1.0);
        frame.params.x = fog.near;
        frame.params.y = fog.far;
    }

    (frame, light_view_projection)
}
