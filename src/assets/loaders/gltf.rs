use std::collections::HashSet;
use std::sync::Arc;

use glam::{Affine3A, Mat4, Quat, Vec3};
use gltf::animation::util::ReadOutputs;
use rustc_hash::FxHashMap;

use crate::animation::binding::TargetPath;
use crate::animation::clip::{AnimationClip, Track, TrackData, TrackMeta};
use crate::animation::tracks::{InterpolationMode, KeyframeTrack};
use crate::assets::io::{AssetReader, decode_data_uri};
use crate::assets::prefab::{Prefab, PrefabNode, PrefabSkeleton};
use crate::errors::{PeopleError, Result};
use crate::resources::{
    AlphaMode, Color, Geometry, Image, Material, MaterialSettings, Mesh, Side, Topology,
};

const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

/// Builds [`Prefab`]s from glTF 2.0 files (`.glb` or `.gltf`).
pub struct GltfLoader {
    buffers: Vec<Vec<u8>>,
    images: FxHashMap<usize, Image>,
    materials: Vec<Arc<Material>>,
    default_material: Option<Arc<Material>>,
}

impl GltfLoader {
    /// Parses `bytes` into a prefab.
    ///
    /// External buffers and images are read through `reader`, relative to
    /// `base_uri` (the directory of the model file).
    pub async fn parse<R: AssetReader>(bytes: &[u8], base_uri: &str, reader: &R) -> Result<Prefab> {
        let gltf = gltf::Gltf::from_slice(bytes)?;

        Self::report_extensions(&gltf);

        let buffers = Self::load_buffers(&gltf, base_uri, reader).await?;
        let images = Self::load_images(&gltf, &buffers, base_uri, reader).await?;

        let mut loader = Self {
            buffers,
            images,
            materials: Vec::new(),
            default_material: None,
        };
        loader.load_materials(&gltf);
        loader.build_prefab(&gltf)
    }

    fn report_extensions(gltf: &gltf::Gltf) {
        // No extension is implemented, so every required one is unsupported
        let required: Vec<&str> = gltf.extensions_required().collect();

        if required.contains(&DRACO_EXTENSION) {
            log::error!("Draco-compressed meshes are not supported; affected primitives will be empty");
        }
        if !required.is_empty() {
            log::warn!("glTF file requires unsupported extensions: {required:?}");
        }

        let used: Vec<&str> = gltf
            .extensions_used()
            .filter(|ext| !required.contains(ext))
            .collect();
        if !used.is_empty() {
            log::debug!("glTF file uses extensions that are ignored: {used:?}");
        }
    }

    async fn read_uri<R: AssetReader>(uri: &str, base_uri: &str, reader: &R) -> Result<Vec<u8>> {
        if uri.starts_with("data:") {
            decode_data_uri(uri)
        } else {
            reader.read_bytes(&format!("{base_uri}{uri}")).await
        }
    }

    async fn load_buffers<R: AssetReader>(gltf: &gltf::Gltf, base_uri: &str, reader: &R) -> Result<Vec<Vec<u8>>> {
        let mut buffer_data = Vec::new();
        for buffer in gltf.buffers() {
            let mut data = match buffer.source() {
                gltf::buffer::Source::Bin => gltf
                    .blob
                    .clone()
                    .ok_or_else(|| PeopleError::GltfError("missing GLB binary chunk".to_string()))?,
                gltf::buffer::Source::Uri(uri) => Self::read_uri(uri, base_uri, reader).await?,
            };
            if data.len() < buffer.length() {
                return Err(PeopleError::GltfError(format!(
                    "buffer {} holds {} bytes, expected {}",
                    buffer.index(),
                    data.len(),
                    buffer.length()
                )));
            }
            // GLB chunks are padded to 4 bytes
            while data.len() % 4 != 0 {
                data.push(0);
            }
            buffer_data.push(data);
        }
        Ok(buffer_data)
    }

    /// Decodes every image used as a base color map.
    async fn load_images<R: AssetReader>(
        gltf: &gltf::Gltf,
        buffers: &[Vec<u8>],
        base_uri: &str,
        reader: &R,
    ) -> Result<FxHashMap<usize, Image>> {
        let used: HashSet<usize> = gltf
            .materials()
            .filter_map(|m| m.pbr_metallic_roughness().base_color_texture())
            .map(|info| info.texture().source().index())
            .collect();

        let mut images = FxHashMap::default();
        for image in gltf.images().filter(|img| used.contains(&img.index())) {
            let label = image
                .name()
                .map_or_else(|| format!("Image_{}", image.index()), str::to_string);

            let bytes = match image.source() {
                gltf::image::Source::Uri { uri, .. } => Self::read_uri(uri, base_uri, reader).await?,
                gltf::image::Source::View { view, .. } => {
                    let buffer = buffers.get(view.buffer().index()).ok_or_else(|| {
                        PeopleError::AssetIndexOutOfBounds {
                            context: "image buffer view".to_string(),
                            index: view.buffer().index(),
                        }
                    })?;
                    let start = view.offset();
                    let end = start + view.length();
                    buffer
                        .get(start..end)
                        .ok_or_else(|| PeopleError::GltfError(format!("image view out of range: {label}")))?
                        .to_vec()
                }
            };

            let decoded = tokio::task::spawn_blocking(move || Image::decode(&label, &bytes)).await??;
            images.insert(image.index(), decoded);
        }
        Ok(images)
    }

    fn load_materials(&mut self, gltf: &gltf::Gltf) {
        for material in gltf.materials() {
            let pbr = material.pbr_metallic_roughness();
            let [r, g, b, a] = pbr.base_color_factor();

            // glTF factors are already linear
            let mut mat = Material::standard(Color::new(r, g, b), pbr.roughness_factor(), pbr.metallic_factor());
            mat.opacity = a;
            if let Some(name) = material.name() {
                mat.name = Some(name.to_string());
            }

            if let Some(info) = pbr.base_color_texture() {
                if info.tex_coord() != 0 {
                    log::warn!("Base color texture uses TEXCOORD_{}, only TEXCOORD_0 is read", info.tex_coord());
                }
                mat.map = self.images.get(&info.texture().source().index()).cloned();
            }

            let alpha_mode = match material.alpha_mode() {
                gltf::material::AlphaMode::Opaque => AlphaMode::Opaque,
                gltf::material::AlphaMode::Mask => AlphaMode::Mask(material.alpha_cutoff().unwrap_or(0.5)),
                gltf::material::AlphaMode::Blend => AlphaMode::Blend,
            };

            mat.settings = MaterialSettings {
                alpha_mode,
                side: if material.double_sided() { Side::Double } else { Side::Front },
                depth_write: alpha_mode != AlphaMode::Blend,
            };

            self.materials.push(Arc::new(mat));
        }
    }

    fn get_default_material(&mut self) -> Arc<Material> {
        self.default_material
            .get_or_insert_with(|| Arc::new(Material::standard(Color::WHITE, 1.0, 1.0).with_name("default")))
            .clone()
    }

    fn build_prefab(&mut self, gltf: &gltf::Gltf) -> Result<Prefab> {
        let scene = gltf.default_scene().or_else(|| gltf.scenes().next());
        let mut prefab = Prefab::new(scene.as_ref().and_then(|s| s.name()).unwrap_or("Scene"));

        // Step 1: one prefab node per glTF node, same indices
        for node in gltf.nodes() {
            let mut pn = PrefabNode::new(&node_name(&node));
            let (t, r, s) = node.transform().decomposed();
            pn.transform.position = Vec3::from_array(t);
            pn.transform.rotation = Quat::from_array(r);
            pn.transform.scale = Vec3::from_array(s);
            pn.children_indices = node.children().map(|c| c.index()).collect();
            prefab.nodes.push(pn);
        }

        if let Some(scene) = scene {
            prefab.root_indices = scene.nodes().map(|n| n.index()).collect();
        }

        // Step 2: meshes; the first primitive stays on the node, the rest
        // hang off child nodes named `{node}_{primitive}`
        for node in gltf.nodes() {
            let Some(mesh) = node.mesh() else { continue };
            let skin_index = node.skin().map(|s| s.index());
            prefab.nodes[node.index()].skin_index = skin_index;

            let primitives: Vec<_> = mesh.primitives().collect();
            for (i, primitive) in primitives.iter().enumerate() {
                let Some(engine_mesh) = self.build_mesh(primitive)? else {
                    log::warn!("Skipping empty primitive {} of mesh '{}'", i, node_name(&node));
                    continue;
                };

                if prefab.nodes[node.index()].mesh.is_none() {
                    prefab.nodes[node.index()].mesh = Some(engine_mesh);
                } else {
                    let mut sub = PrefabNode::new(&format!("{}_{}", node_name(&node), i));
                    sub.mesh = Some(engine_mesh);
                    sub.skin_index = skin_index;
                    let sub_index = prefab.nodes.len();
                    prefab.nodes.push(sub);
                    prefab.nodes[node.index()].children_indices.push(sub_index);
                }
            }
        }

        prefab.skeletons = self.load_skins(gltf)?;
        prefab.animations = self.load_animations(gltf)?.into_iter().map(Arc::new).collect();

        Ok(prefab)
    }

    fn build_mesh(&mut self, primitive: &gltf::Primitive) -> Result<Option<Mesh>> {
        let Some(geometry) = self.load_primitive_geometry(primitive)? else {
            return Ok(None);
        };

        let material = match primitive.material().index() {
            Some(idx) => self
                .materials
                .get(idx)
                .cloned()
                .ok_or_else(|| PeopleError::AssetIndexOutOfBounds {
                    context: "material".to_string(),
                    index: idx,
                })?,
            None => self.get_default_material(),
        };

        Ok(Some(Mesh::new(Arc::new(geometry), material)))
    }

    fn load_primitive_geometry(&self, primitive: &gltf::Primitive) -> Result<Option<Geometry>> {
        let topology = match primitive.mode() {
            gltf::mesh::Mode::Triangles => Topology::TriangleList,
            gltf::mesh::Mode::Lines => Topology::LineList,
            other => {
                log::warn!("Unsupported primitive mode {other:?}");
                return Ok(None);
            }
        };

        let buffers = &self.buffers;
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .map(|iter| iter.collect())
            .unwrap_or_default();
        let vertex_count = positions.len();
        if vertex_count == 0 {
            return Ok(None);
        }

        let mut geometry = Geometry::new(positions);
        geometry.topology = topology;

        if let Some(iter) = reader.read_normals() {
            geometry.normals = iter.collect();
        }
        if let Some(iter) = reader.read_tex_coords(0) {
            geometry.uvs = iter.into_f32().collect();
        }
        if let Some(iter) = reader.read_joints(0) {
            geometry.joints = iter
                .into_u16()
                .map(|j| j.map(u32::from))
                .collect();
        }
        if let Some(iter) = reader.read_weights(0) {
            geometry.weights = iter.into_f32().collect();
        }
        if let Some(iter) = reader.read_indices() {
            geometry.indices = Some(iter.into_u32().collect());
        }

        if let Some(indices) = &geometry.indices
            && let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count)
        {
            return Err(PeopleError::GltfError(format!(
                "index {bad} out of range for {vertex_count} vertices"
            )));
        }

        if geometry.normals.len() != vertex_count {
            geometry.compute_vertex_normals();
        }

        Ok(Some(geometry))
    }

    fn load_skins(&self, gltf: &gltf::Gltf) -> Result<Vec<PrefabSkeleton>> {
        let buffers = &self.buffers;
        let mut skeletons = Vec::new();

        for skin in gltf.skins() {
            let name = skin.name().unwrap_or("Skeleton").to_string();
            let joints: Vec<_> = skin.joints().collect();

            let reader = skin.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
            let inverse_bind_matrices: Vec<Affine3A> = match reader.read_inverse_bind_matrices() {
                Some(iter) => iter
                    .map(|m| Affine3A::from_mat4(Mat4::from_cols_array_2d(&m)))
                    .collect(),
                None => vec![Affine3A::IDENTITY; joints.len()],
            };

            let joint_indices: HashSet<usize> = joints.iter().map(gltf::Node::index).collect();

            // Joints referenced as a child of another joint
            let child_joint_indices: HashSet<usize> = joints
                .iter()
                .flat_map(|n| n.children())
                .map(|c| c.index())
                .filter(|i| joint_indices.contains(i))
                .collect();

            let root_bone_index = 'block: {
                if let Some(skeleton_root) = skin.skeleton()
                    && let Some(index) = joints.iter().position(|n| n.index() == skeleton_root.index())
                {
                    break 'block index;
                }
                joints
                    .iter()
                    .position(|n| !child_joint_indices.contains(&n.index()))
                    .unwrap_or(0)
            };

            skeletons.push(PrefabSkeleton {
                name,
                root_bone_index,
                bone_indices: joints.iter().map(gltf::Node::index).collect(),
                inverse_bind_matrices,
            });
        }

        Ok(skeletons)
    }

    fn load_animations(&self, gltf: &gltf::Gltf) -> Result<Vec<AnimationClip>> {
        let buffers = &self.buffers;
        let mut animations = Vec::new();

        for anim in gltf.animations() {
            let mut tracks = Vec::new();

            for channel in anim.channels() {
                let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
                let target = channel.target();
                let node_name = node_name(&target.node());

                let Some(inputs) = reader.read_inputs() else {
                    log::warn!("Animation channel for '{node_name}' has no input times");
                    continue;
                };
                let times: Vec<f32> = inputs.collect();

                let interpolation = match channel.sampler().interpolation() {
                    gltf::animation::Interpolation::Linear => InterpolationMode::Linear,
                    gltf::animation::Interpolation::Step => InterpolationMode::Step,
                    gltf::animation::Interpolation::CubicSpline => InterpolationMode::CubicSpline,
                };

                let Some(outputs) = reader.read_outputs() else {
                    continue;
                };

                let (target_path, data) = match outputs {
                    ReadOutputs::Translations(iter) => (
                        TargetPath::Translation,
                        TrackData::Vector3(KeyframeTrack::new(
                            times,
                            iter.map(Vec3::from_array).collect(),
                            interpolation,
                        )),
                    ),
                    ReadOutputs::Rotations(iter) => (
                        TargetPath::Rotation,
                        TrackData::Quaternion(KeyframeTrack::new(
                            times,
                            iter.into_f32().map(Quat::from_array).collect(),
                            interpolation,
                        )),
                    ),
                    ReadOutputs::Scales(iter) => (
                        TargetPath::Scale,
                        TrackData::Vector3(KeyframeTrack::new(
                            times,
                            iter.map(Vec3::from_array).collect(),
                            interpolation,
                        )),
                    ),
                    ReadOutputs::MorphTargetWeights(_) => {
                        log::debug!("Morph weight track on '{node_name}' ignored");
                        continue;
                    }
                };

                tracks.push(Track {
                    meta: TrackMeta {
                        node_name,
                        target: target_path,
                    },
                    data,
                });
            }

            let name = anim
                .name()
                .map_or_else(|| format!("Animation_{}", anim.index()), str::to_string);
            animations.push(AnimationClip::new(name, tracks));
        }

        Ok(animations)
    }
}

/// Node name, or a stable placeholder for unnamed nodes.
fn node_name(node: &gltf::Node) -> String {
    node.name()
        .map_or_else(|| format!("Node_{}", node.index()), str::to_string)
}
