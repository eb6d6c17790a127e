//! Shared fixtures: small glTF documents built in memory.
//!
//! Buffers are embedded as base64 data URIs, so one JSON file is a complete
//! model. The loader detects JSON by content, which lets the fixtures use the
//! `.glb` paths the default config expects.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};

const FLOAT: u32 = 5126;
const UNSIGNED_SHORT: u32 = 5123;
const UNSIGNED_INT: u32 = 5125;

#[derive(Default)]
pub struct GltfBuilder {
    buffer: Vec<u8>,
    buffer_views: Vec<Value>,
    accessors: Vec<Value>,
    pub nodes: Vec<Value>,
    pub meshes: Vec<Value>,
    pub materials: Vec<Value>,
    pub skins: Vec<Value>,
    pub animations: Vec<Value>,
    pub scene_roots: Vec<usize>,
}

impl GltfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_view(&mut self, bytes: &[u8]) -> usize {
        while self.buffer.len() % 4 != 0 {
            self.buffer.push(0);
        }
        let offset = self.buffer.len();
        self.buffer.extend_from_slice(bytes);
        self.buffer_views.push(json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": bytes.len(),
        }));
        self.buffer_views.len() - 1
    }

    fn float_accessor(&mut self, data: &[f32], components: usize, ty: &str) -> usize {
        let count = data.len() / components;
        let mut min = vec![f32::INFINITY; components];
        let mut max = vec![f32::NEG_INFINITY; components];
        for chunk in data.chunks_exact(components) {
            for (i, &v) in chunk.iter().enumerate() {
                min[i] = min[i].min(v);
                max[i] = max[i].max(v);
            }
        }

        let view = self.push_view(bytemuck::cast_slice(data));
        self.accessors.push(json!({
            "bufferView": view,
            "componentType": FLOAT,
            "count": count,
            "type": ty,
            "min": min,
            "max": max,
        }));
        self.accessors.len() - 1
    }

    pub fn scalars(&mut self, data: &[f32]) -> usize {
        self.float_accessor(data, 1, "SCALAR")
    }

    pub fn vec3s(&mut self, data: &[[f32; 3]]) -> usize {
        self.float_accessor(data.as_flattened(), 3, "VEC3")
    }

    pub fn vec4s(&mut self, data: &[[f32; 4]]) -> usize {
        self.float_accessor(data.as_flattened(), 4, "VEC4")
    }

    pub fn mat4s(&mut self, data: &[[f32; 16]]) -> usize {
        self.float_accessor(data.as_flattened(), 16, "MAT4")
    }

    pub fn joints(&mut self, data: &[[u16; 4]]) -> usize {
        let view = self.push_view(bytemuck::cast_slice(data.as_flattened()));
        self.accessors.push(json!({
            "bufferView": view,
            "componentType": UNSIGNED_SHORT,
            "count": data.len(),
            "type": "VEC4",
        }));
        self.accessors.len() - 1
    }

    pub fn indices(&mut self, data: &[u32]) -> usize {
        let view = self.push_view(bytemuck::cast_slice(data));
        self.accessors.push(json!({
            "bufferView": view,
            "componentType": UNSIGNED_INT,
            "count": data.len(),
            "type": "SCALAR",
        }));
        self.accessors.len() - 1
    }

    pub fn node(&mut self, node: Value) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// A single triangle whose vertices are weighted to `joints[i]`.
    pub fn skinned_triangle(&mut self, joints: [u16; 3], material: Option<usize>) -> usize {
        let primitive = self.skinned_primitive(joints, material);
        self.meshes.push(json!({ "primitives": [primitive] }));
        self.meshes.len() - 1
    }

    /// One mesh with a skinned triangle primitive per entry of `parts`.
    pub fn skinned_parts(&mut self, parts: &[([u16; 3], Option<usize>)]) -> usize {
        let primitives: Vec<Value> = parts
            .iter()
            .map(|&(joints, material)| self.skinned_primitive(joints, material))
            .collect();
        self.meshes.push(json!({ "primitives": primitives }));
        self.meshes.len() - 1
    }

    fn skinned_primitive(&mut self, joints: [u16; 3], material: Option<usize>) -> Value {
        let positions = self.vec3s(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let joints = self.joints(&[
            [joints[0], 0, 0, 0],
            [joints[1], 0, 0, 0],
            [joints[2], 0, 0, 0],
        ]);
        let weights = self.vec4s(&[[1.0, 0.0, 0.0, 0.0]; 3]);
        let indices = self.indices(&[0, 1, 2]);

        let mut primitive = json!({
            "attributes": { "POSITION": positions, "JOINTS_0": joints, "WEIGHTS_0": weights },
            "indices": indices,
        });
        if let Some(m) = material {
            primitive["material"] = json!(m);
        }
        primitive
    }

    /// A triangle with no skinning attributes.
    pub fn static_triangle(&mut self) -> usize {
        let positions = self.vec3s(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        self.meshes.push(json!({ "primitives": [{ "attributes": { "POSITION": positions } }] }));
        self.meshes.len() - 1
    }

    pub fn skin(&mut self, name: &str, joints: &[usize], inverse_binds: &[[f32; 16]]) -> usize {
        let ibm = self.mat4s(inverse_binds);
        self.skins.push(json!({ "name": name, "joints": joints, "inverseBindMatrices": ibm }));
        self.skins.len() - 1
    }

    /// One-channel linear translation clip.
    pub fn translation_clip(&mut self, name: &str, node: usize, times: &[f32], values: &[[f32; 3]]) {
        let input = self.scalars(times);
        let output = self.vec3s(values);
        self.animations.push(json!({
            "name": name,
            "channels": [{ "sampler": 0, "target": { "node": node, "path": "translation" } }],
            "samplers": [{ "input": input, "output": output, "interpolation": "LINEAR" }],
        }));
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let uri = format!("data:application/octet-stream;base64,{}", STANDARD.encode(&self.buffer));
        let mut doc = json!({
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [{ "name": "Scene", "nodes": self.scene_roots }],
            "nodes": self.nodes,
            "buffers": [{ "byteLength": self.buffer.len(), "uri": uri }],
            "bufferViews": self.buffer_views,
            "accessors": self.accessors,
        });
        for (key, list) in [
            ("meshes", &self.meshes),
            ("materials", &self.materials),
            ("skins", &self.skins),
            ("animations", &self.animations),
        ] {
            if !list.is_empty() {
                doc[key] = json!(list);
            }
        }
        serde_json::to_vec(&doc).expect("fixture serializes")
    }
}

pub fn translation(x: f32, y: f32, z: f32) -> [f32; 16] {
    glam::Mat4::from_translation(glam::Vec3::new(x, y, z)).to_cols_array()
}

/// Bone chain shared by the fixtures: Hips at the origin, Spine one unit
/// up, Head one more.
pub const BONES: [&str; 3] = ["Hips", "Spine", "Head"];

/// Adds the bone chain, returns the node indices in `BONES` order.
pub fn add_bones(b: &mut GltfBuilder) -> [usize; 3] {
    let head = b.node(json!({ "name": "Head", "translation": [0.0, 1.0, 0.0] }));
    let spine = b.node(json!({ "name": "Spine", "translation": [0.0, 1.0, 0.0], "children": [head] }));
    let hips = b.node(json!({ "name": "Hips", "children": [spine] }));
    [hips, spine, head]
}

fn bind_matrices() -> [[f32; 16]; 3] {
    [
        translation(0.0, 0.0, 0.0),
        translation(0.0, -1.0, 0.0),
        translation(0.0, -2.0, 0.0),
    ]
}

/// Body file: `Armature` holding the bones and the `body_fixed` mesh, with
/// two clips, `Idle` and `Walk`.
pub fn body_gltf() -> Vec<u8> {
    let mut b = GltfBuilder::new();
    let [hips, spine, head] = add_bones(&mut b);

    let mesh = b.skinned_triangle([0, 1, 2], None);
    let body = b.node(json!({ "name": "body_fixed", "mesh": mesh, "skin": 0 }));
    let armature = b.node(json!({ "name": "Armature", "children": [hips, body] }));
    b.scene_roots = vec![armature];

    b.skin("body_rig", &[hips, spine, head], &bind_matrices());

    b.translation_clip("Idle", spine, &[0.0, 1.0], &[[0.0, 1.0, 0.0], [0.0, 1.0, 0.0]]);
    b.translation_clip("Walk", hips, &[0.0, 2.0], &[[0.0, 0.0, 0.0], [0.0, 0.0, 2.0]]);
    b.to_bytes()
}

/// Body whose skin has a second top-level joint: `Prop`, a sibling of
/// `Hips` two units along +X, listed last in the skin.
pub fn body_with_prop_gltf() -> Vec<u8> {
    let mut b = GltfBuilder::new();
    let [hips, spine, head] = add_bones(&mut b);
    let prop = b.node(json!({ "name": "Prop", "translation": [2.0, 0.0, 0.0] }));

    let mesh = b.skinned_triangle([0, 1, 3], None);
    let body = b.node(json!({ "name": "body_fixed", "mesh": mesh, "skin": 0 }));
    let armature = b.node(json!({ "name": "Armature", "children": [hips, prop, body] }));
    b.scene_roots = vec![armature];

    let [ibm_hips, ibm_spine, ibm_head] = bind_matrices();
    b.skin(
        "body_rig",
        &[hips, spine, head, prop],
        &[ibm_hips, ibm_spine, ibm_head, translation(-2.0, 0.0, 0.0)],
    );
    b.to_bytes()
}

/// Clothing file whose skin lists `bones` (by name) in its own order. The
/// mesh weights each vertex to local joints 0, 1 and 2 (clamped to the
/// joint count).
pub fn slot_gltf(mesh_name: &str, bones: &[&str], material_name: &str) -> Vec<u8> {
    let last = (bones.len().max(1) - 1) as u16;
    slot_gltf_with_parts(mesh_name, bones, material_name, &[[0, 1.min(last), 2.min(last)]])
}

/// Clothing file with one primitive per entry of `parts`, each vertex
/// weighted fully to the given local joint.
pub fn slot_gltf_with_parts(mesh_name: &str, bones: &[&str], material_name: &str, parts: &[[u16; 3]]) -> Vec<u8> {
    let mut b = GltfBuilder::new();

    let bone_nodes: Vec<usize> = bones
        .iter()
        .map(|name| b.node(json!({ "name": name })))
        .collect();

    b.materials.push(json!({
        "name": material_name,
        "pbrMetallicRoughness": { "baseColorFactor": [0.2, 0.3, 0.4, 1.0] },
    }));

    let parts: Vec<([u16; 3], Option<usize>)> = parts.iter().map(|&joints| (joints, Some(0))).collect();
    let mesh = b.skinned_parts(&parts);
    let mesh_node = b.node(json!({ "name": mesh_name, "mesh": mesh, "skin": 0 }));

    let mut root_children = bone_nodes.clone();
    root_children.push(mesh_node);
    let root = b.node(json!({ "name": "Root", "children": root_children }));
    b.scene_roots = vec![root];

    let ibms: Vec<[f32; 16]> = bones.iter().map(|_| translation(0.0, 0.0, 0.0)).collect();
    b.skin("slot_rig", &bone_nodes, &ibms);
    b.to_bytes()
}

/// Static, unskinned model (the room).
pub fn static_gltf(name: &str) -> Vec<u8> {
    let mut b = GltfBuilder::new();
    let mesh = b.static_triangle();
    let node = b.node(json!({ "name": name, "mesh": mesh }));
    b.scene_roots = vec![node];
    b.to_bytes()
}

/// Scratch asset directory, removed on drop.
pub struct TempAssets {
    pub root: PathBuf,
}

impl TempAssets {
    pub fn new() -> Self {
        let root = std::env::temp_dir().join(format!("people-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&root).expect("create temp dir");
        Self { root }
    }

    pub fn write(&self, relative: &str, bytes: &[u8]) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).expect("create asset dir");
        }
        std::fs::write(&path, bytes).expect("write asset");
        path
    }

    pub fn path(&self) -> &Path {
        &self.root
    }
}

impl Drop for TempAssets {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

/// Writes the body and every stock slot at the default config paths.
///
/// Each slot lists the bones in a different order than the body does.
pub fn write_stock_character(assets: &TempAssets) {
    assets.write("models/gltf/body.glb", &body_gltf());
    for slot in people::config::default_slots() {
        let mesh_name = format!("{}_mesh", slot.name);
        let bytes = slot_gltf(&mesh_name, &["Head", "Spine", "Hips"], &format!("{}_mat", slot.name));
        assets.write(&slot.path, &bytes);
    }
}
