//! WGSL sources.
//!
//! Mesh and shadow shaders are generated per skinning variant by prepending
//! a `SKINNED` constant; the rest of the source is shared.

const FRAME_WGSL: &str = r#"
struct Frame {
    view_projection: mat4x4<f32>,
    light_view_projection: mat4x4<f32>,
    camera_position: vec4<f32>,
    hemisphere_sky: vec4<f32>,
    hemisphere_ground: vec4<f32>,
    light_direction: vec4<f32>,
    light_color: vec4<f32>,
    fog_color: vec4<f32>,
    params: vec4<f32>,
};

fn apply_fog(color: vec3<f32>, world_position: vec3<f32>) -> vec3<f32> {
    if frame.fog_color.w < 0.5 || frame.params.y <= frame.params.x {
        return color;
    }
    let distance = length(frame.camera_position.xyz - world_position);
    let factor = clamp((distance - frame.params.x) / (frame.params.y - frame.params.x), 0.0, 1.0);
    return mix(color, frame.fog_color.rgb, factor);
}
"#;

const OBJECT_WGSL: &str = r#"
struct Object {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    flags: vec4<f32>,
};
"#;

const MATERIAL_WGSL: &str = r#"
struct Material {
    color: vec4<f32>,
    specular: vec4<f32>,
    params: vec4<f32>,
};
"#;

const SKINNING_WGSL: &str = r#"
// Joint matrices are in world space; a fully weighted vertex ignores the model matrix
fn world_matrix(indices: vec4<u32>, weights: vec4<f32>) -> mat4x4<f32> {
    if !SKINNED || object.flags.x < 0.5 {
        return object.model;
    }
    let total = weights.x + weights.y + weights.z + weights.w;
    if total < 1e-4 {
        return object.model;
    }
    return (joints[indices.x] * weights.x
        + joints[indices.y] * weights.y
        + joints[indices.z] * weights.z
        + joints[indices.w] * weights.w) * (1.0 / total);
}
"#;

const MESH_WGSL: &str = r#"
@group(0) @binding(0) var<uniform> frame: Frame;
@group(0) @binding(1) var shadow_map: texture_depth_2d;
@group(0) @binding(2) var shadow_sampler: sampler_comparison;

@group(1) @binding(0) var<uniform> material: Material;
@group(1) @binding(1) var color_map: texture_2d<f32>;
@group(1) @binding(2) var color_sampler: sampler;

@group(2) @binding(0) var<uniform> object: Object;
@group(2) @binding(1) var<storage, read> joints: array<mat4x4<f32>>;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) joint_indices: vec4<u32>,
    @location(4) joint_weights: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) shadow_position: vec4<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let world = world_matrix(in.joint_indices, in.joint_weights);
    var normal_matrix = object.normal_matrix;
    if SKINNED && object.flags.x > 0.5 {
        normal_matrix = world;
    }

    let world_position = world * vec4<f32>(in.position, 1.0);

    var out: VertexOutput;
    out.clip_position = frame.view_projection * world_position;
    out.world_position = world_position.xyz;
    out.world_normal = (normal_matrix * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;
    out.shadow_position = frame.light_view_projection * world_position;
    return out;
}

fn shadow_factor(shadow_position: vec4<f32>) -> f32 {
    if frame.light_color.w < 0.5 || object.flags.y < 0.5 {
        return 1.0;
    }
    let ndc = shadow_position.xyz / shadow_position.w;
    let uv = vec2<f32>(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5);
    if any(uv < vec2<f32>(0.0)) || any(uv > vec2<f32>(1.0)) || ndc.z > 1.0 {
        return 1.0;
    }

    let depth = ndc.z - frame.params.z;
    let texel = frame.params.w;
    var lit = 0.0;
    for (var x = -1; x <= 1; x++) {
        for (var y = -1; y <= 1; y++) {
            let offset = vec2<f32>(f32(x), f32(y)) * texel;
            lit += textureSampleCompareLevel(shadow_map, shadow_sampler, uv + offset, depth);
        }
    }
    return lit / 9.0;
}

@fragment
fn fs_main(in: VertexOutput, @builtin(front_facing) front_facing: bool) -> @location(0) vec4<f32> {
    let texel = textureSample(color_map, color_sampler, in.uv);
    var base = material.color;
    if material.params.y > 0.5 {
        base *= texel;
    }
    if base.a < material.params.x {
        discard;
    }

    var n = normalize(in.world_normal);
    if !front_facing {
        n = -n;
    }
    let v = normalize(frame.camera_position.xyz - in.world_position);
    let l = frame.light_direction.xyz;

    let up = dot(n, vec3<f32>(0.0, 1.0, 0.0)) * 0.5 + 0.5;
    let ambient = mix(frame.hemisphere_ground.rgb, frame.hemisphere_sky.rgb, up) * frame.hemisphere_sky.w;

    let n_dot_l = max(dot(n, l), 0.0);
    let radiance = frame.light_color.rgb * frame.light_direction.w * n_dot_l * shadow_factor(in.shadow_position);

    let h = normalize(l + v);
    let highlight = pow(max(dot(n, h), 0.0), material.specular.w);

    var color = base.rgb * (ambient + radiance) + material.specular.rgb * highlight * radiance;
    color = apply_fog(color, in.world_position);
    return vec4<f32>(color, base.a);
}
"#;

const SHADOW_WGSL: &str = r#"
struct Shadow {
    light_view_projection: mat4x4<f32>,
};

@group(0) @binding(0) var<uniform> shadow: Shadow;

@group(1) @binding(0) var<uniform> object: Object;
@group(1) @binding(1) var<storage, read> joints: array<mat4x4<f32>>;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(3) joint_indices: vec4<u32>,
    @location(4) joint_weights: vec4<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> @builtin(position) vec4<f32> {
    let world = world_matrix(in.joint_indices, in.joint_weights);
    return shadow.light_view_projection * world * vec4<f32>(in.position, 1.0);
}
"#;

const LINE_WGSL: &str = r#"
@group(0) @binding(0) var<uniform> frame: Frame;
@group(1) @binding(0) var<uniform> material: Material;
@group(2) @binding(0) var<uniform> object: Object;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) color: vec3<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let world_position = object.model * vec4<f32>(in.position, 1.0);
    var out: VertexOutput;
    out.clip_position = frame.view_projection * world_position;
    out.world_position = world_position.xyz;
    out.color = in.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = apply_fog(in.color * material.color.rgb, in.world_position);
    return vec4<f32>(color, material.color.a);
}
"#;

/// Lit mesh shader for one skinning variant.
#[must_use]
pub fn mesh_source(skinned: bool) -> String {
    format!("const SKINNED: bool = {skinned};\n{MESH_WGSL}\n{FRAME_WGSL}\n{MATERIAL_WGSL}\n{OBJECT_WGSL}\n{SKINNING_WGSL}")
}

/// Unlit, vertex-colored lines.
#[must_use]
pub fn line_source() -> String {
    format!("{LINE_WGSL}\n{FRAME_WGSL}\n{MATERIAL_WGSL}\n{OBJECT_WGSL}")
}

/// Depth-only shadow shader for one skinning variant.
#[must_use]
pub fn shadow_source(skinned: bool) -> String {
    format!("const SKINNED: bool = {skinned};\n{SHADOW_WGSL}\n{OBJECT_WGSL}\n{SKINNING_WGSL}")
}
