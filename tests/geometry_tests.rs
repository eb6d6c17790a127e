//! Geometry and BoundingBox Tests
//!
//! Tests for:
//! - BoundingBox center, size, union, transform
//! - Vertex normal computation (area-weighted)
//! - Skinning attributes and joint remapping
//! - Primitive geometry creation (plane, grid)

use glam::{Affine3A, Quat, Vec3};

use people::resources::geometry::{BoundingBox, Geometry, Topology};
use people::resources::primitives::{PlaneOptions, create_grid, create_plane};
use people::resources::Color;

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx(a.x, b.x) && approx(a.y, b.y) && approx(a.z, b.z)
}

fn unit_box() -> BoundingBox {
    BoundingBox {
        min: Vec3::splat(-1.0),
        max: Vec3::splat(1.0),
    }
}

// ============================================================================
// BoundingBox Tests
// ============================================================================

#[test]
fn bbox_center_and_size() {
    let bb = BoundingBox {
        min: Vec3::new(0.0, 0.0, 0.0),
        max: Vec3::new(2.0, 4.0, 6.0),
    };
    assert!(vec3_approx(bb.center(), Vec3::new(1.0, 2.0, 3.0)));
    assert!(vec3_approx(bb.size(), Vec3::new(2.0, 4.0, 6.0)));
}

#[test]
fn bbox_union() {
    let b = BoundingBox {
        min: Vec3::new(0.0, 0.0, 0.0),
        max: Vec3::new(3.0, 3.0, 3.0),
    };
    let u = unit_box().union(&b);
    assert!(vec3_approx(u.min, Vec3::splat(-1.0)));
    assert!(vec3_approx(u.max, Vec3::splat(3.0)));
}

#[test]
fn bbox_transform_translation_and_scale() {
    let m = Affine3A::from_scale_rotation_translation(Vec3::splat(2.0), Quat::IDENTITY, Vec3::new(10.0, 0.0, 0.0));
    let t = unit_box().transform(&m);
    assert!(vec3_approx(t.min, Vec3::new(8.0, -2.0, -2.0)));
    assert!(vec3_approx(t.max, Vec3::new(12.0, 2.0, 2.0)));
}

#[test]
fn bbox_transform_rotation_grows_to_fit() {
    let m = Affine3A::from_rotation_y(std::f32::consts::FRAC_PI_4);
    let t = unit_box().transform(&m);
    let half_diagonal = 2.0_f32.sqrt();
    assert!(approx(t.max.x, half_diagonal));
    assert!(approx(t.max.y, 1.0));
}

#[test]
fn geometry_bounding_box_from_positions() {
    let mut geom = Geometry::new(vec![[-1.0, 0.0, 2.0], [3.0, -4.0, 0.0], [0.0, 5.0, 1.0]]);
    geom.compute_bounding_box();
    let bb = geom.bounding_box.unwrap();
    assert!(vec3_approx(bb.min, Vec3::new(-1.0, -4.0, 0.0)));
    assert!(vec3_approx(bb.max, Vec3::new(3.0, 5.0, 2.0)));

    let mut empty = Geometry::new(Vec::new());
    empty.compute_bounding_box();
    assert!(empty.bounding_box.is_none());
}

// ============================================================================
// Vertex Normal Computation Tests
// ============================================================================

#[test]
fn compute_normals_single_triangle_facing_z() {
    let mut geom = Geometry::new(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
    geom.compute_vertex_normals();

    assert_eq!(geom.normals.len(), 3);
    for n in &geom.normals {
        // CCW winding faces +Z
        assert!(vec3_approx(Vec3::from_array(*n), Vec3::Z), "got {n:?}");
    }
}

#[test]
fn compute_normals_indexed_geometry() {
    let mut geom = Geometry::new(vec![
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ]);
    geom.indices = Some(vec![0, 1, 2, 0, 2, 3]);
    geom.compute_vertex_normals();

    for n in &geom.normals {
        assert!(n[2] > 0.9, "Normal should point +Z, got {n:?}");
    }
}

#[test]
fn compute_normals_weights_by_area() {
    // Vertex 0 is shared by a large +Z face and a small +X face
    let mut geom = Geometry::new(vec![
        [0.0, 0.0, 0.0],
        [4.0, 0.0, 0.0],
        [0.0, 4.0, 0.0],
        [0.0, 0.0, -1.0],
        [0.0, 1.0, 0.0],
    ]);
    geom.indices = Some(vec![0, 1, 2, 0, 3, 4]);
    geom.compute_vertex_normals();

    let n = Vec3::from_array(geom.normals[0]);
    assert!(approx(n.length(), 1.0));
    assert!(n.z > n.x, "larger face dominates: {n:?}");
    assert!(n.x > 0.0);
}

#[test]
fn compute_normals_ignores_lines() {
    let mut geom = Geometry::new(vec![[0.0; 3], [1.0, 0.0, 0.0]]);
    geom.topology = Topology::LineList;
    geom.compute_vertex_normals();
    assert!(geom.normals.is_empty());
}

// ============================================================================
// Skinning Tests
// ============================================================================

fn skinned_triangle() -> Geometry {
    let mut geom = Geometry::new(vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
    geom.joints = vec![[0, 1, 0, 0], [1, 0, 0, 0], [2, 0, 0, 0]];
    geom.weights = vec![[0.5, 0.5, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0]];
    geom
}

#[test]
fn skinned_requires_joints_and_weights_per_vertex() {
    let mut geom = skinned_triangle();
    assert!(geom.is_skinned());

    geom.weights.pop();
    assert!(!geom.is_skinned());

    assert!(!Geometry::new(vec![[0.0; 3]]).is_skinned());
}

#[test]
fn max_joint_index_skips_zero_weights() {
    let mut geom = skinned_triangle();
    assert_eq!(geom.max_joint_index(), Some(2));

    geom.joints[2] = [0, 7, 0, 0];
    assert_eq!(geom.max_joint_index(), Some(1));
}

#[test]
fn remap_rewrites_joints_and_keeps_vertices() {
    let geom = skinned_triangle();
    let remapped = geom.with_remapped_joints(&[Some(5), Some(3), Some(9)]);

    assert_ne!(remapped.id(), geom.id());
    assert_eq!(remapped.positions, geom.positions);
    assert_eq!(remapped.weights, geom.weights);
    let primary: Vec<u32> = remapped.joints.iter().map(|j| j[0]).collect();
    assert_eq!(primary, vec![5, 3, 9]);
    assert_eq!(remapped.joints[0][1], 3);
}

#[test]
fn remap_out_of_range_drops_influence() {
    let geom = skinned_triangle();
    let remapped = geom.with_remapped_joints(&[Some(4), Some(6)]);

    // Joint 2 has no mapping
    assert_eq!(remapped.joints[2][0], 0);
    assert_eq!(remapped.weights[2][0], 0.0);
    assert_eq!(remapped.joints[1][0], 6);
}

#[test]
fn remap_to_none_drops_influence() {
    let geom = skinned_triangle();
    let remapped = geom.with_remapped_joints(&[Some(1), None, Some(0)]);

    // Vertex 0 loses its joint-1 half, vertex 1 loses everything
    assert_eq!(remapped.weights[0], [0.5, 0.0, 0.0, 0.0]);
    assert_eq!(remapped.weights[1][0], 0.0);
    assert_eq!(remapped.joints[2][0], 0);
    assert_eq!(remapped.weights[2][0], 1.0);
}

// ============================================================================
// Primitive Tests
// ============================================================================

#[test]
fn plane_is_centered_and_faces_z() {
    let plane = create_plane(&PlaneOptions {
        width: 100.0,
        height: 100.0,
        ..Default::default()
    });

    assert_eq!(plane.vertex_count(), 4);
    assert_eq!(plane.indices.as_ref().map(Vec::len), Some(6));
    assert!(plane.normals.iter().all(|n| *n == [0.0, 0.0, 1.0]));

    let mut plane = plane;
    plane.compute_bounding_box();
    let bb = plane.bounding_box.unwrap();
    assert!(vec3_approx(bb.min, Vec3::new(-50.0, -50.0, 0.0)));
    assert!(vec3_approx(bb.max, Vec3::new(50.0, 50.0, 0.0)));
}

#[test]
fn plane_segments() {
    let plane = create_plane(&PlaneOptions {
        width: 2.0,
        height: 2.0,
        width_segments: 2,
        height_segments: 3,
    });
    assert_eq!(plane.vertex_count(), 3 * 4);
    assert_eq!(plane.indices.as_ref().map(Vec::len), Some(2 * 3 * 6));
}

#[test]
fn grid_lies_on_xz_with_colored_center_lines() {
    let center = Color::from_hex(0xff_0000);
    let line = Color::from_hex(0x88_8888);
    let grid = create_grid(100.0, 100, center, line);

    assert_eq!(grid.topology, Topology::LineList);
    assert!(grid.positions.iter().all(|p| p[1] == 0.0));
    assert_eq!(grid.colors.len(), grid.positions.len());

    let center_rgb = [center.r, center.g, center.b];
    let center_vertices = grid.colors.iter().filter(|c| **c == center_rgb).count();
    // One line along X and one along Z through the origin
    assert_eq!(center_vertices, 4);
}
