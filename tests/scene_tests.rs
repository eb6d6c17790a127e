//! Scene Integration Tests
//!
//! Tests for:
//! - Scene: create/remove nodes, attach/detach hierarchy
//! - Component management: mesh, camera, light
//! - Name queries
//! - World matrix propagation
//! - Skeleton pose and joint matrices

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::{Affine3A, Mat4, Quat, Vec3};

use people::resources::{Color, Geometry, Material, Mesh};
use people::scene::{Camera, Light, Node, Scene, Skeleton};

const EPSILON: f32 = 1e-4;

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    a.abs_diff_eq(b, EPSILON)
}

/// Same rotation, either quaternion sign.
fn quat_approx(a: Quat, b: Quat) -> bool {
    a.dot(b).abs() > 1.0 - 1e-5
}

fn dummy_mesh() -> Mesh {
    let geometry = Geometry::new(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
    Mesh::new(Arc::new(geometry), Arc::new(Material::phong(Color::WHITE, 30.0)))
}

// ============================================================================
// Node Creation & Removal
// ============================================================================

#[test]
fn scene_create_node_with_name() {
    let mut scene = Scene::new();
    let handle = scene.create_node_with_name("TestNode");
    assert_eq!(scene.get_name(handle), Some("TestNode"));
    assert!(!scene.root_nodes.contains(&handle));
}

#[test]
fn scene_set_name() {
    let mut scene = Scene::new();
    let handle = scene.create_node();
    scene.set_name(handle, "Renamed");
    assert_eq!(scene.get_name(handle), Some("Renamed"));
}

#[test]
fn scene_add_node_and_group_are_roots() {
    let mut scene = Scene::new();
    let node = scene.add_node(Node::new());
    let group = scene.add_group("hair");

    assert_eq!(scene.root_nodes, vec![node, group]);
    assert_eq!(scene.get_name(group), Some("hair"));
}

#[test]
fn scene_remove_node_removes_subtree_and_components() {
    let mut scene = Scene::new();
    let parent = scene.add_node(Node::new());
    let child = scene.create_node_with_name("child");
    let grandchild = scene.create_node();
    scene.attach(child, parent);
    scene.attach(grandchild, child);
    scene.set_mesh(grandchild, dummy_mesh());

    scene.remove_node(parent);

    assert!(!scene.root_nodes.contains(&parent));
    assert!(scene.get_node(parent).is_none());
    assert!(scene.get_node(child).is_none());
    assert!(scene.get_node(grandchild).is_none());
    assert!(scene.get_mesh(grandchild).is_none());
    assert!(scene.get_name(child).is_none());
}

#[test]
fn scene_remove_child_updates_parent() {
    let mut scene = Scene::new();
    let parent = scene.add_node(Node::new());
    let child = scene.create_node();
    scene.attach(child, parent);

    scene.remove_node(child);
    assert!(scene.get_node(parent).unwrap().children().is_empty());
}

// ============================================================================
// Hierarchy
// ============================================================================

#[test]
fn scene_attach_sets_parent_child() {
    let mut scene = Scene::new();
    let parent = scene.add_node(Node::new());
    let child = scene.add_node(Node::new());

    scene.attach(child, parent);

    assert_eq!(scene.get_node(child).unwrap().parent(), Some(parent));
    assert_eq!(scene.get_node(parent).unwrap().children(), &[child]);
    assert!(!scene.root_nodes.contains(&child), "attached node leaves the root list");
}

#[test]
fn scene_attach_moves_between_parents() {
    let mut scene = Scene::new();
    let a = scene.add_node(Node::new());
    let b = scene.add_node(Node::new());
    let child = scene.create_node();

    scene.attach(child, a);
    scene.attach(child, b);

    assert!(scene.get_node(a).unwrap().children().is_empty());
    assert_eq!(scene.get_node(b).unwrap().children(), &[child]);
    assert_eq!(scene.get_node(child).unwrap().parent(), Some(b));
}

#[test]
fn scene_attach_preserves_order() {
    let mut scene = Scene::new();
    let group = scene.add_group("character");
    let names = ["body", "hair", "eyes", "shoes"];
    let children: Vec<_> = names.iter().map(|n| scene.create_node_with_name(n)).collect();
    for &c in &children {
        scene.attach(c, group);
    }

    let order: Vec<_> = scene
        .get_node(group)
        .unwrap()
        .children()
        .iter()
        .map(|&h| scene.get_name(h).unwrap())
        .collect();
    assert_eq!(order, names);
}

#[test]
fn scene_attach_to_self_or_descendant_is_noop() {
    let mut scene = Scene::new();
    let parent = scene.add_node(Node::new());
    let child = scene.create_node();
    scene.attach(child, parent);

    scene.attach(parent, parent);
    scene.attach(parent, child);

    assert_eq!(scene.get_node(parent).unwrap().parent(), None);
    assert!(scene.root_nodes.contains(&parent));
    assert_eq!(scene.get_node(child).unwrap().parent(), Some(parent));
}

#[test]
fn scene_detach_returns_to_root() {
    let mut scene = Scene::new();
    let parent = scene.add_node(Node::new());
    let child = scene.create_node();
    scene.attach(child, parent);

    scene.detach(child);

    assert_eq!(scene.get_node(child).unwrap().parent(), None);
    assert!(scene.root_nodes.contains(&child));
    assert!(scene.get_node(parent).unwrap().children().is_empty());
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn find_node_by_name_searches_subtree_only() {
    let mut scene = Scene::new();
    let a = scene.add_group("a");
    let b = scene.add_group("b");
    let in_a = scene.create_node_with_name("target");
    let in_b = scene.create_node_with_name("target");
    scene.attach(in_a, a);
    scene.attach(in_b, b);

    assert_eq!(scene.find_node_by_name(b, "target"), Some(in_b));
    assert_eq!(scene.find_node_by_name(a, "a"), Some(a));
    assert_eq!(scene.find_node_by_name(a, "missing"), None);
    assert_eq!(scene.find_by_name("target"), Some(in_a), "first root tree wins");
}

#[test]
fn traverse_is_preorder() {
    let mut scene = Scene::new();
    let root = scene.add_group("root");
    let left = scene.create_node_with_name("left");
    let left_child = scene.create_node_with_name("left_child");
    let right = scene.create_node_with_name("right");
    scene.attach(left, root);
    scene.attach(left_child, left);
    scene.attach(right, root);

    let mut visited = Vec::new();
    scene.traverse(root, |h, _| visited.push(scene.get_name(h).unwrap().to_string()));
    assert_eq!(visited, ["root", "left", "left_child", "right"]);
}

#[test]
fn visible_meshes_skip_hidden_subtrees() {
    let mut scene = Scene::new();
    let shown = scene.add_node(Node::new());
    let hidden = scene.add_node(Node::new());
    let under_hidden = scene.create_node();
    scene.attach(under_hidden, hidden);

    scene.set_mesh(shown, dummy_mesh());
    scene.set_mesh(under_hidden, dummy_mesh());
    scene.get_node_mut(hidden).unwrap().visible = false;

    assert_eq!(scene.visible_meshes(), vec![shown]);
}

// ============================================================================
// Components
// ============================================================================

#[test]
fn first_camera_becomes_active() {
    let mut scene = Scene::new();
    let first = scene.add_camera(Camera::new_perspective(45.0, 1.0, 0.1, 100.0));
    let _second = scene.add_camera(Camera::new_perspective(60.0, 1.0, 0.1, 100.0));

    assert_eq!(scene.active_camera, Some(first));
    assert!((scene.main_camera().unwrap().fov - 45.0_f32.to_radians()).abs() < EPSILON);
}

#[test]
fn lights_are_named_roots() {
    let mut scene = Scene::new();
    let hemi = scene.add_light(Light::hemisphere(Color::WHITE, Color::BLACK, 1.0));
    let dir = scene.add_light(Light::directional(Color::WHITE, 1.0));

    assert_eq!(scene.get_name(hemi), Some("HemisphereLight"));
    assert_eq!(scene.get_name(dir), Some("DirectionalLight"));
    assert_eq!(scene.lights.len(), 2);
    assert!(matches!(scene.lights.get(dir), Some(Light::Directional(d)) if !d.cast_shadow));
}

#[test]
fn set_mesh_on_removed_node_is_ignored() {
    let mut scene = Scene::new();
    let node = scene.add_node(Node::new());
    scene.remove_node(node);
    scene.set_mesh(node, dummy_mesh());
    assert!(scene.meshes.is_empty());
}

// ============================================================================
// World Matrices
// ============================================================================

#[test]
fn world_matrix_composes_parent_chain() {
    let mut scene = Scene::new();
    let root = scene.add_node(Node::new());
    let child = scene.create_node();
    scene.attach(child, root);

    {
        let t = &mut scene.get_node_mut(root).unwrap().transform;
        t.position = Vec3::new(1.0, 0.0, 0.0);
        t.scale = Vec3::splat(2.0);
    }
    scene.get_node_mut(child).unwrap().transform.position = Vec3::new(0.0, 1.0, 0.0);

    scene.update_matrix_world();

    assert!(vec3_approx(scene.world_position(child).unwrap(), Vec3::new(1.0, 2.0, 0.0)));
}

#[test]
fn rotated_group_maps_z_up_to_y_up() {
    // The character group: rotate +90° about X then scale by 0.01
    let mut scene = Scene::new();
    let group = scene.add_group("character");
    let bone = scene.create_node();
    scene.attach(bone, group);

    {
        let t = &mut scene.get_node_mut(group).unwrap().transform;
        t.rotation = Quat::from_rotation_x(FRAC_PI_2);
        t.scale = Vec3::splat(0.01);
    }
    scene.get_node_mut(bone).unwrap().transform.position = Vec3::new(0.0, 100.0, 0.0);
    scene.update_matrix_world();

    assert!(vec3_approx(scene.world_position(bone).unwrap(), Vec3::new(0.0, 0.0, 1.0)));
}

#[test]
fn moving_parent_updates_unchanged_children() {
    let mut scene = Scene::new();
    let root = scene.add_node(Node::new());
    let child = scene.create_node();
    scene.attach(child, root);
    scene.update_matrix_world();

    scene.get_node_mut(root).unwrap().transform.position = Vec3::new(0.0, 0.0, 5.0);
    scene.update_matrix_world();

    assert!(vec3_approx(scene.world_position(child).unwrap(), Vec3::new(0.0, 0.0, 5.0)));
}

#[test]
fn update_subtree_uses_parent_world() {
    let mut scene = Scene::new();
    let root = scene.add_node(Node::new());
    let child = scene.create_node();
    scene.attach(child, root);
    scene.get_node_mut(root).unwrap().transform.position = Vec3::X;
    scene.update_matrix_world();

    scene.get_node_mut(child).unwrap().transform.position = Vec3::Y;
    scene.update_subtree(child);

    assert!(vec3_approx(scene.world_position(child).unwrap(), Vec3::new(1.0, 1.0, 0.0)));
}

#[test]
fn camera_view_follows_node() {
    let mut scene = Scene::new();
    let cam = scene.add_camera(Camera::new_perspective(45.0, 1.0, 0.1, 100.0));
    {
        let t = &mut scene.get_node_mut(cam).unwrap().transform;
        t.position = Vec3::new(0.0, 0.0, 10.0);
        t.look_at(Vec3::ZERO, Vec3::Y);
    }
    scene.update_matrix_world();

    let camera = scene.main_camera().unwrap();
    assert!(vec3_approx(camera.position(), Vec3::new(0.0, 0.0, 10.0)));

    // The origin lands in the centre of clip space
    let clip = camera.view_projection_matrix() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
    assert!((clip.x / clip.w).abs() < EPSILON);
    assert!((clip.y / clip.w).abs() < EPSILON);
}

#[test]
fn transform_apply_local_matrix_decomposes() {
    let mut node = Node::new();
    let mat = Affine3A::from_scale_rotation_translation(
        Vec3::new(2.0, 2.0, 2.0),
        Quat::from_rotation_y(0.5),
        Vec3::new(1.0, 2.0, 3.0),
    );
    node.transform.apply_local_matrix(mat);

    assert!(vec3_approx(node.transform.position, Vec3::new(1.0, 2.0, 3.0)));
    assert!(vec3_approx(node.transform.scale, Vec3::splat(2.0)));
    assert!(quat_approx(node.transform.rotation, Quat::from_rotation_y(0.5)));
}

#[test]
fn transform_look_at_faces_target() {
    let mut node = Node::new();
    node.transform.position = Vec3::new(5.0, 0.0, 0.0);
    node.transform.look_at(Vec3::ZERO, Vec3::Y);

    let forward = node.transform.rotation * Vec3::NEG_Z;
    assert!(vec3_approx(forward, Vec3::NEG_X));
}

// ============================================================================
// Skeleton
// ============================================================================

/// Two-bone chain: root at the origin, child one unit up.
fn two_bone_skeleton(scene: &mut Scene) -> (people::scene::SkeletonKey, [people::scene::NodeHandle; 2]) {
    let root = scene.add_node(Node::new());
    scene.set_name(root, "Hips");
    let child = scene.create_node_with_name("Spine");
    scene.attach(child, root);
    scene.get_node_mut(child).unwrap().transform.position = Vec3::Y;

    let inverse_binds = vec![
        Affine3A::IDENTITY,
        Affine3A::from_translation(Vec3::NEG_Y),
    ];
    let key = scene.add_skeleton(Skeleton::new("rig", vec![root, child], inverse_binds, 0));
    (key, [root, child])
}

#[test]
fn joint_matrices_are_identity_at_bind_pose() {
    let mut scene = Scene::new();
    let (key, _) = two_bone_skeleton(&mut scene);

    scene.update();

    let skeleton = scene.get_skeleton(key).unwrap();
    assert_eq!(skeleton.bone_count(), 2);
    for m in skeleton.joint_matrices() {
        assert!(m.abs_diff_eq(Mat4::IDENTITY, EPSILON), "got {m}");
    }
}

#[test]
fn pose_restores_bind_pose() {
    let mut scene = Scene::new();
    let (key, [root, child]) = two_bone_skeleton(&mut scene);

    {
        let t = &mut scene.get_node_mut(child).unwrap().transform;
        t.position = Vec3::new(3.0, 0.0, 0.0);
        t.rotation = Quat::from_rotation_z(1.0);
    }
    scene.get_node_mut(root).unwrap().transform.scale = Vec3::splat(4.0);

    scene.pose_skeleton(key);
    scene.update();

    let child_t = &scene.get_node(child).unwrap().transform;
    assert!(vec3_approx(child_t.position, Vec3::Y));
    assert!(quat_approx(child_t.rotation, Quat::IDENTITY));
    assert!(vec3_approx(scene.get_node(root).unwrap().transform.scale, Vec3::ONE));

    for m in scene.get_skeleton(key).unwrap().joint_matrices() {
        assert!(m.abs_diff_eq(Mat4::IDENTITY, EPSILON));
    }
}

#[test]
fn skeleton_root_bone_and_index() {
    let mut scene = Scene::new();
    let (key, [root, child]) = two_bone_skeleton(&mut scene);
    let skeleton = scene.get_skeleton(key).unwrap();

    assert_eq!(skeleton.root_bone(), Some(root));
    assert_eq!(skeleton.bone_index(child), Some(1));
    assert_eq!(skeleton.inverse_bind_matrices().len(), 2);
}

#[test]
fn missing_inverse_binds_default_to_identity() {
    let mut scene = Scene::new();
    let a = scene.add_node(Node::new());
    let b = scene.add_node(Node::new());
    let skeleton = Skeleton::new("partial", vec![a, b], vec![], 0);

    assert_eq!(skeleton.inverse_bind_matrices(), &[Affine3A::IDENTITY, Affine3A::IDENTITY]);
}
