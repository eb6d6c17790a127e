use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::assets::{AssetServer, Prefab};
use crate::character::body::BodyRig;
use crate::config::SlotConfig;
use crate::errors::{PeopleError, Result};
use crate::resources::{Geometry, Mesh};
use crate::scene::{Node, NodeHandle, Scene, SkinBinding};

/// Loads one slot file and binds its skinned meshes to the body skeleton.
///
/// Returns a new root group named after the slot. A file without skinned
/// meshes yields an empty group.
pub async fn load_slot(server: &AssetServer, scene: &mut Scene, rig: &BodyRig, config: &SlotConfig) -> Result<NodeHandle> {
    let prefab = server.load_model(&config.path).await?;
    let joints = rig.joints_by_name(scene);

    let meshes = rebind_meshes(&prefab, &joints, rig, config)?;
    if meshes.is_empty() {
        log::warn!("Slot '{}' ({}) contains no skinned meshes", config.name, config.path);
    }

    let group = scene.add_group(&config.name);
    for (name, mesh) in meshes {
        let node = scene.add_node(Node::new());
        scene.set_name(node, &name);
        scene.set_mesh(node, mesh);
        scene.attach(node, group);
    }

    log::debug!(
        "Slot '{}' bound: {} meshes",
        config.name,
        scene.get_node(group).map_or(0, |g| g.children().len())
    );
    Ok(group)
}

/// Builds one mesh per skinned prefab node, in traversal order, with joint
/// indices rewritten into the shared skeleton's order.
///
/// Only joints that carry vertex weight must exist in the shared skeleton.
/// Unweighted helper bones are dropped from the mapping.
pub(crate) fn rebind_meshes(
    prefab: &Prefab,
    joints: &FxHashMap<String, u32>,
    rig: &BodyRig,
    config: &SlotConfig,
) -> Result<Vec<(String, Mesh)>> {
    prefab
        .skinned_meshes()
        .into_iter()
        .filter_map(|index| {
            let node = &prefab.nodes[index];
            let source = node.mesh.as_ref()?;
            let skin_index = node.skin_index?;
            Some((node, source, skin_index))
        })
        .map(|(node, source, skin_index)| {
            let bones = prefab.bone_names(skin_index);
            let map = joint_map(&node.name, &bones, &source.geometry, joints)?;

            let geometry = if is_identity(&map, &source.geometry) {
                source.geometry.clone()
            } else {
                Arc::new(source.geometry.with_remapped_joints(&map))
            };

            let mut mesh = Mesh::new(geometry, source.material.clone());
            mesh.cast_shadow = config.cast_shadow;
            mesh.receive_shadow = source.receive_shadow;
            mesh.bind(SkinBinding { skeleton: rig.skeleton });

            Ok((node.name.clone(), mesh))
        })
        .collect()
}

/// Shared-skeleton joint for every joint of the slot's own skin.
fn joint_map(
    mesh_name: &str,
    bones: &[&str],
    geometry: &Geometry,
    joints: &FxHashMap<String, u32>,
) -> Result<Vec<Option<u32>>> {
    let weighted = geometry.weighted_joints();

    if let Some(max) = geometry.max_joint_index()
        && max as usize >= bones.len()
    {
        log::warn!(
            "Mesh '{mesh_name}' weights joint {max} but its skin has {} joints; those influences are dropped",
            bones.len()
        );
    }

    bones
        .iter()
        .enumerate()
        .map(|(i, &bone)| match joints.get(bone) {
            Some(&joint) => Ok(Some(joint)),
            None if weighted.contains(&(i as u32)) => Err(PeopleError::MissingBone {
                mesh: mesh_name.to_string(),
                bone: bone.to_string(),
            }),
            None => {
                log::debug!("Mesh '{mesh_name}': unweighted bone '{bone}' not in shared skeleton, skipped");
                Ok(None)
            }
        })
        .collect()
}

/// True when the geometry can be shared as-is: the skin lines up with the
/// shared skeleton and no vertex points past the end of it.
fn is_identity(map: &[Option<u32>], geometry: &Geometry) -> bool {
    map.iter().enumerate().all(|(i, &j)| j == Some(i as u32))
        && geometry.joints.iter().flatten().all(|&j| (j as usize) < map.len())
}
