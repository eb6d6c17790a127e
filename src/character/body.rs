use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::animation::AnimationClip;
use crate::assets::AssetServer;
use crate::config::BodyConfig;
use crate::errors::{PeopleError, Result};
use crate::resources::{Material, Mesh};
use crate::scene::{Node, NodeHandle, Scene, Skeleton, SkeletonKey, SkinBinding};

/// The body mesh together with the skeleton every slot binds to.
#[derive(Debug, Clone)]
pub struct BodyRig {
    /// Shared skeleton, posed at bind time
    pub skeleton: SkeletonKey,
    /// Body mesh node; the top-level bones hang below it
    pub body_mesh: NodeHandle,
    /// Clips from the body file, in file order
    pub animations: Vec<Arc<AnimationClip>>,
}

impl BodyRig {
    /// Joint index of every bone of the shared skeleton, keyed by bone name.
    ///
    /// Unnamed bones are left out. Duplicate names keep the first joint.
    #[must_use]
    pub fn joints_by_name(&self, scene: &Scene) -> FxHashMap<String, u32> {
        let mut map = FxHashMap::default();
        let Some(skeleton) = scene.get_skeleton(self.skeleton) else {
            return map;
        };
        for (joint, &bone) in skeleton.bones.iter().enumerate() {
            if let Some(name) = scene.get_name(bone) {
                map.entry(name.to_string()).or_insert(joint as u32);
            }
        }
        map
    }
}

/// Loads the body file and extracts its skinned mesh as a fresh scene root.
///
/// The mesh named `config.mesh_name` keeps its geometry but gets a new
/// standard material. Its skeleton is posed, every top-level bone is moved
/// under the new mesh node, and the rest of the loaded hierarchy is dropped.
pub async fn load_body(server: &AssetServer, scene: &mut Scene, config: &BodyConfig) -> Result<BodyRig> {
    let prefab = server.load_model(&config.path).await?;
    let instance = prefab.instantiate(scene, None);

    let result = extract_body(scene, config, instance.root);

    // Other skins in the file point at nodes that are about to go
    let keep = result.as_ref().ok().map(|rig| rig.skeleton);
    for &key in &instance.skeletons {
        if Some(key) != keep {
            scene.skeletons.remove(key);
        }
    }
    scene.remove_node(instance.root);

    let mut rig = result?;
    rig.animations.clone_from(&prefab.animations);

    log::info!(
        "Body '{}' ready: {} bones, {} clips",
        config.mesh_name,
        scene.get_skeleton(rig.skeleton).map_or(0, |s| s.bone_count()),
        rig.animations.len()
    );
    Ok(rig)
}

fn extract_body(scene: &mut Scene, config: &BodyConfig, clone_root: NodeHandle) -> Result<BodyRig> {
    let source = scene
        .find_node_by_name(clone_root, &config.mesh_name)
        .ok_or_else(|| PeopleError::NodeNotFound {
            name: config.mesh_name.clone(),
            asset: config.path.clone(),
        })?;

    let (geometry, skin) = match scene.get_mesh(source) {
        Some(mesh) if mesh.geometry.is_skinned() => match mesh.skin {
            Some(skin) => (mesh.geometry.clone(), skin),
            None => return Err(PeopleError::NotSkinned(config.mesh_name.clone())),
        },
        _ => return Err(PeopleError::NotSkinned(config.mesh_name.clone())),
    };

    let top_bones = scene
        .get_skeleton(skin.skeleton)
        .map(|s| top_level_bones(scene, s))
        .unwrap_or_default();
    if top_bones.is_empty() {
        return Err(PeopleError::NotSkinned(config.mesh_name.clone()));
    }

    scene.pose_skeleton(skin.skeleton);

    let material = Material::standard(config.color, config.roughness, config.metalness).with_name(&config.mesh_name);
    let mut mesh = Mesh::new(geometry, Arc::new(material));
    mesh.cast_shadow = config.cast_shadow;
    mesh.bind(SkinBinding { skeleton: skin.skeleton });

    let body_mesh = scene.add_node(Node::new());
    scene.set_name(body_mesh, &config.mesh_name);
    scene.set_mesh(body_mesh, mesh);
    // Posed top-level bones carry their bind world matrix as local, so they
    // sit directly under the untransformed body node
    for bone in top_bones {
        scene.attach(bone, body_mesh);
    }

    Ok(BodyRig {
        skeleton: skin.skeleton,
        body_mesh,
        animations: Vec::new(),
    })
}

/// Bones whose parent is not itself a bone of `skeleton`, root bone first.
///
/// A skin may have several of these (a separate IK root, a prop bone). All of
/// them must outlive the temporary clone.
fn top_level_bones(scene: &Scene, skeleton: &Skeleton) -> Vec<NodeHandle> {
    let mut bones: Vec<NodeHandle> = skeleton
        .bones
        .iter()
        .copied()
        .filter(|&bone| {
            scene
                .get_node(bone)
                .is_some_and(|node| node.parent().is_none_or(|p| skeleton.bone_index(p).is_none()))
        })
        .collect();

    if let Some(root) = skeleton.root_bone()
        && let Some(pos) = bones.iter().position(|&b| b == root)
    {
        bones[..=pos].rotate_right(1);
    }
    bones
}
