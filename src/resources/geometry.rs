use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Affine3A, Vec3};
use rustc_hash::FxHashSet;
use uuid::Uuid;

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Topology {
    #[default]
    TriangleList,
    LineList,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    #[must_use]
    pub fn transform(&self, matrix: &Affine3A) -> Self {
        let mut new_min = Vec3::splat(f32::INFINITY);
        let mut new_max = Vec3::splat(f32::NEG_INFINITY);

        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            let p = matrix.transform_point3(corner);
            new_min = new_min.min(p);
            new_max = new_max.max(p);
        }

        Self {
            min: new_min,
            max: new_max,
        }
    }
}

/// CPU-side vertex data.
///
/// Attributes are stored planar and typed; the renderer interleaves them on
/// upload. `id` identifies the GPU copy, so any geometry with different data
/// must get a new id (see [`Geometry::with_remapped_joints`]).
#[derive(Debug)]
pub struct Geometry {
    id: u64,
    pub uuid: Uuid,

    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    /// Vertex colors, used by line geometry
    pub colors: Vec<[f32; 3]>,
    pub joints: Vec<[u32; 4]>,
    pub weights: Vec<[f32; 4]>,
    pub indices: Option<Vec<u32>>,

    pub topology: Topology,
    pub bounding_box: Option<BoundingBox>,
}

impl Geometry {
    #[must_use]
    pub fn new(positions: Vec<[f32; 3]>) -> Self {
        let mut geo = Self {
            id: NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed),
            uuid: Uuid::new_v4(),
            positions,
            normals: Vec::new(),
            uvs: Vec::new(),
            colors: Vec::new(),
            joints: Vec::new(),
            weights: Vec::new(),
            indices: None,
            topology: Topology::TriangleList,
            bounding_box: None,
        };
        geo.compute_bounding_box();
        geo
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of elements drawn: indices if present, vertices otherwise.
    #[must_use]
    pub fn draw_count(&self) -> u32 {
        self.indices
            .as_ref()
            .map_or(self.positions.len(), Vec::len) as u32
    }

    /// True when the geometry carries joint indices and weights for every
    /// vertex.
    #[must_use]
    pub fn is_skinned(&self) -> bool {
        !self.joints.is_empty()
            && self.joints.len() == self.positions.len()
            && self.weights.len() == self.positions.len()
    }

    /// Largest joint index referenced with a non-zero weight.
    #[must_use]
    pub fn max_joint_index(&self) -> Option<u32> {
        self.weighted_joints().into_iter().max()
    }

    /// Every joint index that moves at least one vertex.
    #[must_use]
    pub fn weighted_joints(&self) -> FxHashSet<u32> {
        self.joints
            .iter()
            .zip(&self.weights)
            .flat_map(|(j, w)| j.iter().zip(w.iter()).filter(|(_, w)| **w > 0.0).map(|(j, _)| *j))
            .collect()
    }

    pub fn compute_bounding_box(&mut self) {
        if self.positions.is_empty() {
            self.bounding_box = None;
            return;
        }
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for p in &self.positions {
            let v = Vec3::from_array(*p);
            min = min.min(v);
            max = max.max(v);
        }
        self.bounding_box = Some(BoundingBox { min, max });
    }

    /// Area-weighted vertex normals from the triangle list.
    pub fn compute_vertex_normals(&mut self) {
        if self.topology != Topology::TriangleList {
            return;
        }
        let count = self.positions.len();
        let mut normals = vec![Vec3::ZERO; count];

        let mut accumulate = |i0: usize, i1: usize, i2: usize| {
            if i0 >= count || i1 >= count || i2 >= count {
                return;
            }
            let v0 = Vec3::from_array(self.positions[i0]);
            let v1 = Vec3::from_array(self.positions[i1]);
            let v2 = Vec3::from_array(self.positions[i2]);
            // Cross product length is twice the area, so larger faces weigh more
            let n = (v1 - v0).cross(v2 - v0);
            normals[i0] += n;
            normals[i1] += n;
            normals[i2] += n;
        };

        match &self.indices {
            Some(indices) => {
                for tri in indices.chunks_exact(3) {
                    accumulate(tri[0] as usize, tri[1] as usize, tri[2] as usize);
                }
            }
            None => {
                for i in (0..count.saturating_sub(2)).step_by(3) {
                    accumulate(i, i + 1, i + 2);
                }
            }
        }

        self.normals = normals
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
            .collect();
    }

    /// Copy of this geometry with every joint index rewritten through `map`.
    ///
    /// The copy gets a fresh id. Joint slots whose index falls outside `map`,
    /// or maps to `None`, are zeroed together with their weight.
    #[must_use]
    pub fn with_remapped_joints(&self, map: &[Option<u32>]) -> Self {
        let mut joints = Vec::with_capacity(self.joints.len());
        let mut weights = Vec::with_capacity(self.weights.len());

        for (j, w) in self.joints.iter().zip(&self.weights) {
            let mut nj = [0u32; 4];
            let mut nw = *w;
            for k in 0..4 {
                match map.get(j[k] as usize).copied().flatten() {
                    Some(mapped) => nj[k] = mapped,
                    None => nw[k] = 0.0,
                }
            }
            joints.push(nj);
            weights.push(nw);
        }

        Self {
            id: NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed),
            uuid: Uuid::new_v4(),
            positions: self.positions.clone(),
            normals: self.normals.clone(),
            uvs: self.uvs.clone(),
            colors: self.colors.clone(),
            joints,
            weights,
            indices: self.indices.clone(),
            topology: self.topology,
            bounding_box: self.bounding_box,
        }
    }
}
