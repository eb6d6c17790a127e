use glam::{Quat, Vec3};

use crate::animation::binding::TargetPath;
use crate::animation::tracks::KeyframeTrack;

#[derive(Debug, Clone)]
pub struct TrackMeta {
    /// Name of the node the track drives
    pub node_name: String,
    pub target: TargetPath,
}

#[derive(Debug, Clone)]
pub enum TrackData {
    Vector3(KeyframeTrack<Vec3>),
    Quaternion(KeyframeTrack<Quat>),
    Scalar(KeyframeTrack<f32>),
}

impl TrackData {
    #[must_use]
    pub fn end_time(&self) -> f32 {
        match self {
            Self::Vector3(t) => t.end_time(),
            Self::Quaternion(t) => t.end_time(),
            Self::Scalar(t) => t.end_time(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Track {
    pub meta: TrackMeta,
    pub data: TrackData,
}

/// A named, baked animation.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: String,
    /// Last keyframe time across all tracks, seconds
    pub duration: f32,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    #[must_use]
    pub fn new(name: String, tracks: Vec<Track>) -> Self {
        let duration = tracks
            .iter()
            .map(|t| t.data.end_time())
            .fold(0.0_f32, f32::max);

        Self {
            name,
            duration,
            tracks,
        }
    }
}
