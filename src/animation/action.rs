use std::sync::Arc;

use crate::animation::binding::PropertyBinding;
use crate::animation::clip::{AnimationClip, TrackData};
use crate::animation::tracks::KeyframeCursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    Once,
    Loop,
    PingPong,
}

/// Playback state of one clip.
///
/// A new action is stopped; call [`play`](Self::play) to start it.
#[derive(Debug, Clone)]
pub struct AnimationAction {
    clip: Arc<AnimationClip>,

    pub time: f32,
    pub time_scale: f32,
    /// Blend weight in `[0, 1]` against the node's current value
    pub weight: f32,
    pub loop_mode: LoopMode,
    pub paused: bool,
    playing: bool,

    pub bindings: Vec<PropertyBinding>,

    pub(crate) track_cursors: Vec<KeyframeCursor>,
}

impl AnimationAction {
    #[must_use]
    pub fn new(clip: Arc<AnimationClip>) -> Self {
        let track_count = clip.tracks.len();
        Self {
            clip,
            time: 0.0,
            time_scale: 1.0,
            weight: 1.0,
            loop_mode: LoopMode::Loop,
            paused: false,
            playing: false,
            bindings: Vec::new(),
            track_cursors: vec![KeyframeCursor::default(); track_count],
        }
    }

    #[must_use]
    pub fn clip(&self) -> &Arc<AnimationClip> {
        &self.clip
    }

    pub fn play(&mut self) -> &mut Self {
        self.playing = true;
        self.paused = false;
        self
    }

    /// Stops playback and rewinds to the start.
    pub fn stop(&mut self) -> &mut Self {
        self.playing = false;
        self.paused = false;
        self.time = 0.0;
        self.track_cursors.fill(KeyframeCursor::default());
        self
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// True when the action contributes to the pose this frame.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.playing && !self.paused
    }

    /// Advances local time according to the loop mode.
    pub fn update(&mut self, dt: f32) {
        if !self.is_running() {
            return;
        }

        let duration = self.clip.duration;
        if duration <= 0.0 {
            return;
        }

        self.time += dt * self.time_scale;

        match self.loop_mode {
            LoopMode::Once => {
                if self.time >= duration {
                    self.time = duration;
                    self.paused = true;
                } else if self.time < 0.0 {
                    self.time = 0.0;
                    self.paused = true;
                }
            }
            LoopMode::Loop => {
                self.time = self.time.rem_euclid(duration);
            }
            LoopMode::PingPong => {
                let double_duration = duration * 2.0;
                let mut t = self.time.rem_euclid(double_duration);
                if t > duration {
                    t = double_duration - t;
                }
                self.time = t;
            }
        }
    }

    /// Samples track `track_index` at the current time.
    pub fn sample_track(&mut self, track_index: usize) -> Option<TrackValue> {
        let track = self.clip.tracks.get(track_index)?;
        let cursor = self.track_cursors.get_mut(track_index)?;

        Some(match &track.data {
            TrackData::Vector3(t) => TrackValue::Vector3(t.sample_with_cursor(self.time, cursor)?),
            TrackData::Quaternion(t) => TrackValue::Quaternion(t.sample_with_cursor(self.time, cursor)?),
            TrackData::Scalar(t) => TrackValue::Scalar(t.sample_with_cursor(self.time, cursor)?),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackValue {
    Vector3(glam::Vec3),
    Quaternion(glam::Quat),
    Scalar(f32),
}
