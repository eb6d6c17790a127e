use crate::animation::values::Interpolatable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMode {
    Linear,
    Step,
    CubicSpline,
}

// Keyframes scanned around the cursor before falling back to binary search
const MAX_SCAN_OFFSET: usize = 3;

/// Remembers the last keyframe interval a track was sampled in.
#[derive(Debug, Clone, Default)]
pub struct KeyframeCursor {
    pub last_index: usize,
}

#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    pub times: Vec<f32>,
    /// For CubicSpline: `[in_tangent, value, out_tangent]` per keyframe
    pub values: Vec<T>,
    pub interpolation: InterpolationMode,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    #[must_use]
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: InterpolationMode) -> Self {
        Self {
            times,
            values,
            interpolation,
        }
    }

    /// Time of the last keyframe.
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Stateless sample via binary search. `None` for an empty track.
    #[must_use]
    pub fn sample(&self, time: f32) -> Option<T> {
        if self.times.is_empty() {
            return None;
        }
        let next_idx = self.times.partition_point(|&t| t <= time);
        Some(self.sample_at_frame(next_idx.saturating_sub(1), time))
    }

    /// Sample using `cursor` as a starting guess.
    ///
    /// Monotonic playback hits the cursor interval or one of its neighbours,
    /// so the common case is O(1). Jumps (loop wrap, scrubbing) fall back to
    /// a binary search. `None` for an empty track.
    pub fn sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> Option<T> {
        let len = self.times.len();
        if len == 0 {
            return None;
        }
        if len == 1 {
            return Some(self.value_at(0));
        }

        let i = cursor.last_index.min(len - 1);
        let t_curr = self.times[i];

        let found = if time >= t_curr {
            // Forward: find idx with time < times[idx + 1]
            let mut res = None;
            for offset in 0..=MAX_SCAN_OFFSET {
                let idx = i + offset;
                if idx >= len - 1 {
                    res = Some(len - 1);
                    break;
                }
                if time < self.times[idx + 1] {
                    res = Some(idx);
                    break;
                }
            }
            res
        } else {
            // Backward: time < times[i], find idx with times[idx] <= time
            (1..=MAX_SCAN_OFFSET)
                .take_while(|&offset| offset <= i)
                .map(|offset| i - offset)
                .find(|&idx| time >= self.times[idx])
        };

        let index = found.unwrap_or_else(|| {
            let next_idx = self.times.partition_point(|&t| t <= time);
            next_idx.saturating_sub(1)
        });
        cursor.last_index = index;

        Some(self.sample_at_frame(index, time))
    }

    fn value_at(&self, index: usize) -> T {
        match self.interpolation {
            InterpolationMode::CubicSpline => self.values[index * 3 + 1],
            _ => self.values[index],
        }
    }

    fn sample_at_frame(&self, index: usize, time: f32) -> T {
        let len = self.times.len();
        if index >= len - 1 {
            return self.value_at(len - 1);
        }

        let next_idx = index + 1;
        let t0 = self.times[index];
        let t1 = self.times[next_idx];
        let dt = t1 - t0;

        let t = if dt > 1e-6 { (time - t0) / dt } else { 0.0 };
        let t = t.clamp(0.0, 1.0);

        match self.interpolation {
            InterpolationMode::Step => self.value_at(index),
            InterpolationMode::Linear => T::interpolate_linear(self.value_at(index), self.value_at(next_idx), t),
            InterpolationMode::CubicSpline => {
                let i_prev = index * 3;
                let i_next = next_idx * 3;

                let v0 = self.values[i_prev + 1];
                let out_tangent0 = self.values[i_prev + 2];
                let in_tangent1 = self.values[i_next];
                let v1 = self.values[i_next + 1];

                T::interpolate_cubic(v0, out_tangent0, in_tangent1, v1, t, dt)
            }
        }
    }
}
