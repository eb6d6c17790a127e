use std::time::{Duration, Instant};

/// Frame clock.
///
/// [`get_delta`](Self::get_delta) returns the seconds since the previous
/// call (or since creation on the first call).
pub struct Clock {
    start_time: Instant,
    last_update: Instant,
    /// Total elapsed time at the last `get_delta`
    pub elapsed: Duration,
    /// Number of `get_delta` calls
    pub frame_count: u64,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    #[must_use]
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start_time: now,
            last_update: now,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Seconds since the previous call.
    pub fn get_delta(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now - self.last_update;
        self.elapsed = now - self.start_time;
        self.last_update = now;
        self.frame_count += 1;
        delta.as_secs_f32()
    }

    /// Seconds since creation.
    #[must_use]
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}
