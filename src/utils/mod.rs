//! Utility Module
//!
//! - [`OrbitControls`]: orbit camera controller with damping
//! - [`Clock`]: frame delta timer

pub mod orbit_control;
pub mod time;

pub use orbit_control::OrbitControls;
pub use time::Clock;
