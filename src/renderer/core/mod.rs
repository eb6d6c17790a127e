pub mod context;

pub use context::{DepthTarget, WgpuContext};
