pub mod grid;
pub mod plane;

pub use grid::create_grid;
pub use plane::{PlaneOptions, create_plane};
