//! Core resource definitions, independent of the GPU backend:
//! - [`Mesh`]: geometry + material + skin binding
//! - [`Material`]: Standard / Phong / Line surfaces
//! - [`Image`]: decoded RGBA8 pixels
//! - [`Geometry`]: planar vertex attributes
//! - [`Color`]: linear RGB with sRGB parsing

pub mod color;
pub mod geometry;
pub mod image;
pub mod material;
pub mod mesh;
pub mod primitives;

pub use color::Color;
pub use geometry::{BoundingBox, Geometry, Topology};
pub use image::Image;
pub use material::{
    AlphaMode, LineBasicMaterial, Material, MaterialData, MaterialSettings, MeshPhongMaterial,
    MeshStandardMaterial, Side,
};
pub use mesh::Mesh;
