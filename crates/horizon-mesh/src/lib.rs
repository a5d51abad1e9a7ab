//! Heightfield tessellation: LOD surface meshes with border-sampled normals.

pub mod builder;
pub mod error;
pub mod height_curve;
pub mod surface_mesh;

pub use builder::SurfaceMeshBuilder;
pub use error::MeshError;
pub use height_curve::HeightCurve;
pub use surface_mesh::{SurfaceMesh, TerrainVertex};
