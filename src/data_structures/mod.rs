//! Globe data structures: datasets, the decorated globe, meshes and GPU wrappers.
//!
//! - `dataset` holds the three input datasets and their JSON loading
//! - `globe` is the decorated globe object the passes draw
//! - `mesh` contains vertex types and GPU mesh buffers
//! - `texture` wraps depth and colour render targets
//! - `transform` is the globe's model transform
//! - `colour` converts hex colours to linear RGBA

pub mod colour;
pub mod dataset;
pub mod globe;
pub mod mesh;
pub mod texture;
pub mod transform;
