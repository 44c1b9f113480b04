//! Built-in vertex programs and algorithm drivers.
//!
//! - [`bfs`] - Breadth-first search (hop distances from a source)
//! - [`components`] - Connected components via min-label propagation
//! - [`radii`] - Eccentricity and radius estimation on top of BFS

pub mod bfs;
pub mod components;
pub mod radii;

pub use bfs::{bfs, bfs_reference, BfsProgram, Distance};
pub use components::{connected_components, ComponentsProgram, Label};
pub use radii::{eccentricity, radius_estimate};
