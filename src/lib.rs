//! Procedural cave generation library
//!
//! Re-exports modules for use by the binary and other tools.

pub mod cave;
pub mod error;
pub mod generation;
pub mod pathfinding;
pub mod regions;
pub mod seeds;
pub mod stats;
pub mod tilemap;

pub use cave::{Cell, CellKind, Grid};
pub use error::{GenerationError, Result};
pub use generation::{generate_cave, AlgorithmConfig, CaveGenerator, GeneratedCave, Generator};
pub use pathfinding::find_path_cost;
