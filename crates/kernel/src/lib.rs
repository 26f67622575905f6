//! World Kernel: authoritative tile world state.
//!
//! # Invariants
//! - Chunks and cells are created once, at generation or load, and never
//!   added or removed afterwards.
//! - An entity sits in at most one cell's occupant list.
//! - Every mutation of a cell's visible content marks its chunk dirty.

mod chunk;
pub mod world;

pub use chunk::{Cell, Chunk};
pub use world::{Entity, Placement, PlacementError, World, WorldConfig, WorldError};
