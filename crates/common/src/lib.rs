//! Shared types: world/chunk coordinates, entity and tile ids, pixel surfaces.

mod surface;
mod types;

pub use surface::{Rgba, Surface};
pub use types::{CellCoord, ChunkCoord, EntityId, LocalCoord, TileId};
