//! Tile Renderer: chunk surface cache and viewport compositing.
//!
//! Cells are drawn into per-chunk surfaces, cached per zoom level, and
//! assembled into a fixed-size view around a focal cell.
//!
//! # Invariants
//! - Rendering never changes world content; the only world state it touches
//!   is the dirty flag of chunks it re-renders.
//! - A cached surface is never served for a chunk that was dirty at the
//!   start of the pass.
//! - Output is always exactly the configured view bounds.

mod cache;
mod cell;
mod scene;
mod viewport;
mod zoom;

pub use cache::{CELL_EDGE_COLOR, CHUNK_EDGE_COLOR, CacheStats, ChunkCache};
pub use cell::CellRenderer;
pub use scene::{Scene, ViewConfig};
pub use viewport::{Frame, PassStats, ViewportCompositor};
pub use zoom::ZoomController;
