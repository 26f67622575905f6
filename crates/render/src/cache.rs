use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tilescape_assets::{Atlas, Tileset};
use tilescape_common::{ChunkCoord, LocalCoord, Rgba, Surface};
use tilescape_kernel::World;

use crate::cell::CellRenderer;

/// Overlay color for a chunk's first row and column.
pub const CHUNK_EDGE_COLOR: Rgba = [255, 0, 255, 255];
/// Overlay color for interior cell boundaries.
pub const CELL_EDGE_COLOR: Rgba = [96, 96, 96, 255];

/// Cumulative cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped because their chunk was dirty.
    pub evictions: u64,
    /// Whole-cache clears (overlay toggles, world swaps).
    pub clears: u64,
}

/// Rendered chunk surfaces keyed by (chunk coordinate, zoom level).
///
/// Freshness is not stored per entry: the world's dirty set is consulted
/// at the start of every pass and dirty chunks lose their entries at every
/// zoom level. A chunk's dirty flag is cleared only when it is re-rendered,
/// so a dirty chunk that stays off screen is evicted again on each pass.
#[derive(Debug, Clone)]
pub struct ChunkCache {
    zoom_levels: Vec<u32>,
    entries: HashMap<(ChunkCoord, u32), Surface>,
    overlay: bool,
    stats: CacheStats,
}

impl ChunkCache {
    /// `zoom_levels` are all levels whose entries a dirty chunk must lose.
    pub fn new(zoom_levels: &[u32]) -> Self {
        Self {
            zoom_levels: zoom_levels.to_vec(),
            entries: HashMap::new(),
            overlay: false,
            stats: CacheStats::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a surface for `chunk` at `zoom` is cached.
    pub fn contains(&self, chunk: ChunkCoord, zoom: u32) -> bool {
        self.entries.contains_key(&(chunk, zoom))
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Whether grid lines are drawn into newly rendered chunks.
    pub fn overlay(&self) -> bool {
        self.overlay
    }

    /// Switch the grid overlay. Lines are baked into cached pixels, so any
    /// change drops every entry at every zoom.
    pub fn set_overlay(&mut self, on: bool) {
        if self.overlay != on {
            self.overlay = on;
            self.clear();
        }
    }

    /// Flip the overlay and return its new state.
    pub fn toggle_overlay(&mut self) -> bool {
        self.set_overlay(!self.overlay);
        tracing::info!(overlay = self.overlay, "grid overlay toggled");
        self.overlay
    }

    /// Drop every entry at every zoom.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.clears += 1;
    }

    /// Start-of-pass invalidation: drop every zoom's entry for each dirty
    /// chunk. Returns the number of entries removed.
    pub fn begin_pass(&mut self, world: &World) -> usize {
        let mut evicted = 0;
        for chunk in world.dirty_chunks() {
            for zoom in &self.zoom_levels {
                if self.entries.remove(&(*chunk, *zoom)).is_some() {
                    evicted += 1;
                }
            }
        }
        self.stats.evictions += evicted as u64;
        evicted
    }

    /// Cached surface for `chunk` at `zoom`, rendering it on a miss.
    ///
    /// Returns the surface and whether it came from the cache. A miss stores
    /// the new surface and clears the chunk's dirty flag. The caller only
    /// asks for chunks that exist.
    ///
    /// # Panics
    /// If `atlas` has no tileset for `zoom`.
    pub fn get_chunk_surface(
        &mut self,
        world: &mut World,
        atlas: &Atlas,
        chunk: ChunkCoord,
        zoom: u32,
    ) -> (&Surface, bool) {
        match self.entries.entry((chunk, zoom)) {
            Entry::Occupied(entry) => {
                self.stats.hits += 1;
                (entry.into_mut(), true)
            }
            Entry::Vacant(entry) => {
                let tiles = atlas
                    .get(zoom)
                    .unwrap_or_else(|| panic!("no tileset for zoom level {zoom}"));
                let surface = render_chunk(world, tiles, chunk, self.overlay);
                world.clear_dirty(chunk);
                self.stats.misses += 1;
                (entry.insert(surface), false)
            }
        }
    }
}

/// Render every cell of `chunk` into one surface, plus grid lines if asked.
fn render_chunk(world: &World, tiles: &Tileset, chunk: ChunkCoord, overlay: bool) -> Surface {
    let _span = tracing::debug_span!("render_chunk", %chunk).entered();
    debug_assert!(world.chunk_at(chunk).is_some(), "chunk {chunk} does not exist");

    let side = world.chunk_side();
    let tile = tiles.tile_size();
    let mut surface = Surface::new(side * tile.x, side * tile.y);
    let cells = CellRenderer::new(world, tiles);

    for y in 0..side {
        for x in 0..side {
            let coord = chunk.cell(side, LocalCoord::new(x, y));
            if let Some(cell) = cells.render_cell(coord) {
                surface.blit(&cell, (x * tile.x) as i64, (y * tile.y) as i64);
            }
        }
    }

    if overlay {
        for i in 1..side {
            surface.vline(i * tile.x, CELL_EDGE_COLOR);
            surface.hline(i * tile.y, CELL_EDGE_COLOR);
        }
        surface.vline(0, CHUNK_EDGE_COLOR);
        surface.hline(0, CHUNK_EDGE_COLOR);
    }
    surface
}
