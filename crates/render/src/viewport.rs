use glam::{I64Vec2, IVec2, UVec2};
use tilescape_assets::Atlas;
use tilescape_common::{CellCoord, ChunkCoord, Surface};
use tilescape_kernel::World;

use crate::cache::ChunkCache;

/// What one viewport pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassStats {
    pub hits: usize,
    pub misses: usize,
    /// Cache entries evicted for dirty chunks at the start of the pass.
    pub evicted: usize,
    /// Visible slots with no chunk behind them (past the world edge).
    pub skipped: usize,
    /// Top-left chunk of the visible rectangle.
    pub start: IVec2,
    /// Visible rectangle size in chunks.
    pub span: UVec2,
    /// One row per visible chunk row: `#` hit, `+` rendered, `.` absent.
    pub chunk_map: String,
}

/// A rendered viewport and the stats of the pass that produced it.
#[derive(Debug, Clone)]
pub struct Frame {
    pub surface: Surface,
    pub stats: PassStats,
}

/// Assembles cached chunk surfaces into a fixed-size view centered on a
/// focal cell.
///
/// Chunks are laid out on a working grid covering the visible chunk
/// rectangle; the output window is centered on the focal cell and clipped
/// to that grid, so near the world edge the image is anchored away from
/// the missing side instead of wrapping.
#[derive(Debug, Clone)]
pub struct ViewportCompositor {
    bounds: UVec2,
}

impl ViewportCompositor {
    pub fn new(bounds: UVec2) -> Self {
        Self { bounds }
    }

    /// Output size in pixels.
    pub fn bounds(&self) -> UVec2 {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: UVec2) {
        self.bounds = bounds;
    }

    /// Chunks per axis: enough whole chunks to span the output, never fewer
    /// than 3. Window pixels the rectangle misses stay background.
    pub fn visible_span(&self, chunk_px: UVec2) -> UVec2 {
        ((self.bounds + chunk_px - UVec2::ONE) / chunk_px).max(UVec2::splat(3))
    }

    /// Render the view around `focal` at `zoom`.
    ///
    /// Evicts dirty chunks from `cache` first, then fetches every existing
    /// chunk of the visible rectangle on the focal cell's layer.
    ///
    /// # Panics
    /// If `atlas` has no tileset for `zoom`.
    pub fn render(
        &self,
        world: &mut World,
        cache: &mut ChunkCache,
        atlas: &Atlas,
        zoom: u32,
        focal: CellCoord,
    ) -> Frame {
        let _span = tracing::info_span!("render_viewport", %focal, zoom).entered();

        let tile_px = atlas
            .get(zoom)
            .unwrap_or_else(|| panic!("no tileset for zoom level {zoom}"))
            .tile_size();
        let side = world.chunk_side() as i32;
        let chunk_px = tile_px * side as u32;
        let span = self.visible_span(chunk_px);

        let focal_chunk = IVec2::new(focal.x.div_euclid(side), focal.y.div_euclid(side));
        let start = (focal_chunk - span.as_ivec2() / 2).max(IVec2::ZERO);

        let mut stats = PassStats {
            evicted: cache.begin_pass(world),
            start,
            span,
            ..PassStats::default()
        };

        // Top-left of the output window in working-grid pixels. The working
        // grid starts at chunk `start`; pixels of the window that fall outside
        // it stay background.
        let focal_px =
            (IVec2::new(focal.x, focal.y) - start * side).as_i64vec2() * tile_px.as_i64vec2();
        let window = focal_px - self.bounds.as_i64vec2() / 2;

        // Blitting each chunk straight into the output at its working-grid
        // position minus the window origin clips exactly like cropping an
        // assembled working surface, without allocating it.
        let mut surface = Surface::new(self.bounds.x, self.bounds.y);
        for row in 0..span.y as i32 {
            for col in 0..span.x as i32 {
                let coord = ChunkCoord::new(start.x + col, start.y + row, focal.z);
                if world.chunk_at(coord).is_none() {
                    stats.skipped += 1;
                    stats.chunk_map.push('.');
                    continue;
                }
                let (chunk, hit) = cache.get_chunk_surface(world, atlas, coord, zoom);
                let at = I64Vec2::new(col as i64, row as i64) * chunk_px.as_i64vec2() - window;
                surface.blit(chunk, at.x, at.y);
                if hit {
                    stats.hits += 1;
                    stats.chunk_map.push('#');
                } else {
                    stats.misses += 1;
                    stats.chunk_map.push('+');
                }
            }
            stats.chunk_map.push('\n');
        }

        tracing::trace!(
            hits = stats.hits,
            misses = stats.misses,
            evicted = stats.evicted,
            skipped = stats.skipped,
            "viewport pass complete"
        );
        tracing::debug!(start = ?stats.start, "chunks:\n{}", stats.chunk_map);

        Frame { surface, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilescape_assets::Tileset;
    use tilescape_common::{Rgba, TileId};
    use tilescape_kernel::WorldConfig;

    const GRASS: Rgba = [0, 200, 0, 255];

    /// 4x4 chunks of 4x4 cells, 2x2 px tiles. Tile id n is a solid color
    /// distinct per id so positions can be checked by color.
    fn setup() -> (World, Atlas) {
        let cfg = WorldConfig {
            width_chunks: 4,
            height_chunks: 4,
            chunk_side: 4,
            ..WorldConfig::default()
        };
        let world = World::uniform(&cfg, TileId(1)).unwrap();
        let mut colors: Vec<Rgba> = (0..8u8).map(|i| [i * 30, 200, 0, 255]).collect();
        colors[1] = GRASS;
        let base = Tileset::solid(UVec2::new(2, 2), &colors).unwrap();
        (world, Atlas::prescale(&base, &[1, 2]))
    }

    #[test]
    fn span_covers_bounds_with_floor() {
        let vc = ViewportCompositor::new(UVec2::new(10, 10));
        assert_eq!(vc.visible_span(UVec2::new(100, 100)), UVec2::new(3, 3));
        let vc = ViewportCompositor::new(UVec2::new(1700, 800));
        assert_eq!(vc.visible_span(UVec2::new(256, 256)), UVec2::new(7, 4));
        assert_eq!(vc.visible_span(UVec2::new(850, 400)), UVec2::new(3, 3));
        assert_eq!(vc.visible_span(UVec2::new(100, 100)), UVec2::new(17, 8));
    }

    #[test]
    fn chunk_past_the_span_is_not_rendered() {
        let cfg = WorldConfig {
            width_chunks: 8,
            height_chunks: 8,
            chunk_side: 8,
            ..WorldConfig::default()
        };
        let mut world = World::uniform(&cfg, TileId(1)).unwrap();
        let base = Tileset::solid(UVec2::new(2, 2), &[GRASS, GRASS]).unwrap();
        let atlas = Atlas::prescale(&base, &[1]);
        let mut cache = ChunkCache::new(&[1]);
        // 16 px chunks; 40 px wide output needs 3 chunks per axis.
        let vc = ViewportCompositor::new(UVec2::new(40, 16));

        world.mark_dirty(CellCoord::new(48, 32, 0));
        let frame = vc.render(&mut world, &mut cache, &atlas, 1, CellCoord::new(36, 36, 0));
        assert_eq!(frame.stats.span, UVec2::new(3, 3));
        assert_eq!(frame.stats.start, IVec2::new(3, 3));
        assert_eq!(frame.stats.misses, 9);
        assert!(world.is_dirty(ChunkCoord::new(6, 4, 0)));
        assert!(!cache.contains(ChunkCoord::new(6, 4, 0), 1));
    }

    #[test]
    fn output_is_exactly_bounds() {
        let (mut world, atlas) = setup();
        let mut cache = ChunkCache::new(&[1, 2]);
        let vc = ViewportCompositor::new(UVec2::new(13, 7));
        for focal in [
            CellCoord::new(0, 0, 0),
            CellCoord::new(8, 8, 0),
            CellCoord::new(15, 15, 0),
        ] {
            let frame = vc.render(&mut world, &mut cache, &atlas, 1, focal);
            assert_eq!(frame.surface.size(), UVec2::new(13, 7));
        }
    }

    #[test]
    fn corner_focal_is_anchored_away_from_edge() {
        let (mut world, atlas) = setup();
        let mut cache = ChunkCache::new(&[1, 2]);
        let vc = ViewportCompositor::new(UVec2::new(20, 20));
        let frame = vc.render(&mut world, &mut cache, &atlas, 1, CellCoord::new(0, 0, 0));

        assert_eq!(frame.stats.start, IVec2::ZERO);
        // Focal pixel (0,0) lands at the output center; left/top half is empty.
        assert_eq!(frame.surface.pixel(9, 9), Some(Surface::BACKGROUND));
        assert_eq!(frame.surface.pixel(10, 10), Some(GRASS));
        assert_eq!(frame.surface.pixel(19, 19), Some(GRASS));
        assert_eq!(frame.surface.pixel(0, 19), Some(Surface::BACKGROUND));
    }

    #[test]
    fn far_corner_leaves_right_and_bottom_empty() {
        let (mut world, atlas) = setup();
        let mut cache = ChunkCache::new(&[1, 2]);
        let vc = ViewportCompositor::new(UVec2::new(20, 20));
        let frame = vc.render(&mut world, &mut cache, &atlas, 1, CellCoord::new(15, 15, 0));
        // World is 32x32 px; focal pixel (30,30) at output center (10,10).
        assert_eq!(frame.surface.pixel(11, 11), Some(GRASS));
        assert_eq!(frame.surface.pixel(12, 12), Some(Surface::BACKGROUND));
        assert_eq!(frame.surface.pixel(0, 0), Some(GRASS));
        assert!(frame.stats.skipped > 0);
    }

    #[test]
    fn focal_cell_is_centered_mid_world() {
        let (mut world, atlas) = setup();
        world.set_terrain(CellCoord::new(9, 6, 0), TileId(5), true);
        let mut cache = ChunkCache::new(&[1, 2]);
        let vc = ViewportCompositor::new(UVec2::new(12, 12));
        let frame = vc.render(&mut world, &mut cache, &atlas, 2, CellCoord::new(9, 6, 0));
        // 4x4 px tiles at zoom 2; the focal tile's top-left sits at the center.
        assert_eq!(frame.surface.pixel(6, 6), Some([150, 200, 0, 255]));
        assert_eq!(frame.surface.pixel(9, 9), Some([150, 200, 0, 255]));
        assert_eq!(frame.surface.pixel(5, 5), Some(GRASS));
        assert_eq!(frame.surface.pixel(0, 0), Some(GRASS));
        assert_eq!(frame.surface.pixel(11, 11), Some(GRASS));
    }

    #[test]
    fn matches_crop_of_assembled_working_surface() {
        let (mut world, atlas) = setup();
        for (i, x) in [3, 7, 11, 14].into_iter().enumerate() {
            world.set_terrain(CellCoord::new(x, x / 2, 0), TileId(i as u16 + 2), true);
        }
        let mut cache = ChunkCache::new(&[1, 2]);
        let vc = ViewportCompositor::new(UVec2::new(22, 14));
        let focal = CellCoord::new(5, 2, 0);
        let frame = vc.render(&mut world, &mut cache, &atlas, 1, focal);

        let span = frame.stats.span;
        let start = frame.stats.start;
        let mut working = Surface::new(span.x * 8, span.y * 8);
        for row in 0..span.y as i32 {
            for col in 0..span.x as i32 {
                let coord = ChunkCoord::new(start.x + col, start.y + row, 0);
                if world.chunk_at(coord).is_some() {
                    let (s, hit) = cache.get_chunk_surface(&mut world, &atlas, coord, 1);
                    assert!(hit);
                    working.blit(s, col as i64 * 8, row as i64 * 8);
                }
            }
        }
        let off_x = (focal.x - start.x * 4) as i64 * 2 - 11;
        let off_y = (focal.y - start.y * 4) as i64 * 2 - 7;
        let (x0, y0) = (off_x.max(0), off_y.max(0));
        let x1 = (off_x + 22).min(working.width() as i64);
        let y1 = (off_y + 14).min(working.height() as i64);
        let window = working.crop(x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32);
        let mut expected = Surface::new(22, 14);
        expected.blit(&window, x0 - off_x, y0 - off_y);

        assert_eq!(frame.surface, expected);
    }

    #[test]
    fn second_pass_hits_and_is_identical() {
        let (mut world, atlas) = setup();
        let mut cache = ChunkCache::new(&[1, 2]);
        let vc = ViewportCompositor::new(UVec2::new(16, 16));
        let focal = CellCoord::new(6, 6, 0);
        let first = vc.render(&mut world, &mut cache, &atlas, 1, focal);
        let second = vc.render(&mut world, &mut cache, &atlas, 1, focal);
        assert!(first.stats.misses > 0);
        assert_eq!(second.stats.misses, 0);
        assert_eq!(second.stats.hits, first.stats.misses);
        assert_eq!(first.surface, second.surface);
    }

    #[test]
    fn off_screen_dirty_chunk_stays_dirty() {
        let (mut world, atlas) = setup();
        let mut cache = ChunkCache::new(&[1, 2]);
        let vc = ViewportCompositor::new(UVec2::new(4, 4));
        let focal = CellCoord::new(0, 0, 0);
        vc.render(&mut world, &mut cache, &atlas, 1, focal);

        // Chunk (3,3) is outside the 3x3 visible rectangle at the origin.
        world.mark_dirty(CellCoord::new(13, 13, 0));
        let frame = vc.render(&mut world, &mut cache, &atlas, 1, focal);
        assert_eq!(frame.stats.misses, 0);
        assert!(world.is_dirty(ChunkCoord::new(3, 3, 0)));
        vc.render(&mut world, &mut cache, &atlas, 1, focal);
        assert!(world.is_dirty(ChunkCoord::new(3, 3, 0)));

        vc.render(&mut world, &mut cache, &atlas, 1, CellCoord::new(14, 14, 0));
        assert!(world.dirty_chunks().is_empty());
    }

    #[test]
    fn missing_layer_renders_background() {
        let (mut world, atlas) = setup();
        let mut cache = ChunkCache::new(&[1]);
        let vc = ViewportCompositor::new(UVec2::new(8, 8));
        let frame = vc.render(&mut world, &mut cache, &atlas, 1, CellCoord::new(4, 4, 3));
        assert_eq!(frame.stats.skipped, 9);
        assert_eq!(frame.surface, Surface::new(8, 8));
    }
}
