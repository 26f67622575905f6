use glam::UVec2;
use serde::{Deserialize, Serialize};
use tilescape_assets::{Atlas, Tileset};
use tilescape_common::{CellCoord, ChunkCoord, Surface};
use tilescape_kernel::World;

use crate::cache::ChunkCache;
use crate::viewport::{Frame, ViewportCompositor};
use crate::zoom::ZoomController;

/// Viewport and zoom settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Output size in pixels.
    pub bounds: UVec2,
    pub zoom_levels: Vec<u32>,
    pub initial_zoom: u32,
    /// Unscaled tile size in pixels.
    pub tile_size: UVec2,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            bounds: UVec2::new(1700, 800),
            zoom_levels: (1..=8).collect(),
            initial_zoom: 2,
            tile_size: UVec2::new(16, 16),
        }
    }
}

/// A world together with everything needed to draw it: the zoom state, the
/// pre-scaled atlas, the chunk cache and the compositor.
pub struct Scene {
    world: World,
    atlas: Atlas,
    cache: ChunkCache,
    zoom: ZoomController,
    compositor: ViewportCompositor,
}

impl Scene {
    /// # Panics
    /// If `atlas` lacks a tileset for any configured zoom level.
    pub fn new(world: World, atlas: Atlas, config: &ViewConfig) -> Self {
        let zoom = ZoomController::new(&config.zoom_levels, config.initial_zoom);
        for level in zoom.levels() {
            assert!(
                atlas.get(*level).is_some(),
                "no tileset for zoom level {level}"
            );
        }
        tracing::info!(
            chunks = world.chunk_count(),
            zoom = zoom.current(),
            bounds = ?config.bounds,
            "scene ready"
        );
        Self {
            cache: ChunkCache::new(zoom.levels()),
            compositor: ViewportCompositor::new(config.bounds),
            world,
            atlas,
            zoom,
        }
    }

    /// Pre-scale `base` for every configured zoom level and build the scene.
    pub fn from_tileset(world: World, base: &Tileset, config: &ViewConfig) -> Self {
        let atlas = Atlas::prescale(base, &config.zoom_levels);
        Self::new(world, atlas, config)
    }

    /// Render the viewport around `focal` at the current zoom.
    pub fn render(&mut self, focal: CellCoord) -> Frame {
        self.compositor.render(
            &mut self.world,
            &mut self.cache,
            &self.atlas,
            self.zoom.current(),
            focal,
        )
    }

    /// Surface of a single chunk at the current zoom, after the usual
    /// start-of-pass eviction. `None` if the chunk does not exist.
    pub fn chunk_surface(&mut self, chunk: ChunkCoord) -> Option<&Surface> {
        self.world.chunk_at(chunk)?;
        self.cache.begin_pass(&self.world);
        let (surface, _) =
            self.cache
                .get_chunk_surface(&mut self.world, &self.atlas, chunk, self.zoom.current());
        Some(surface)
    }

    /// Returns false when already at the largest level.
    pub fn zoom_in(&mut self) -> bool {
        let changed = self.zoom.increment();
        tracing::debug!(zoom = self.zoom.current(), changed, "zoom in");
        changed
    }

    /// Returns false when already at the smallest level.
    pub fn zoom_out(&mut self) -> bool {
        let changed = self.zoom.decrement();
        tracing::debug!(zoom = self.zoom.current(), changed, "zoom out");
        changed
    }

    pub fn toggle_overlay(&mut self) -> bool {
        self.cache.toggle_overlay()
    }

    /// Swap in another world. Cached surfaces belong to the old one and are
    /// dropped.
    pub fn replace_world(&mut self, world: World) -> World {
        self.cache.clear();
        std::mem::replace(&mut self.world, world)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutations through this reference must go through the world's own
    /// methods so that dirty marking happens.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn cache(&self) -> &ChunkCache {
        &self.cache
    }

    pub fn zoom(&self) -> &ZoomController {
        &self.zoom
    }

    pub fn atlas(&self) -> &Atlas {
        &self.atlas
    }

    pub fn bounds(&self) -> UVec2 {
        self.compositor.bounds()
    }
}
