use glam::UVec3;
use std::collections::BTreeMap;
use std::fmt;
use tilescape_common::{CellCoord, ChunkCoord, EntityId, TileId};
use tilescape_kernel::World;
use tilescape_render::{CacheStats, ChunkCache, PassStats};

/// Read-only queries against world and cache state for debugging.
pub struct WorldInspector;

impl WorldInspector {
    /// Size, counts, dirty chunks and state hash of `world`.
    pub fn summary(world: &World) -> WorldSummary {
        WorldSummary {
            size_chunks: world.size_chunks(),
            chunk_side: world.chunk_side(),
            chunk_count: world.chunk_count(),
            entity_count: world.entity_count(),
            dirty_chunks: world.dirty_chunks().iter().copied().collect(),
            state_hash: world.state_hash(),
        }
    }

    /// Name, tile and placement of one entity; `None` for unknown ids.
    pub fn inspect_entity(world: &World, id: EntityId) -> Option<EntityInfo> {
        world.entity(id).map(|e| {
            let position = e.position();
            EntityInfo {
                id,
                name: e.name.clone(),
                tile: e.tile,
                position,
                chunk: position.and_then(|p| p.chunk(world.chunk_side())),
            }
        })
    }

    /// All entity ids in ascending order.
    pub fn list_entities(world: &World) -> Vec<EntityId> {
        world.entities().map(|(id, _)| *id).collect()
    }

    /// Number of cells per terrain tile.
    pub fn terrain_histogram(world: &World) -> BTreeMap<TileId, usize> {
        let mut counts = BTreeMap::new();
        for (_, chunk) in world.chunks() {
            for (_, cell) in chunk.cells() {
                *counts.entry(cell.terrain).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Entry count, overlay state and lifetime counters of `cache`.
    pub fn cache_summary(cache: &ChunkCache) -> CacheSummary {
        CacheSummary {
            entries: cache.len(),
            overlay: cache.overlay(),
            stats: cache.stats(),
        }
    }

    /// Multi-line report of one viewport pass, chunk map included.
    pub fn pass_report(stats: &PassStats) -> String {
        format!(
            "pass: start=({}, {}) span={}x{} hits={} misses={} evicted={} skipped={}\n{}",
            stats.start.x,
            stats.start.y,
            stats.span.x,
            stats.span.y,
            stats.hits,
            stats.misses,
            stats.evicted,
            stats.skipped,
            stats.chunk_map
        )
    }
}

/// Summary of world state for the inspector.
#[derive(Debug, Clone)]
pub struct WorldSummary {
    pub size_chunks: UVec3,
    pub chunk_side: u32,
    pub chunk_count: usize,
    pub entity_count: usize,
    pub dirty_chunks: Vec<ChunkCoord>,
    pub state_hash: u64,
}

impl fmt::Display for WorldSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "World: {}x{}x{} chunks of {}x{} cells ({} chunks) entities={} dirty={} hash={:016x}",
            self.size_chunks.x,
            self.size_chunks.y,
            self.size_chunks.z,
            self.chunk_side,
            self.chunk_side,
            self.chunk_count,
            self.entity_count,
            self.dirty_chunks.len(),
            self.state_hash
        )
    }
}

/// Detailed info about a single entity.
#[derive(Debug, Clone)]
pub struct EntityInfo {
    pub id: EntityId,
    pub name: String,
    pub tile: TileId,
    pub position: Option<CellCoord>,
    pub chunk: Option<ChunkCoord>,
}

impl fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity #{} {:?} tile={}", self.id.0, self.name, self.tile.0)?;
        match (self.position, self.chunk) {
            (Some(p), Some(c)) => write!(f, " at {p} in chunk {c}"),
            _ => write!(f, " (unplaced)"),
        }
    }
}

/// Cache occupancy and cumulative counters.
#[derive(Debug, Clone, Copy)]
pub struct CacheSummary {
    pub entries: usize,
    pub overlay: bool,
    pub stats: CacheStats,
}

impl fmt::Display for CacheSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cache: entries={} overlay={} hits={} misses={} evictions={} clears={}",
            self.entries,
            if self.overlay { "on" } else { "off" },
            self.stats.hits,
            self.stats.misses,
            self.stats.evictions,
            self.stats.clears
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec2;
    use tilescape_assets::Tileset;
    use tilescape_kernel::WorldConfig;
    use tilescape_render::{Scene, ViewConfig};

    fn small_world() -> World {
        let cfg = WorldConfig {
            width_chunks: 2,
            height_chunks: 3,
            chunk_side: 4,
            ..WorldConfig::default()
        };
        World::generate(&cfg).unwrap()
    }

    #[test]
    fn summary_counts_chunks_and_dirty() {
        let mut world = small_world();
        let summary = WorldInspector::summary(&world);
        assert_eq!(summary.chunk_count, 6);
        assert_eq!(summary.size_chunks, UVec3::new(2, 3, 1));
        assert!(summary.dirty_chunks.is_empty());

        world.set_terrain(CellCoord::new(5, 9, 0), TileId(4), false);
        let summary = WorldInspector::summary(&world);
        assert_eq!(summary.dirty_chunks, vec![ChunkCoord::new(1, 2, 0)]);
        let s = summary.to_string();
        assert!(s.contains("2x3x1 chunks of 4x4 cells"), "{s}");
        assert!(s.contains("dirty=1"), "{s}");
    }

    #[test]
    fn entity_info_reports_position_and_chunk() {
        let mut world = small_world();
        let id = world.spawn_entity("scout", TileId(3)).unwrap();
        let info = WorldInspector::inspect_entity(&world, id).unwrap();
        assert!(info.position.is_none());
        assert!(info.to_string().contains("(unplaced)"));

        world.place_entity(id, CellCoord::new(6, 1, 0)).unwrap();
        let info = WorldInspector::inspect_entity(&world, id).unwrap();
        assert_eq!(info.chunk, Some(ChunkCoord::new(1, 0, 0)));
        assert_eq!(
            info.to_string(),
            "Entity #0 \"scout\" tile=3 at (6, 1, 0) in chunk [1, 0, 0]"
        );
        assert_eq!(WorldInspector::list_entities(&world), vec![id]);
        assert!(WorldInspector::inspect_entity(&world, EntityId(99)).is_none());
    }

    #[test]
    fn histogram_covers_every_cell() {
        let world = small_world();
        let hist = WorldInspector::terrain_histogram(&world);
        assert_eq!(hist.values().sum::<usize>(), 6 * 16);
        assert!(hist.keys().all(|t| *t == TileId(1) || *t == TileId(2)));
    }

    #[test]
    fn cache_and_pass_reports() {
        let view = ViewConfig {
            bounds: UVec2::new(16, 16),
            zoom_levels: vec![1],
            initial_zoom: 1,
            tile_size: UVec2::new(2, 2),
        };
        let tiles = Tileset::builtin(view.tile_size).unwrap();
        let mut scene = Scene::from_tileset(small_world(), &tiles, &view);
        let frame = scene.render(CellCoord::new(0, 0, 0));

        let report = WorldInspector::pass_report(&frame.stats);
        assert!(report.starts_with("pass: start=(0, 0) span=3x3"), "{report}");
        assert!(report.contains("\n++.\n++.\n++.\n"), "{report}");

        let cache = WorldInspector::cache_summary(scene.cache());
        assert_eq!(cache.entries, 6);
        assert!(cache.to_string().contains("misses=6"));
    }
}
