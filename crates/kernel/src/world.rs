use glam::{IVec3, UVec3};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tilescape_common::{CellCoord, ChunkCoord, EntityId, TileId};

use crate::chunk::{Cell, Chunk};

/// Shape and content of a freshly generated world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World width in chunks.
    pub width_chunks: u32,
    /// World height in chunks.
    pub height_chunks: u32,
    /// Number of depth layers. Each layer is one chunk deep.
    pub depth_layers: u32,
    /// Cells per chunk edge.
    pub chunk_side: u32,
    /// Seed for terrain generation.
    pub seed: u64,
    /// Terrain tiles picked uniformly at random for every cell.
    pub terrain: Vec<TileId>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width_chunks: 8,
            height_chunks: 8,
            depth_layers: 1,
            chunk_side: 16,
            seed: 0,
            terrain: vec![TileId(1), TileId(2)],
        }
    }
}

/// Errors from world construction and the entity table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("an entity named {0:?} already exists")]
    DuplicateName(String),
    #[error("invalid world config: {0}")]
    InvalidConfig(&'static str),
    #[error("malformed world: {0}")]
    Malformed(String),
}

/// Why a placement was refused. Refusals leave the world untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("entity {0:?} not found")]
    UnknownEntity(EntityId),
    #[error("target {0} is out of bounds")]
    OutOfBounds(CellCoord),
    #[error("target {0} is impassable")]
    Impassable(CellCoord),
    #[error("already at {0}")]
    Unchanged(CellCoord),
    #[error("entity has never been placed")]
    Unplaced,
}

/// A successful placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// First placement of a previously unplaced entity.
    Spawned { at: CellCoord },
    Moved { from: CellCoord, to: CellCoord },
}

/// Something that stands in a cell and is drawn over its terrain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub tile: TileId,
    position: Option<CellCoord>,
}

impl Entity {
    /// Current cell, or `None` if the entity was never placed.
    pub fn position(&self) -> Option<CellCoord> {
        self.position
    }
}

/// The authoritative tile world.
///
/// Owns every chunk, the entity table and the dirty set. Cells refer to
/// entities by id; entities store their position for lookups only.
///
/// BTreeMaps keep iteration (and therefore serialization and hashing)
/// deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    chunk_side: u32,
    size_chunks: UVec3,
    chunks: BTreeMap<ChunkCoord, Chunk>,
    entities: BTreeMap<EntityId, Entity>,
    names: BTreeMap<String, EntityId>,
    next_entity: u32,
    /// Chunks mutated since a cached rendering last observed them.
    #[serde(skip)]
    dirty: BTreeSet<ChunkCoord>,
}

impl World {
    /// Generate a world with random terrain drawn from `config.terrain`.
    pub fn generate(config: &WorldConfig) -> Result<Self, WorldError> {
        if config.terrain.is_empty() {
            return Err(WorldError::InvalidConfig("terrain list is empty"));
        }
        let mut rng = config.seed;
        let world = Self::from_fn(config, |_| {
            rng = splitmix64(rng);
            let tile = config.terrain[(rng % config.terrain.len() as u64) as usize];
            Cell::new(tile, true)
        })?;
        tracing::info!(
            chunks = world.chunk_count(),
            side = config.chunk_side,
            seed = config.seed,
            "generated world"
        );
        Ok(world)
    }

    /// Build a world whose cells all share `terrain`, shaped by `config`.
    pub fn uniform(config: &WorldConfig, terrain: TileId) -> Result<Self, WorldError> {
        Self::from_fn(config, |_| Cell::new(terrain, true))
    }

    /// Build a world asking `fill` for every cell, chunk by chunk.
    pub fn from_fn(
        config: &WorldConfig,
        mut fill: impl FnMut(CellCoord) -> Cell,
    ) -> Result<Self, WorldError> {
        if config.chunk_side == 0 {
            return Err(WorldError::InvalidConfig("chunk_side must be positive"));
        }
        if config.width_chunks == 0 || config.height_chunks == 0 || config.depth_layers == 0 {
            return Err(WorldError::InvalidConfig("world must have at least one chunk"));
        }
        let side = config.chunk_side;
        let mut chunks = BTreeMap::new();
        for cz in 0..config.depth_layers as i32 {
            for cy in 0..config.height_chunks as i32 {
                for cx in 0..config.width_chunks as i32 {
                    let coord = ChunkCoord::new(cx, cy, cz);
                    let chunk = Chunk::from_fn(side, |local| fill(coord.cell(side, local)));
                    chunks.insert(coord, chunk);
                }
            }
        }
        Ok(Self {
            chunk_side: side,
            size_chunks: UVec3::new(
                config.width_chunks,
                config.height_chunks,
                config.depth_layers,
            ),
            chunks,
            entities: BTreeMap::new(),
            names: BTreeMap::new(),
            next_entity: 0,
            dirty: BTreeSet::new(),
        })
    }

    /// Cells per chunk edge.
    pub fn chunk_side(&self) -> u32 {
        self.chunk_side
    }

    /// World extent in chunks (x, y) and layers (z).
    pub fn size_chunks(&self) -> UVec3 {
        self.size_chunks
    }

    /// World extent in cells (x, y) and layers (z).
    pub fn size_cells(&self) -> UVec3 {
        UVec3::new(
            self.size_chunks.x * self.chunk_side,
            self.size_chunks.y * self.chunk_side,
            self.size_chunks.z,
        )
    }

    /// Center cell of the top layer.
    pub fn center(&self) -> CellCoord {
        let size = self.size_cells();
        CellCoord::new((size.x / 2) as i32, (size.y / 2) as i32, 0)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunks(&self) -> impl Iterator<Item = (&ChunkCoord, &Chunk)> {
        self.chunks.iter()
    }

    pub fn chunk_at(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// Cell at a world coordinate; `None` outside the world.
    pub fn cell_at(&self, coord: CellCoord) -> Option<&Cell> {
        let chunk = self.chunks.get(&coord.chunk(self.chunk_side)?)?;
        chunk.cell(coord.local(self.chunk_side)?)
    }

    fn cell_at_mut(&mut self, coord: CellCoord) -> Option<&mut Cell> {
        let chunk = self.chunks.get_mut(&coord.chunk(self.chunk_side)?)?;
        chunk.cell_mut(coord.local(self.chunk_side)?)
    }

    /// Mark the chunk owning `coord` as mutated. Idempotent; coordinates
    /// outside the world are ignored.
    pub fn mark_dirty(&mut self, coord: CellCoord) {
        if let Some(chunk) = coord.chunk(self.chunk_side) {
            if self.chunks.contains_key(&chunk) {
                self.dirty.insert(chunk);
            }
        }
    }

    /// Forget that `chunk` was mutated. Idempotent.
    pub fn clear_dirty(&mut self, chunk: ChunkCoord) {
        self.dirty.remove(&chunk);
    }

    pub fn is_dirty(&self, chunk: ChunkCoord) -> bool {
        self.dirty.contains(&chunk)
    }

    pub fn dirty_chunks(&self) -> &BTreeSet<ChunkCoord> {
        &self.dirty
    }

    /// Replace a cell's terrain. Returns false if the cell does not exist.
    pub fn set_terrain(&mut self, coord: CellCoord, terrain: TileId, passable: bool) -> bool {
        let Some(cell) = self.cell_at_mut(coord) else {
            return false;
        };
        cell.terrain = terrain;
        cell.passable = passable;
        self.mark_dirty(coord);
        true
    }

    /// Add an unplaced entity. Names are unique.
    pub fn spawn_entity(&mut self, name: &str, tile: TileId) -> Result<EntityId, WorldError> {
        if self.names.contains_key(name) {
            return Err(WorldError::DuplicateName(name.to_string()));
        }
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        self.entities.insert(
            id,
            Entity {
                name: name.to_string(),
                tile,
                position: None,
            },
        );
        self.names.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entity_id(&self, name: &str) -> Option<EntityId> {
        self.names.get(name).copied()
    }

    pub fn entities(&self) -> impl Iterator<Item = (&EntityId, &Entity)> {
        self.entities.iter()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Put an entity on `target`.
    ///
    /// Refused when the target is outside the world, impassable, or the
    /// entity's current cell. On success the entity leaves its old cell,
    /// becomes the first occupant of the target, and both chunks are dirty.
    pub fn place_entity(
        &mut self,
        id: EntityId,
        target: CellCoord,
    ) -> Result<Placement, PlacementError> {
        let entity = self
            .entities
            .get(&id)
            .ok_or(PlacementError::UnknownEntity(id))?;
        let from = entity.position;

        let rejection = match self.cell_at(target) {
            None => Some(PlacementError::OutOfBounds(target)),
            Some(cell) if !cell.passable => Some(PlacementError::Impassable(target)),
            Some(_) if from == Some(target) => Some(PlacementError::Unchanged(target)),
            Some(_) => None,
        };
        if let Some(err) = rejection {
            tracing::debug!(entity = %entity.name, ?from, %target, %err, "placement refused");
            return Err(err);
        }

        if let Some(old) = from {
            if let Some(cell) = self.cell_at_mut(old) {
                cell.remove(id);
            }
            self.mark_dirty(old);
        }
        if let Some(cell) = self.cell_at_mut(target) {
            cell.push_front(id);
        }
        self.mark_dirty(target);
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.position = Some(target);
        }

        let placement = match from {
            None => Placement::Spawned { at: target },
            Some(from) => Placement::Moved { from, to: target },
        };
        tracing::debug!(?id, ?placement, "entity placed");
        Ok(placement)
    }

    /// Step a placed entity by `delta` cells.
    pub fn move_entity(&mut self, id: EntityId, delta: IVec3) -> Result<Placement, PlacementError> {
        let from = self
            .entities
            .get(&id)
            .ok_or(PlacementError::UnknownEntity(id))?
            .position
            .ok_or(PlacementError::Unplaced)?;
        self.place_entity(id, from + delta)
    }

    /// Structural check for worlds that did not come from `from_fn`, such as
    /// decoded saves. Every chunk inside the declared size must exist with the
    /// declared side, and the entity table, name index and occupant lists
    /// must agree.
    pub fn check_consistency(&self) -> Result<(), WorldError> {
        let malformed = |msg: String| Err(WorldError::Malformed(msg));
        if self.chunk_side == 0 {
            return malformed("chunk side is zero".into());
        }
        let size = self.size_chunks;
        let expected = size.x as usize * size.y as usize * size.z as usize;
        if expected == 0 || self.chunks.len() != expected {
            return malformed(format!(
                "{} chunks for a {}x{}x{} world",
                self.chunks.len(),
                size.x,
                size.y,
                size.z
            ));
        }
        for (coord, chunk) in &self.chunks {
            let inside = [coord.x, coord.y, coord.z]
                .iter()
                .zip([size.x, size.y, size.z])
                .all(|(c, n)| *c >= 0 && (*c as u32) < n);
            if !inside {
                return malformed(format!("chunk {coord} lies outside the world"));
            }
            if chunk.side() != self.chunk_side || !chunk.is_well_formed() {
                return malformed(format!("chunk {coord} is not {0}x{0} cells", self.chunk_side));
            }
        }
        if self.names.len() != self.entities.len() {
            return malformed("entity name index does not match entity table".into());
        }
        for (id, entity) in &self.entities {
            if self.names.get(&entity.name) != Some(id) {
                return malformed(format!("entity {:?} missing from name index", entity.name));
            }
            if id.0 >= self.next_entity {
                return malformed(format!("entity id {} was never allocated", id.0));
            }
            if let Some(at) = entity.position {
                let listed = self.cell_at(at).is_some_and(|c| c.occupants().contains(id));
                if !listed {
                    return malformed(format!("entity {:?} is not in its cell {at}", entity.name));
                }
            }
        }
        Ok(())
    }

    /// Deterministic hash over chunks and entities, in canonical order.
    /// The dirty set is transient and not included.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&mut h, &self.chunk_side.to_le_bytes());
        for (coord, chunk) in &self.chunks {
            for v in [coord.x, coord.y, coord.z] {
                mix(&mut h, &v.to_le_bytes());
            }
            for (_, cell) in chunk.cells() {
                mix(&mut h, &cell.terrain.0.to_le_bytes());
                mix(&mut h, &[cell.passable as u8]);
                for id in cell.occupants() {
                    mix(&mut h, &id.0.to_le_bytes());
                }
            }
        }
        for (id, entity) in &self.entities {
            mix(&mut h, &id.0.to_le_bytes());
            mix(&mut h, entity.name.as_bytes());
            mix(&mut h, &entity.tile.0.to_le_bytes());
            if let Some(p) = entity.position {
                for v in [p.x, p.y, p.z] {
                    mix(&mut h, &v.to_le_bytes());
                }
            }
        }
        h
    }
}

/// Splitmix64 step, used as a small deterministic terrain RNG.
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
