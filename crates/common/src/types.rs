use glam::IVec3;
use serde::{Deserialize, Serialize};
use std::ops::Add;

/// Stable identifier for an entity in the world's entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Index into a tileset. Terrain and entity tiles share the same id space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub u16);

impl TileId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A cell position in world-cell coordinates.
///
/// Coordinates are signed so that relative moves can step past the world
/// edge; anything negative simply maps to no chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CellCoord {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Owning chunk for a chunk side length of `side` cells.
    ///
    /// Chunks are one layer deep, so the chunk's z is the cell's z.
    /// Returns `None` for negative coordinates.
    pub fn chunk(self, side: u32) -> Option<ChunkCoord> {
        if self.x < 0 || self.y < 0 || self.z < 0 {
            return None;
        }
        let side = side as i32;
        Some(ChunkCoord::new(self.x / side, self.y / side, self.z))
    }

    /// Position of this cell inside its owning chunk.
    pub fn local(self, side: u32) -> Option<LocalCoord> {
        if self.x < 0 || self.y < 0 || self.z < 0 {
            return None;
        }
        let side = side as i32;
        Some(LocalCoord {
            x: (self.x % side) as u32,
            y: (self.y % side) as u32,
        })
    }
}

impl Add<IVec3> for CellCoord {
    type Output = CellCoord;

    fn add(self, delta: IVec3) -> CellCoord {
        CellCoord::new(self.x + delta.x, self.y + delta.y, self.z + delta.z)
    }
}

impl From<IVec3> for CellCoord {
    fn from(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<CellCoord> for IVec3 {
    fn from(c: CellCoord) -> Self {
        IVec3::new(c.x, c.y, c.z)
    }
}

impl std::fmt::Display for CellCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A chunk position: `x`/`y` count chunks, `z` is the depth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// World coordinate of the chunk's first cell.
    pub fn origin(self, side: u32) -> CellCoord {
        let side = side as i32;
        CellCoord::new(self.x * side, self.y * side, self.z)
    }

    /// World coordinate of the cell at `local` inside this chunk.
    pub fn cell(self, side: u32, local: LocalCoord) -> CellCoord {
        let origin = self.origin(side);
        CellCoord::new(origin.x + local.x as i32, origin.y + local.y as i32, origin.z)
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

/// Cell position relative to its chunk's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalCoord {
    pub x: u32,
    pub y: u32,
}

impl LocalCoord {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_and_local_recompose_to_cell() {
        for side in [1u32, 4, 16] {
            for x in 0..40 {
                for y in [0, 3, 17, 33] {
                    let cell = CellCoord::new(x, y, 2);
                    let chunk = cell.chunk(side).unwrap();
                    let local = cell.local(side).unwrap();
                    assert!(local.x < side && local.y < side);
                    assert_eq!(chunk.cell(side, local), cell);
                }
            }
        }
    }

    #[test]
    fn chunk_depth_follows_cell_layer() {
        let c = CellCoord::new(17, 40, 5).chunk(16).unwrap();
        assert_eq!(c, ChunkCoord::new(1, 2, 5));
    }

    #[test]
    fn negative_coordinates_have_no_chunk() {
        assert!(CellCoord::new(-1, 0, 0).chunk(16).is_none());
        assert!(CellCoord::new(0, -16, 0).chunk(16).is_none());
        assert!(CellCoord::new(0, 0, -1).local(16).is_none());
    }

    #[test]
    fn add_delta() {
        let c = CellCoord::new(3, 4, 0) + IVec3::new(-1, 1, 0);
        assert_eq!(c, CellCoord::new(2, 5, 0));
    }
}
