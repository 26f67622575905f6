use serde::{Deserialize, Serialize};
use tilescape_common::{EntityId, LocalCoord, TileId};

/// The smallest addressable unit of the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub terrain: TileId,
    pub passable: bool,
    /// Entities standing here. The first one is drawn.
    occupants: Vec<EntityId>,
}

impl Cell {
    pub fn new(terrain: TileId, passable: bool) -> Self {
        Self {
            terrain,
            passable,
            occupants: Vec::new(),
        }
    }

    pub fn occupants(&self) -> &[EntityId] {
        &self.occupants
    }

    /// The occupant that gets drawn over the terrain.
    pub fn top(&self) -> Option<EntityId> {
        self.occupants.first().copied()
    }

    pub(crate) fn push_front(&mut self, id: EntityId) {
        if !self.occupants.contains(&id) {
            self.occupants.insert(0, id);
        }
    }

    pub(crate) fn remove(&mut self, id: EntityId) -> bool {
        let before = self.occupants.len();
        self.occupants.retain(|o| *o != id);
        self.occupants.len() != before
    }
}

/// A `side` x `side` slab of cells on one depth layer, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    side: u32,
    cells: Vec<Cell>,
}

impl Chunk {
    /// Build a chunk, asking `fill` for every local position in row-major order.
    pub fn from_fn(side: u32, mut fill: impl FnMut(LocalCoord) -> Cell) -> Self {
        let mut cells = Vec::with_capacity((side * side) as usize);
        for y in 0..side {
            for x in 0..side {
                cells.push(fill(LocalCoord::new(x, y)));
            }
        }
        Self { side, cells }
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn cell(&self, local: LocalCoord) -> Option<&Cell> {
        self.index(local).map(|i| &self.cells[i])
    }

    pub(crate) fn cell_mut(&mut self, local: LocalCoord) -> Option<&mut Cell> {
        self.index(local).map(|i| &mut self.cells[i])
    }

    /// Cells with their local positions, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (LocalCoord, &Cell)> {
        let side = self.side;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, c)| (LocalCoord::new(i as u32 % side, i as u32 / side), c))
    }

    /// Whether the cell storage holds exactly `side * side` cells.
    pub(crate) fn is_well_formed(&self) -> bool {
        self.side > 0 && self.cells.len() == (self.side as usize).pow(2)
    }

    fn index(&self, local: LocalCoord) -> Option<usize> {
        (local.x < self.side && local.y < self.side)
            .then(|| (local.y * self.side + local.x) as usize)
    }
}
