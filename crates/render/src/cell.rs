use tilescape_assets::Tileset;
use tilescape_common::{CellCoord, Surface, TileId};
use tilescape_kernel::World;

/// Renders single cells: terrain tile with the top occupant drawn over it.
///
/// Pure function of the current cell state and the tileset; nothing is
/// cached at this level.
pub struct CellRenderer<'a> {
    world: &'a World,
    tiles: &'a Tileset,
}

impl<'a> CellRenderer<'a> {
    pub fn new(world: &'a World, tiles: &'a Tileset) -> Self {
        Self { world, tiles }
    }

    /// Render the cell at `coord`, or `None` if it is outside the world.
    ///
    /// # Panics
    /// If the cell or its top occupant references a tile the tileset lacks.
    pub fn render_cell(&self, coord: CellCoord) -> Option<Surface> {
        let cell = self.world.cell_at(coord)?;
        let mut surface = self.tile(cell.terrain).clone();
        if let Some(entity) = cell.top().and_then(|id| self.world.entity(id)) {
            surface.overlay(self.tile(entity.tile), 0, 0);
        }
        Some(surface)
    }

    fn tile(&self, id: TileId) -> &Surface {
        self.tiles.tile(id).unwrap_or_else(|| {
            panic!(
                "tile {} missing from tileset with {} tiles",
                id.0,
                self.tiles.len()
            )
        })
    }
}
