//! Tile atlases: slicing sprite sheets into tiles and pre-scaling them per zoom.
//!
//! The renderer looks tiles up by [`TileId`] in the [`Tileset`] of the active
//! zoom level, never by file path. Terrain and entity tiles share one id space.

use glam::UVec2;
use image::{RgbaImage, imageops};
use std::collections::BTreeMap;
use std::path::Path;
use tilescape_common::{Rgba, Surface, TileId};

/// Errors from tileset loading.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("sheet of {sheet_w}x{sheet_h} px does not divide into {tile_w}x{tile_h} px tiles")]
    SheetSize {
        sheet_w: u32,
        sheet_h: u32,
        tile_w: u32,
        tile_h: u32,
    },
    #[error("tile size must be positive, got {0}x{1}")]
    ZeroTileSize(u32, u32),
    #[error("tileset has no tiles")]
    Empty,
}

fn check_tile_size(tile_size: UVec2) -> Result<(), AssetError> {
    if tile_size.x == 0 || tile_size.y == 0 {
        return Err(AssetError::ZeroTileSize(tile_size.x, tile_size.y));
    }
    Ok(())
}

/// An ordered set of equally sized tile images indexed by [`TileId`].
#[derive(Debug, Clone, PartialEq)]
pub struct Tileset {
    tile_size: UVec2,
    tiles: Vec<Surface>,
}

impl Tileset {
    /// Build a tileset from already sliced tiles.
    pub fn from_tiles(tiles: Vec<Surface>) -> Result<Self, AssetError> {
        let first = tiles.first().ok_or(AssetError::Empty)?;
        let tile_size = first.size();
        check_tile_size(tile_size)?;
        if let Some(odd) = tiles.iter().find(|t| t.size() != tile_size) {
            return Err(AssetError::SheetSize {
                sheet_w: odd.width(),
                sheet_h: odd.height(),
                tile_w: tile_size.x,
                tile_h: tile_size.y,
            });
        }
        Ok(Self { tile_size, tiles })
    }

    /// Slice a sprite sheet left-to-right, top-to-bottom.
    pub fn from_sheet(sheet: &RgbaImage, tile_size: UVec2) -> Result<Self, AssetError> {
        check_tile_size(tile_size)?;
        let (w, h) = sheet.dimensions();
        if w % tile_size.x != 0 || h % tile_size.y != 0 {
            return Err(AssetError::SheetSize {
                sheet_w: w,
                sheet_h: h,
                tile_w: tile_size.x,
                tile_h: tile_size.y,
            });
        }
        let mut tiles = Vec::new();
        for y in (0..h).step_by(tile_size.y as usize) {
            for x in (0..w).step_by(tile_size.x as usize) {
                let tile = imageops::crop_imm(sheet, x, y, tile_size.x, tile_size.y).to_image();
                tiles.push(Surface::from_image(tile));
            }
        }
        Self::from_tiles(tiles)
    }

    /// Load and slice a PNG sprite sheet.
    pub fn load(path: impl AsRef<Path>, tile_size: UVec2) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let sheet = image::open(path)?.to_rgba8();
        let set = Self::from_sheet(&sheet, tile_size)?;
        tracing::info!(path = %path.display(), tiles = set.len(), "loaded tileset");
        Ok(set)
    }

    /// Solid-color tileset, one tile per color. Fully transparent colors
    /// produce transparent tiles.
    pub fn solid(tile_size: UVec2, colors: &[Rgba]) -> Result<Self, AssetError> {
        Self::from_tiles(
            colors
                .iter()
                .map(|c| Surface::filled(tile_size.x, tile_size.y, *c))
                .collect(),
        )
    }

    /// Built-in palette used when no sprite sheet is supplied.
    ///
    /// 0: void, 1: grass, 2: dirt, 3: player marker, 4: stone.
    /// The player marker is a diamond on a transparent background so the
    /// terrain shows through around it.
    pub fn builtin(tile_size: UVec2) -> Result<Self, AssetError> {
        check_tile_size(tile_size)?;
        let void = Surface::filled(tile_size.x, tile_size.y, [0, 0, 0, 255]);
        let grass = Surface::filled(tile_size.x, tile_size.y, [58, 125, 68, 255]);
        let dirt = Surface::filled(tile_size.x, tile_size.y, [121, 85, 58, 255]);
        let stone = Surface::filled(tile_size.x, tile_size.y, [110, 110, 118, 255]);

        let mut marker = Surface::filled(tile_size.x, tile_size.y, [0, 0, 0, 0]);
        let (cx, cy) = (tile_size.x as i64 / 2, tile_size.y as i64 / 2);
        let r = cx.min(cy);
        for y in 0..tile_size.y {
            for x in 0..tile_size.x {
                if (x as i64 - cx).abs() + (y as i64 - cy).abs() < r {
                    marker.set_pixel(x, y, [235, 200, 40, 255]);
                }
            }
        }

        Ok(Self {
            tile_size,
            tiles: vec![void, grass, dirt, marker, stone],
        })
    }

    /// Size of every tile in pixels.
    pub fn tile_size(&self) -> UVec2 {
        self.tile_size
    }

    /// Tile for `id`, if the set has one.
    pub fn tile(&self, id: TileId) -> Option<&Surface> {
        self.tiles.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Copy of this tileset with every tile scaled by `factor`
    /// (nearest-neighbour, so pixel art stays crisp).
    pub fn scaled(&self, factor: u32) -> Self {
        let size = self.tile_size * factor;
        let tiles = self
            .tiles
            .iter()
            .map(|t| {
                Surface::from_image(imageops::resize(
                    t.as_image(),
                    size.x,
                    size.y,
                    imageops::FilterType::Nearest,
                ))
            })
            .collect();
        Self {
            tile_size: size,
            tiles,
        }
    }
}

/// Pre-scaled tilesets, one per zoom level.
#[derive(Debug, Clone, Default)]
pub struct Atlas {
    sets: BTreeMap<u32, Tileset>,
}

impl Atlas {
    /// Scale `base` once for every zoom level in `zooms`.
    pub fn prescale(base: &Tileset, zooms: &[u32]) -> Self {
        let sets: BTreeMap<u32, Tileset> = zooms
            .iter()
            .filter(|z| **z > 0)
            .map(|z| (*z, base.scaled(*z)))
            .collect();
        tracing::debug!(levels = sets.len(), tiles = base.len(), "prescaled atlas");
        Self { sets }
    }

    pub fn insert(&mut self, zoom: u32, set: Tileset) {
        self.sets.insert(zoom, set);
    }

    pub fn get(&self, zoom: u32) -> Option<&Tileset> {
        self.sets.get(&zoom)
    }

    pub fn zoom_levels(&self) -> impl Iterator<Item = u32> + '_ {
        self.sets.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba as Pixel;

    fn two_tile_sheet() -> RgbaImage {
        let mut sheet = RgbaImage::from_pixel(4, 2, Pixel([255, 0, 0, 255]));
        for y in 0..2 {
            for x in 2..4 {
                sheet.put_pixel(x, y, Pixel([0, 0, 255, 255]));
            }
        }
        sheet
    }

    #[test]
    fn sheet_is_sliced_row_major() {
        let set = Tileset::from_sheet(&two_tile_sheet(), UVec2::new(2, 2)).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.tile(TileId(0)).unwrap().pixel(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(set.tile(TileId(1)).unwrap().pixel(0, 0), Some([0, 0, 255, 255]));
        assert!(set.tile(TileId(2)).is_none());
    }

    #[test]
    fn uneven_sheet_is_rejected() {
        let err = Tileset::from_sheet(&two_tile_sheet(), UVec2::new(3, 2)).unwrap_err();
        assert!(matches!(err, AssetError::SheetSize { tile_w: 3, .. }));
    }

    #[test]
    fn load_reads_png_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tiles.png");
        two_tile_sheet().save(&path).unwrap();
        let set = Tileset::load(&path, UVec2::new(2, 2)).unwrap();
        assert_eq!(set.len(), 2);
        assert!(Tileset::load(tmp.path().join("missing.png"), UVec2::new(2, 2)).is_err());
    }

    #[test]
    fn scaling_is_nearest_neighbour() {
        let set = Tileset::from_sheet(&two_tile_sheet(), UVec2::new(2, 2)).unwrap();
        let big = set.scaled(3);
        assert_eq!(big.tile_size(), UVec2::new(6, 6));
        assert_eq!(big.tile(TileId(1)).unwrap().pixel(5, 5), Some([0, 0, 255, 255]));
    }

    #[test]
    fn atlas_has_one_set_per_zoom() {
        let base = Tileset::builtin(UVec2::new(4, 4)).unwrap();
        let atlas = Atlas::prescale(&base, &[1, 2, 4]);
        assert_eq!(atlas.zoom_levels().collect::<Vec<_>>(), vec![1, 2, 4]);
        assert_eq!(atlas.get(4).unwrap().tile_size(), UVec2::new(16, 16));
        assert!(atlas.get(3).is_none());
    }

    #[test]
    fn builtin_marker_is_transparent_at_corners() {
        let set = Tileset::builtin(UVec2::new(16, 16)).unwrap();
        let marker = set.tile(TileId(3)).unwrap();
        assert_eq!(marker.pixel(0, 0).unwrap()[3], 0);
        assert_eq!(marker.pixel(8, 8).unwrap()[3], 255);
    }

    #[test]
    fn solid_tiles() {
        let set = Tileset::solid(UVec2::new(2, 2), &[[1, 2, 3, 255], [0, 0, 0, 0]]).unwrap();
        assert_eq!(set.tile(TileId(0)).unwrap().pixel(1, 1), Some([1, 2, 3, 255]));
        assert!(Tileset::solid(UVec2::new(2, 2), &[]).is_err());
    }

    #[test]
    fn zero_tile_size_is_rejected() {
        assert!(matches!(
            Tileset::builtin(UVec2::ZERO),
            Err(AssetError::ZeroTileSize(0, 0))
        ));
        assert!(matches!(
            Tileset::builtin(UVec2::new(16, 0)),
            Err(AssetError::ZeroTileSize(16, 0))
        ));
        assert!(matches!(
            Tileset::solid(UVec2::new(0, 2), &[[1, 2, 3, 255]]),
            Err(AssetError::ZeroTileSize(0, 2))
        ));
        assert!(matches!(
            Tileset::from_sheet(&two_tile_sheet(), UVec2::new(0, 2)),
            Err(AssetError::ZeroTileSize(0, 2))
        ));
    }
}
