use crate::cache::Handle;
use crate::geometry::{GridGeometry, Point, Rect};

use super::GridError;

/// Fixed-size layer of tile handles drawn with one alpha for the whole grid.
#[derive(Debug, Clone, PartialEq)]
pub struct MapTileGrid {
    width: u32,
    height: u32,
    geometry: GridGeometry,
    shift: Point,
    tiles: Vec<Handle>,
    global_alpha: u8,
}

impl MapTileGrid {
    pub fn new(width: u32, height: u32, geometry: GridGeometry) -> Self {
        Self {
            width,
            height,
            geometry,
            shift: Point::ZERO,
            tiles: vec![Handle::UNDEFINED; width as usize * height as usize],
            global_alpha: u8::MAX,
        }
    }

    pub fn from_tiles(
        width: u32,
        height: u32,
        geometry: GridGeometry,
        tiles: Vec<Handle>,
    ) -> Result<Self, GridError> {
        let expected = width as usize * height as usize;
        let actual = tiles.len();
        if expected != actual {
            return Err(GridError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            geometry,
            shift: Point::ZERO,
            tiles,
            global_alpha: u8::MAX,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn shift(&self) -> Point {
        self.shift
    }

    pub fn set_shift(&mut self, shift: Point) {
        self.shift = shift;
    }

    pub fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Handle at a cell; out-of-range cells read as undefined.
    pub fn tile_at(&self, x: i32, y: i32) -> Handle {
        self.index_of(x, y)
            .and_then(|index| self.tiles.get(index).copied())
            .unwrap_or(Handle::UNDEFINED)
    }

    pub fn set_tile(&mut self, x: i32, y: i32, handle: Handle) -> Result<(), GridError> {
        let index = self.index_of(x, y).ok_or(GridError::CellOutOfRange {
            x,
            y,
            width: self.width,
            height: self.height,
        })?;
        self.tiles[index] = handle;
        Ok(())
    }

    pub fn fill(&mut self, handle: Handle) {
        self.tiles.fill(handle);
    }

    pub fn tiles(&self) -> &[Handle] {
        &self.tiles
    }

    pub fn has_tiles(&self) -> bool {
        self.tiles.iter().any(|handle| !handle.is_undefined())
    }

    pub fn global_alpha(&self) -> u8 {
        self.global_alpha
    }

    pub fn set_global_alpha(&mut self, alpha: i32) {
        self.global_alpha = alpha.clamp(0, u8::MAX as i32) as u8;
    }

    pub fn add_to_global_alpha(&mut self, delta: i32) {
        self.set_global_alpha(self.global_alpha as i32 + delta);
    }
}
