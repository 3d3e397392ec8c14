mod elevation;
mod loader;
mod object;
mod object_grid;
mod tile_grid;

use thiserror::Error;

pub use elevation::{Map, MapElevation};
pub use loader::{load_map_file, parse_map_xml, MapErrorCode, MapLoadError, SourceLocation};
pub use object::{MapObject, ObjectId, OBJECT_GRID_WIDTH, POS_NOT_ON_MAP};
pub use object_grid::ObjectGrid;
pub use tile_grid::MapTileGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("cell ({x}, {y}) is outside a {width}x{height} grid")]
    CellOutOfRange {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    #[error("object grid {index} does not exist")]
    UnknownObjectGrid { index: usize },
}
