use serde::{Deserialize, Serialize};

use super::{Point, Rect};

pub const DEFAULT_RECT_CELL_SIZE_PX: u32 = 32;
pub const DEFAULT_HEX_CELL_WIDTH_PX: u32 = 32;
pub const DEFAULT_HEX_CELL_HEIGHT_PX: u32 = 16;
pub const DEFAULT_HEX_ROW_HEIGHT_PX: u32 = 12;
pub const DEFAULT_ISO_CELL_WIDTH_PX: u32 = 80;
pub const DEFAULT_ISO_CELL_HEIGHT_PX: u32 = 36;

/// Projection between grid cells and screen pixels.
///
/// `to_screen` yields the cell's anchor point; the cell's footprint starts at
/// `to_screen(cell) + cell_anchor()` and spans `base_size()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GridGeometry {
    Rectangular {
        cell_width: u32,
        cell_height: u32,
    },
    /// Rows are `row_height` apart and odd rows shift right by half a cell.
    Hex {
        cell_width: u32,
        cell_height: u32,
        row_height: u32,
    },
    /// Diamond cells: +x runs down-right, +y runs down-left.
    Isometric { cell_width: u32, cell_height: u32 },
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self::rectangular(DEFAULT_RECT_CELL_SIZE_PX, DEFAULT_RECT_CELL_SIZE_PX)
    }
}

impl GridGeometry {
    pub fn rectangular(cell_width: u32, cell_height: u32) -> Self {
        Self::Rectangular {
            cell_width,
            cell_height,
        }
    }

    pub fn hex(cell_width: u32, cell_height: u32, row_height: u32) -> Self {
        Self::Hex {
            cell_width,
            cell_height,
            row_height,
        }
    }

    pub fn isometric(cell_width: u32, cell_height: u32) -> Self {
        Self::Isometric {
            cell_width,
            cell_height,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Rectangular { .. } => "rectangular",
            Self::Hex { .. } => "hex",
            Self::Isometric { .. } => "isometric",
        }
    }

    pub fn base_size(&self) -> (u32, u32) {
        match *self {
            Self::Rectangular {
                cell_width,
                cell_height,
            }
            | Self::Hex {
                cell_width,
                cell_height,
                ..
            }
            | Self::Isometric {
                cell_width,
                cell_height,
            } => (cell_width, cell_height),
        }
    }

    pub fn cell_anchor(&self) -> Point {
        match *self {
            Self::Isometric { cell_width, .. } => Point::new(-half(cell_width), 0),
            _ => Point::ZERO,
        }
    }

    pub fn to_screen(&self, cell: Point) -> Point {
        match *self {
            Self::Rectangular {
                cell_width,
                cell_height,
            } => Point::new(cell.x * dim(cell_width), cell.y * dim(cell_height)),
            Self::Hex {
                cell_width,
                row_height,
                ..
            } => {
                let w = dim(cell_width);
                Point::new(
                    cell.x * w + odd_row_offset(cell.y, w),
                    cell.y * dim(row_height),
                )
            }
            Self::Isometric {
                cell_width,
                cell_height,
            } => {
                let hw = half(cell_width);
                let hh = half(cell_height);
                Point::new((cell.x - cell.y) * hw, (cell.x + cell.y) * hh)
            }
        }
    }

    pub fn from_screen(&self, screen: Point) -> Point {
        match *self {
            Self::Rectangular {
                cell_width,
                cell_height,
            } => Point::new(
                screen.x.div_euclid(dim(cell_width)),
                screen.y.div_euclid(dim(cell_height)),
            ),
            Self::Hex {
                cell_width,
                row_height,
                ..
            } => {
                let w = dim(cell_width);
                let row = screen.y.div_euclid(dim(row_height));
                let column = (screen.x - odd_row_offset(row, w)).div_euclid(w);
                Point::new(column, row)
            }
            Self::Isometric {
                cell_width,
                cell_height,
            } => {
                let hw = half(cell_width) as i64;
                let hh = half(cell_height) as i64;
                let denom = 2 * hw * hh;
                let a = screen.x as i64 * hh;
                let b = screen.y as i64 * hw;
                Point::new(
                    (a + b).div_euclid(denom) as i32,
                    (b - a).div_euclid(denom) as i32,
                )
            }
        }
    }

    /// Screen rectangle covering the footprints of every cell in `cells`.
    pub fn screen_bounding_rect(&self, cells: Rect) -> Rect {
        if cells.is_empty() {
            let origin = self.to_screen(cells.origin());
            return Rect::new(origin.x, origin.y, 0, 0);
        }

        let (w, h) = self.base_size();
        let anchor = self.cell_anchor();
        let last_x = cells.right() - 1;
        let last_y = cells.bottom() - 1;
        let corners = [
            Point::new(cells.x, cells.y),
            Point::new(last_x, cells.y),
            Point::new(cells.x, last_y),
            Point::new(last_x, last_y),
        ];

        let mut min = Point::new(i32::MAX, i32::MAX);
        let mut max = Point::new(i32::MIN, i32::MIN);
        for corner in corners {
            let top_left = self.to_screen(corner) + anchor;
            min.x = min.x.min(top_left.x);
            min.y = min.y.min(top_left.y);
            max.x = max.x.max(top_left.x + w as i32);
            max.y = max.y.max(top_left.y + h as i32);
        }

        let slack = match *self {
            Self::Hex { cell_width, .. } => dim(cell_width) / 2,
            _ => 0,
        };
        Rect::new(
            min.x - slack,
            min.y,
            max.x - min.x + slack * 2,
            max.y - min.y,
        )
    }

    /// Grid rectangle holding every cell whose footprint touches `screen`.
    /// Over-approximates by at least one cell on each side.
    pub fn grid_bounding_rect(&self, screen: Rect) -> Rect {
        if screen.is_empty() {
            let origin = self.from_screen(screen.origin());
            return Rect::new(origin.x, origin.y, 0, 0);
        }

        let (w, h) = self.base_size();
        let anchor = self.cell_anchor();
        let left = screen.x - anchor.x - w as i32;
        let top = screen.y - anchor.y - h as i32;
        let right = screen.right() - anchor.x;
        let bottom = screen.bottom() - anchor.y;
        let corners = [
            Point::new(left, top),
            Point::new(right, top),
            Point::new(left, bottom),
            Point::new(right, bottom),
        ];

        let mut min = Point::new(i32::MAX, i32::MAX);
        let mut max = Point::new(i32::MIN, i32::MIN);
        for corner in corners {
            let cell = self.from_screen(corner);
            min.x = min.x.min(cell.x);
            min.y = min.y.min(cell.y);
            max.x = max.x.max(cell.x);
            max.y = max.y.max(cell.y);
        }

        Rect::new(min.x - 1, min.y - 1, max.x - min.x + 3, max.y - min.y + 3)
    }
}

fn dim(value: u32) -> i32 {
    value.max(1) as i32
}

fn half(value: u32) -> i32 {
    (value / 2).max(1) as i32
}

fn odd_row_offset(row: i32, cell_width: i32) -> i32 {
    if row.rem_euclid(2) == 1 {
        cell_width / 2
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometries() -> [GridGeometry; 4] {
        [
            GridGeometry::rectangular(32, 32),
            GridGeometry::rectangular(20, 12),
            GridGeometry::hex(32, 16, 12),
            GridGeometry::isometric(80, 36),
        ]
    }

    fn footprint(geometry: &GridGeometry, cell: Point) -> Rect {
        let (w, h) = geometry.base_size();
        Rect::from_origin_size(geometry.to_screen(cell) + geometry.cell_anchor(), w, h)
    }

    #[test]
    fn from_screen_inverts_to_screen_on_grid_points() {
        for geometry in geometries() {
            for y in -4..40 {
                for x in -4..40 {
                    let cell = Point::new(x, y);
                    assert_eq!(
                        geometry.from_screen(geometry.to_screen(cell)),
                        cell,
                        "geometry={geometry:?} cell={cell}"
                    );
                }
            }
        }
    }

    #[test]
    fn rectangular_projection_matches_cell_size() {
        let geometry = GridGeometry::rectangular(20, 12);
        assert_eq!(geometry.to_screen(Point::new(3, 2)), Point::new(60, 24));
        assert_eq!(geometry.from_screen(Point::new(79, 35)), Point::new(3, 2));
        assert_eq!(geometry.from_screen(Point::new(-1, -1)), Point::new(-1, -1));
    }

    #[test]
    fn hex_odd_rows_shift_by_half_cell() {
        let geometry = GridGeometry::hex(32, 16, 12);
        assert_eq!(geometry.to_screen(Point::new(0, 0)), Point::new(0, 0));
        assert_eq!(geometry.to_screen(Point::new(0, 1)), Point::new(16, 12));
        assert_eq!(geometry.to_screen(Point::new(2, 3)), Point::new(80, 36));
        assert_eq!(geometry.from_screen(Point::new(17, 13)), Point::new(0, 1));
        assert_eq!(geometry.from_screen(Point::new(15, 13)), Point::new(-1, 1));
    }

    #[test]
    fn isometric_axes_run_diagonally() {
        let geometry = GridGeometry::isometric(80, 36);
        assert_eq!(geometry.to_screen(Point::new(1, 0)), Point::new(40, 18));
        assert_eq!(geometry.to_screen(Point::new(0, 1)), Point::new(-40, 18));
        assert_eq!(geometry.cell_anchor(), Point::new(-40, 0));
        // centre of the diamond anchored at the origin
        assert_eq!(geometry.from_screen(Point::new(0, 18)), Point::new(0, 0));
    }

    #[test]
    fn grid_bounding_rect_never_misses_a_visible_cell() {
        let screens = [
            Rect::new(0, 0, 320, 240),
            Rect::new(-57, 33, 101, 77),
            Rect::new(400, -120, 64, 500),
        ];
        for geometry in geometries() {
            for screen in screens {
                let cells = geometry.grid_bounding_rect(screen);
                for y in -60..60 {
                    for x in -60..60 {
                        let cell = Point::new(x, y);
                        if footprint(&geometry, cell).intersects(&screen) {
                            assert!(
                                cells.contains(cell),
                                "geometry={geometry:?} screen={screen} cell={cell} cells={cells}"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn screen_bounding_rect_covers_every_footprint() {
        let cells = Rect::new(-2, 1, 7, 5);
        for geometry in geometries() {
            let bounds = geometry.screen_bounding_rect(cells);
            for y in cells.y..cells.bottom() {
                for x in cells.x..cells.right() {
                    let rect = footprint(&geometry, Point::new(x, y));
                    assert_eq!(
                        rect.intersection(&bounds),
                        Some(rect),
                        "geometry={geometry:?} cell=({x}, {y}) bounds={bounds}"
                    );
                }
            }
        }
    }

    #[test]
    fn empty_rects_map_to_empty_rects() {
        let geometry = GridGeometry::default();
        assert!(geometry.grid_bounding_rect(Rect::new(5, 5, 0, 10)).is_empty());
        assert!(geometry.screen_bounding_rect(Rect::new(1, 1, 3, 0)).is_empty());
    }

    #[test]
    fn geometry_deserializes_from_tagged_json() {
        let geometry: GridGeometry =
            serde_json::from_str(r#"{"kind":"hex","cell_width":32,"cell_height":16,"row_height":12}"#)
                .expect("parse geometry");
        assert_eq!(geometry, GridGeometry::hex(32, 16, 12));
    }
}
