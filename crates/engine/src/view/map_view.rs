use std::collections::HashMap;

use tracing::debug;

use crate::cache::{Handle, ImageCache};
use crate::config::ViewConfig;
use crate::geometry::{GridGeometry, Point, Rect};
use crate::map::{Map, MapElevation, MapTileGrid};
use crate::video::{RenderTarget, Renderable, StaticImage};

use super::ViewError;

const TILE_GRID_COLOR: [u8; 4] = [96, 96, 96, 255];
const OBJECT_GRID_COLOR: [u8; 4] = [64, 96, 160, 255];
const TILE_CURSOR_COLOR: [u8; 4] = [255, 220, 0, 255];
const OBJECT_CURSOR_COLOR: [u8; 4] = [0, 220, 255, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Floor,
    Objects,
    Roof,
    TileGrid,
    ObjectGrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerVisibility {
    pub floor: bool,
    pub objects: bool,
    pub roof: bool,
    pub tile_grid: bool,
    pub object_grid: bool,
}

impl LayerVisibility {
    pub fn from_config(config: &ViewConfig) -> Self {
        Self {
            floor: config.show_floor,
            objects: config.show_objects,
            roof: config.show_roof,
            tile_grid: config.show_tile_grid,
            object_grid: config.show_object_grid,
        }
    }

    pub fn is_visible(&self, layer: Layer) -> bool {
        match layer {
            Layer::Floor => self.floor,
            Layer::Objects => self.objects,
            Layer::Roof => self.roof,
            Layer::TileGrid => self.tile_grid,
            Layer::ObjectGrid => self.object_grid,
        }
    }

    pub fn set(&mut self, layer: Layer, visible: bool) {
        let flag = match layer {
            Layer::Floor => &mut self.floor,
            Layer::Objects => &mut self.objects,
            Layer::Roof => &mut self.roof,
            Layer::TileGrid => &mut self.tile_grid,
            Layer::ObjectGrid => &mut self.object_grid,
        };
        *flag = visible;
    }
}

impl Default for LayerVisibility {
    fn default() -> Self {
        Self::from_config(&ViewConfig::default())
    }
}

/// What one `render` call drew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub floor_tiles: usize,
    pub roof_tiles: usize,
    pub objects: usize,
    pub overlays: usize,
    /// Enabled layers skipped because their effective alpha was zero.
    pub skipped_layers: usize,
}

impl FrameStats {
    pub fn draw_calls(&self) -> usize {
        self.floor_tiles + self.roof_tiles + self.objects + self.overlays
    }
}

/// Scrollable window onto one elevation of a map.
///
/// Overlay images are registered in the cache passed to the first `render`
/// call; a view should keep drawing through that same cache.
#[derive(Debug)]
pub struct MapView {
    viewport: Rect,
    offset: Point,
    elevation: usize,
    visibility: LayerVisibility,
    roof_alpha: u8,
    roof_shift: Point,
    cull_padding: i32,
    selected_tile: Option<Point>,
    selected_object: Option<Point>,
    overlays: HashMap<(u32, u32, [u8; 4]), Handle>,
}

impl MapView {
    pub fn new(config: &ViewConfig) -> Self {
        Self {
            viewport: Rect::new(
                config.viewport_x,
                config.viewport_y,
                config.viewport_width as i32,
                config.viewport_height as i32,
            ),
            offset: Point::ZERO,
            elevation: 0,
            visibility: LayerVisibility::from_config(config),
            roof_alpha: config.roof_alpha,
            roof_shift: config.roof_shift,
            cull_padding: config.cull_padding_px as i32,
            selected_tile: None,
            selected_object: None,
            overlays: HashMap::new(),
        }
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    /// Map pixel shown at the viewport's top-left corner.
    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Point) {
        self.offset = offset;
    }

    pub fn scroll_by(&mut self, delta: Point) {
        self.offset += delta;
    }

    pub fn elevation(&self) -> usize {
        self.elevation
    }

    pub fn set_elevation(&mut self, map: &Map, index: usize) -> Result<(), ViewError> {
        if index >= map.elevation_count() {
            return Err(ViewError::UnknownElevation {
                index,
                count: map.elevation_count(),
            });
        }
        self.elevation = index;
        self.clear_selection();
        Ok(())
    }

    pub fn visibility(&self) -> LayerVisibility {
        self.visibility
    }

    pub fn is_layer_visible(&self, layer: Layer) -> bool {
        self.visibility.is_visible(layer)
    }

    pub fn set_layer_visible(&mut self, layer: Layer, visible: bool) {
        self.visibility.set(layer, visible);
    }

    pub fn roof_alpha(&self) -> u8 {
        self.roof_alpha
    }

    /// Scales the roof grid's own alpha; 0 hides the roof.
    pub fn set_roof_alpha(&mut self, alpha: u8) {
        self.roof_alpha = alpha;
    }

    pub fn roof_shift(&self) -> Point {
        self.roof_shift
    }

    pub fn set_roof_shift(&mut self, shift: Point) {
        self.roof_shift = shift;
    }

    pub fn selected_tile(&self) -> Option<Point> {
        self.selected_tile
    }

    pub fn selected_object(&self) -> Option<Point> {
        self.selected_object
    }

    pub fn clear_selection(&mut self) {
        self.selected_tile = None;
        self.selected_object = None;
    }

    /// Selects the floor cell under the screen point `screen`.
    pub fn select_tile_at(&mut self, map: &Map, screen: Point) -> Option<Point> {
        self.selected_tile = map.elevation(self.elevation).and_then(|elevation| {
            let floor = elevation.floor();
            self.pick(floor.geometry(), floor.shift(), floor.bounds(), screen)
        });
        self.selected_tile
    }

    /// Selects the cell of the first object grid under `screen`.
    pub fn select_object_at(&mut self, map: &Map, screen: Point) -> Option<Point> {
        self.selected_object = map
            .elevation(self.elevation)
            .and_then(|elevation| elevation.object_grid(0))
            .and_then(|grid| self.pick(grid.geometry(), grid.shift(), grid.bounds(), screen));
        self.selected_object
    }

    /// Draws the current elevation: floor, grid overlays, cursors, objects,
    /// then roof. Bad handles draw the cache placeholder and never stop the
    /// frame.
    pub fn render(
        &mut self,
        map: &Map,
        cache: &mut ImageCache,
        target: &mut dyn RenderTarget,
    ) -> FrameStats {
        let mut stats = FrameStats::default();
        let Some(elevation) = map.elevation(self.elevation) else {
            debug!(
                elevation = self.elevation,
                count = map.elevation_count(),
                "view_elevation_missing"
            );
            return stats;
        };

        target.set_clip(Some(self.viewport));

        if self.visibility.floor {
            let floor = elevation.floor();
            match floor.global_alpha() {
                0 => stats.skipped_layers += 1,
                alpha => {
                    stats.floor_tiles =
                        self.draw_tile_grid(floor, alpha, Point::ZERO, cache, target)
                }
            }
        }

        if self.visibility.tile_grid {
            let floor = elevation.floor();
            stats.overlays += self.draw_grid_lines(
                floor.geometry(),
                floor.shift(),
                floor.bounds(),
                TILE_GRID_COLOR,
                cache,
                target,
            );
        }
        if self.visibility.object_grid {
            if let Some(grid) = elevation.object_grid(0) {
                stats.overlays += self.draw_grid_lines(
                    grid.geometry(),
                    grid.shift(),
                    grid.bounds(),
                    OBJECT_GRID_COLOR,
                    cache,
                    target,
                );
            }
        }
        stats.overlays += self.draw_cursors(elevation, cache, target);

        if self.visibility.objects {
            stats.objects = self.draw_objects(elevation, cache, target);
        }

        if self.visibility.roof {
            let roof = elevation.roof();
            match scale_alpha(roof.global_alpha(), self.roof_alpha) {
                0 => stats.skipped_layers += 1,
                alpha => {
                    stats.roof_tiles =
                        self.draw_tile_grid(roof, alpha, self.roof_shift, cache, target)
                }
            }
        }

        target.set_clip(None);
        stats
    }

    fn draw_tile_grid(
        &self,
        grid: &MapTileGrid,
        alpha: u8,
        extra_shift: Point,
        cache: &mut ImageCache,
        target: &mut dyn RenderTarget,
    ) -> usize {
        let geometry = grid.geometry();
        let shift = grid.shift() + extra_shift;
        let Some(cells) = self.visible_cells(geometry, shift, grid.bounds()) else {
            return 0;
        };

        let mut drawn = 0;
        for y in cells.y..cells.bottom() {
            for x in cells.x..cells.right() {
                let handle = grid.tile_at(x, y);
                if handle.is_undefined() {
                    continue;
                }
                let position = self.cell_origin(geometry, shift, Point::new(x, y));
                if cache.draw(handle, position, target, alpha) {
                    drawn += 1;
                }
            }
        }
        drawn
    }

    fn draw_objects(
        &self,
        elevation: &MapElevation,
        cache: &mut ImageCache,
        target: &mut dyn RenderTarget,
    ) -> usize {
        let screen = self.viewport.expanded(self.cull_padding);
        let mut drawn = 0;
        for (index, grid) in elevation.object_grids().iter().enumerate() {
            for (_, object) in elevation.objects_in_draw_order(index) {
                let visual = object.visual();
                if visual.is_undefined() || object.opacity() == 0 {
                    continue;
                }
                let Some(cell) = object.grid_point(grid.width()) else {
                    continue;
                };
                let position =
                    self.cell_origin(grid.geometry(), grid.shift(), cell) + object.shift();
                if !cache.frame_rect(visual, position).intersects(&screen) {
                    continue;
                }
                if cache.draw(visual, position, target, object.opacity()) {
                    drawn += 1;
                }
            }
        }
        drawn
    }

    fn draw_grid_lines(
        &mut self,
        geometry: &GridGeometry,
        shift: Point,
        bounds: Rect,
        color: [u8; 4],
        cache: &mut ImageCache,
        target: &mut dyn RenderTarget,
    ) -> usize {
        let Some(cells) = self.visible_cells(geometry, shift, bounds) else {
            return 0;
        };
        let (width, height) = geometry.base_size();
        let Some(handle) = self.overlay_handle(cache, width, height, color) else {
            return 0;
        };

        let mut drawn = 0;
        for y in cells.y..cells.bottom() {
            for x in cells.x..cells.right() {
                let position = self.cell_origin(geometry, shift, Point::new(x, y));
                if cache.draw(handle, position, target, u8::MAX) {
                    drawn += 1;
                }
            }
        }
        drawn
    }

    fn draw_cursors(
        &mut self,
        elevation: &MapElevation,
        cache: &mut ImageCache,
        target: &mut dyn RenderTarget,
    ) -> usize {
        let mut drawn = 0;
        if let Some(cell) = self.selected_tile {
            let floor = elevation.floor();
            drawn += self.draw_cell_outline(
                floor.geometry(),
                floor.shift(),
                cell,
                TILE_CURSOR_COLOR,
                cache,
                target,
            );
        }
        if let (Some(cell), Some(grid)) = (self.selected_object, elevation.object_grid(0)) {
            drawn += self.draw_cell_outline(
                grid.geometry(),
                grid.shift(),
                cell,
                OBJECT_CURSOR_COLOR,
                cache,
                target,
            );
        }
        drawn
    }

    fn draw_cell_outline(
        &mut self,
        geometry: &GridGeometry,
        shift: Point,
        cell: Point,
        color: [u8; 4],
        cache: &mut ImageCache,
        target: &mut dyn RenderTarget,
    ) -> usize {
        let (width, height) = geometry.base_size();
        let Some(handle) = self.overlay_handle(cache, width, height, color) else {
            return 0;
        };
        let position = self.cell_origin(geometry, shift, cell);
        usize::from(cache.draw(handle, position, target, u8::MAX))
    }

    fn overlay_handle(
        &mut self,
        cache: &mut ImageCache,
        width: u32,
        height: u32,
        color: [u8; 4],
    ) -> Option<Handle> {
        let key = (width, height, color);
        if let Some(handle) = self.overlays.get(&key) {
            return Some(*handle);
        }
        let outline = Renderable::Image(StaticImage::outline(width, height, color));
        match cache.add_image(outline) {
            Ok(handle) => {
                self.overlays.insert(key, handle);
                Some(handle)
            }
            Err(error) => {
                debug!(width, height, error = %error, "view_overlay_unavailable");
                None
            }
        }
    }

    /// Cells of a grid that can touch the viewport, clamped to `bounds`.
    fn visible_cells(&self, geometry: &GridGeometry, shift: Point, bounds: Rect) -> Option<Rect> {
        let window = Rect::new(
            self.offset.x - shift.x,
            self.offset.y - shift.y,
            self.viewport.w,
            self.viewport.h,
        )
        .expanded(self.cull_padding);
        geometry.grid_bounding_rect(window).intersection(&bounds)
    }

    /// Screen position of the top-left of `cell`'s footprint.
    fn cell_origin(&self, geometry: &GridGeometry, shift: Point, cell: Point) -> Point {
        geometry.to_screen(cell) + geometry.cell_anchor() + shift - self.offset
            + self.viewport.origin()
    }

    fn pick(
        &self,
        geometry: &GridGeometry,
        shift: Point,
        bounds: Rect,
        screen: Point,
    ) -> Option<Point> {
        if !self.viewport.contains(screen) {
            return None;
        }
        let local = screen - self.viewport.origin() + self.offset - shift;
        let cell = geometry.from_screen(local);
        bounds.contains(cell).then_some(cell)
    }
}

fn scale_alpha(alpha: u8, factor: u8) -> u8 {
    (alpha as u32 * factor as u32 / u8::MAX as u32) as u8
}
