use crate::cache::Handle;
use crate::geometry::Point;

/// Position of an object that is not placed on the map.
pub const POS_NOT_ON_MAP: i32 = -1;
/// Row width of the implicit coordinate space object positions index into.
pub const OBJECT_GRID_WIDTH: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) u32);

impl ObjectId {
    pub fn raw(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapObject {
    name: String,
    position: i32,
    opacity: u8,
    visual: Handle,
    shift: Point,
}

impl MapObject {
    pub fn new(name: impl Into<String>, position: i32) -> Self {
        Self {
            name: name.into(),
            position,
            opacity: u8::MAX,
            visual: Handle::UNDEFINED,
            shift: Point::ZERO,
        }
    }

    pub fn with_visual(mut self, visual: Handle) -> Self {
        self.visual = visual;
        self
    }

    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_shift(mut self, shift: Point) -> Self {
        self.shift = shift;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn set_position(&mut self, position: i32) {
        self.position = position;
    }

    pub fn is_on_map(&self) -> bool {
        self.position >= 0
    }

    /// Cell of the object in a grid `width` cells wide.
    pub fn grid_point(&self, width: u32) -> Option<Point> {
        if !self.is_on_map() || width == 0 {
            return None;
        }
        let width = width as i32;
        Some(Point::new(self.position % width, self.position / width))
    }

    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: u8) {
        self.opacity = opacity;
    }

    pub fn visual(&self) -> Handle {
        self.visual
    }

    pub fn set_visual(&mut self, visual: Handle) {
        self.visual = visual;
    }

    pub fn shift(&self) -> Point {
        self.shift
    }

    pub fn set_shift(&mut self, shift: Point) {
        self.shift = shift;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_point_splits_linear_position() {
        let object = MapObject::new("barrel", 405);
        assert_eq!(
            object.grid_point(OBJECT_GRID_WIDTH),
            Some(Point::new(5, 2))
        );
        assert_eq!(
            MapObject::new("ghost", POS_NOT_ON_MAP).grid_point(OBJECT_GRID_WIDTH),
            None
        );
    }

    #[test]
    fn new_objects_are_opaque_and_invisible() {
        let object = MapObject::new("crate", 0);
        assert_eq!(object.opacity(), 255);
        assert!(object.visual().is_undefined());
        assert!(object.is_on_map());
    }
}
