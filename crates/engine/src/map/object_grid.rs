use crate::geometry::{GridGeometry, Point, Rect};

use super::{MapObject, ObjectId, OBJECT_GRID_WIDTH};

/// Draw-ordered list of objects sharing one projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectGrid {
    width: u32,
    height: u32,
    geometry: GridGeometry,
    shift: Point,
    order: Vec<ObjectId>,
}

impl ObjectGrid {
    pub fn new(width: u32, height: u32, geometry: GridGeometry) -> Self {
        Self {
            width,
            height,
            geometry,
            shift: Point::ZERO,
            order: Vec::new(),
        }
    }

    pub fn with_geometry(geometry: GridGeometry) -> Self {
        Self::new(OBJECT_GRID_WIDTH, OBJECT_GRID_WIDTH, geometry)
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

    pub fn order(&self) -> &[ObjectId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub(crate) fn push_back(&mut self, id: ObjectId) {
        self.order.push(id);
    }

    pub(crate) fn push_front(&mut self, id: ObjectId) {
        self.order.insert(0, id);
    }

    /// Inserts before the first object with a greater position, so equal
    /// positions keep insertion order.
    pub(crate) fn insert_by_position(&mut self, id: ObjectId, objects: &[MapObject]) {
        let position = objects[id.index()].position();
        let index = self
            .order
            .iter()
            .position(|other| objects[other.index()].position() > position)
            .unwrap_or(self.order.len());
        self.order.insert(index, id);
    }

    pub(crate) fn remove(&mut self, id: ObjectId) -> bool {
        let before = self.order.len();
        self.order.retain(|other| *other != id);
        before != self.order.len()
    }
}
