use super::{GridError, MapObject, MapTileGrid, ObjectGrid, ObjectId};

/// One map level: floor and roof tiles plus the objects between them.
/// Owns every object placed on it.
#[derive(Debug, Clone, PartialEq)]
pub struct MapElevation {
    floor: MapTileGrid,
    roof: MapTileGrid,
    object_grids: Vec<ObjectGrid>,
    objects: Vec<MapObject>,
}

impl MapElevation {
    pub fn new(floor: MapTileGrid, roof: MapTileGrid, object_grid: ObjectGrid) -> Self {
        Self {
            floor,
            roof,
            object_grids: vec![object_grid],
            objects: Vec::new(),
        }
    }

    pub fn floor(&self) -> &MapTileGrid {
        &self.floor
    }

    pub fn floor_mut(&mut self) -> &mut MapTileGrid {
        &mut self.floor
    }

    pub fn roof(&self) -> &MapTileGrid {
        &self.roof
    }

    pub fn roof_mut(&mut self) -> &mut MapTileGrid {
        &mut self.roof
    }

    pub fn object_grids(&self) -> &[ObjectGrid] {
        &self.object_grids
    }

    pub fn object_grid(&self, index: usize) -> Option<&ObjectGrid> {
        self.object_grids.get(index)
    }

    pub fn object_grid_mut(&mut self, index: usize) -> Option<&mut ObjectGrid> {
        self.object_grids.get_mut(index)
    }

    pub fn add_object_grid(&mut self, grid: ObjectGrid) -> usize {
        self.object_grids.push(grid);
        self.object_grids.len() - 1
    }

    /// Adds to the first object grid. With `check_drawing_order` the object is
    /// inserted by position, otherwise appended.
    pub fn add_object(&mut self, object: MapObject, check_drawing_order: bool) -> ObjectId {
        let id = self.push_object(object);
        // Grid 0 exists from construction and grids are never removed.
        let target = &mut self.object_grids[0];
        if check_drawing_order {
            target.insert_by_position(id, &self.objects);
        } else {
            target.push_back(id);
        }
        id
    }

    pub fn add_object_to(
        &mut self,
        grid: usize,
        object: MapObject,
        check_drawing_order: bool,
    ) -> Result<ObjectId, GridError> {
        if grid >= self.object_grids.len() {
            return Err(GridError::UnknownObjectGrid { index: grid });
        }
        let id = self.push_object(object);
        let target = &mut self.object_grids[grid];
        if check_drawing_order {
            target.insert_by_position(id, &self.objects);
        } else {
            target.push_back(id);
        }
        Ok(id)
    }

    /// Adds to the front of the first object grid so it is drawn first.
    pub fn add_object_front(&mut self, object: MapObject) -> ObjectId {
        let id = self.push_object(object);
        self.object_grids[0].push_front(id);
        id
    }

    pub fn add_object_front_to(
        &mut self,
        grid: usize,
        object: MapObject,
    ) -> Result<ObjectId, GridError> {
        if grid >= self.object_grids.len() {
            return Err(GridError::UnknownObjectGrid { index: grid });
        }
        let id = self.push_object(object);
        self.object_grids[grid].push_front(id);
        Ok(id)
    }

    pub fn remove_object_from_grids(&mut self, id: ObjectId) -> bool {
        let mut removed = false;
        for grid in &mut self.object_grids {
            removed |= grid.remove(id);
        }
        removed
    }

    pub fn object(&self, id: ObjectId) -> Option<&MapObject> {
        self.objects.get(id.index())
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut MapObject> {
        self.objects.get_mut(id.index())
    }

    pub fn objects(&self) -> &[MapObject] {
        &self.objects
    }

    /// Objects of one grid in the order they are drawn.
    pub fn objects_in_draw_order(
        &self,
        grid: usize,
    ) -> impl Iterator<Item = (ObjectId, &MapObject)> + '_ {
        self.object_grids
            .get(grid)
            .map(ObjectGrid::order)
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.objects.get(id.index()).map(|object| (*id, object)))
    }

    fn push_object(&mut self, object: MapObject) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(object);
        id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Map {
    name: String,
    elevations: Vec<MapElevation>,
}

impl Map {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elevations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_elevation(&mut self, elevation: MapElevation) -> usize {
        self.elevations.push(elevation);
        self.elevations.len() - 1
    }

    pub fn elevation(&self, index: usize) -> Option<&MapElevation> {
        self.elevations.get(index)
    }

    pub fn elevation_mut(&mut self, index: usize) -> Option<&mut MapElevation> {
        self.elevations.get_mut(index)
    }

    pub fn elevation_count(&self) -> usize {
        self.elevations.len()
    }

    pub fn elevations(&self) -> &[MapElevation] {
        &self.elevations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Handle;
    use crate::geometry::GridGeometry;

    fn elevation() -> MapElevation {
        MapElevation::new(
            MapTileGrid::new(4, 4, GridGeometry::default()),
            MapTileGrid::new(4, 4, GridGeometry::default()),
            ObjectGrid::with_geometry(GridGeometry::hex(32, 16, 12)),
        )
    }

    fn positions(elevation: &MapElevation) -> Vec<i32> {
        elevation
            .objects_in_draw_order(0)
            .map(|(_, object)| object.position())
            .collect()
    }

    fn names(elevation: &MapElevation) -> Vec<&str> {
        elevation
            .objects_in_draw_order(0)
            .map(|(_, object)| object.name())
            .collect()
    }

    #[test]
    fn ordered_insert_sorts_by_position() {
        let mut elevation = elevation();
        for position in [410, 5, 205, 5, 900, 0] {
            elevation.add_object(MapObject::new("obj", position), true);
        }
        assert_eq!(positions(&elevation), vec![0, 5, 5, 205, 410, 900]);
    }

    #[test]
    fn equal_positions_keep_insertion_order() {
        let mut elevation = elevation();
        elevation.add_object(MapObject::new("first", 42), true);
        elevation.add_object(MapObject::new("second", 42), true);
        assert_eq!(names(&elevation), vec!["first", "second"]);
    }

    #[test]
    fn unordered_insert_appends_and_front_insert_prepends() {
        let mut elevation = elevation();
        elevation.add_object(MapObject::new("a", 300), false);
        elevation.add_object(MapObject::new("b", 100), false);
        elevation.add_object_front(MapObject::new("c", 500));
        assert_eq!(names(&elevation), vec!["c", "a", "b"]);
    }

    #[test]
    fn unknown_object_grid_is_an_error() {
        let mut elevation = elevation();
        assert_eq!(
            elevation.add_object_to(3, MapObject::new("x", 1), false),
            Err(GridError::UnknownObjectGrid { index: 3 })
        );
        assert!(elevation.objects().is_empty());
    }

    #[test]
    fn objects_are_addressed_by_id() {
        let mut elevation = elevation();
        let id = elevation.add_object(MapObject::new("door", 7), true);
        elevation
            .object_mut(id)
            .expect("door")
            .set_visual(Handle::from_raw(3));
        assert_eq!(
            elevation.object(id).map(MapObject::visual),
            Some(Handle::from_raw(3))
        );
        assert!(elevation.remove_object_from_grids(id));
        assert_eq!(elevation.objects_in_draw_order(0).count(), 0);
    }

    #[test]
    fn map_holds_elevations_in_order() {
        let mut map = Map::new("demo");
        assert_eq!(map.add_elevation(elevation()), 0);
        assert_eq!(map.add_elevation(elevation()), 1);
        assert_eq!(map.elevation_count(), 2);
        assert!(map.elevation(2).is_none());
    }
}
