use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cache::{CacheConfig, ImageCache};
use crate::config::ViewConfig;
use crate::map::{load_map_file, Map, MapLoadError};
use crate::video::RenderTarget;
use crate::view::{FrameStats, MapView};

/// Everything one viewer session owns: the cache, the active map and the
/// view onto it.
#[derive(Debug)]
pub struct World {
    cache: ImageCache,
    map: Option<Map>,
    view: MapView,
}

impl World {
    pub fn new(asset_root: impl Into<PathBuf>, cache: CacheConfig, view: &ViewConfig) -> Self {
        Self {
            cache: ImageCache::new(asset_root, cache),
            map: None,
            view: MapView::new(view),
        }
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ImageCache {
        &mut self.cache
    }

    pub fn view(&self) -> &MapView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut MapView {
        &mut self.view
    }

    pub fn map(&self) -> Option<&Map> {
        self.map.as_ref()
    }

    pub fn map_mut(&mut self) -> Option<&mut Map> {
        self.map.as_mut()
    }

    /// Loads an XML map, registering its assets in this world's cache, and
    /// makes it the active map.
    pub fn load_map(&mut self, path: &Path) -> Result<(), MapLoadError> {
        let map = load_map_file(path, &mut self.cache)?;
        self.set_map(map);
        Ok(())
    }

    /// Replaces the active map and shows its first elevation. Handles in
    /// `map` must come from this world's cache.
    pub fn set_map(&mut self, map: Map) {
        if self.view.set_elevation(&map, 0).is_err() {
            debug!(map = map.name(), "world_map_has_no_elevations");
        }
        self.map = Some(map);
    }

    pub fn take_map(&mut self) -> Option<Map> {
        self.view.clear_selection();
        self.map.take()
    }

    /// Draws the active map; does nothing without one.
    pub fn render(&mut self, target: &mut dyn RenderTarget) -> FrameStats {
        match &self.map {
            Some(map) => self.view.render(map, &mut self.cache, target),
            None => FrameStats::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{GridGeometry, Point};
    use crate::map::{MapElevation, MapTileGrid, ObjectGrid};
    use crate::test_fixtures::{write_file, write_png, RecordingTarget};
    use tempfile::TempDir;

    fn world(root: &Path) -> World {
        World::new(root, CacheConfig::default(), &ViewConfig::default())
    }

    #[test]
    fn renders_nothing_without_a_map() {
        let temp = TempDir::new().expect("temp");
        let mut world = world(temp.path());
        let mut target = RecordingTarget::new(64, 64);
        assert_eq!(world.render(&mut target), FrameStats::default());
        assert!(target.draws.is_empty());
    }

    #[test]
    fn load_map_registers_assets_and_draws_them() {
        let temp = TempDir::new().expect("temp");
        write_png(temp.path(), "tiles/grass.png", 32, 32, [0, 200, 0, 255]);
        let map_path = write_file(
            temp.path(),
            "maps/field.xml",
            r#"<map name="field"><elevation>
  <floor width="2" height="2"><fill src="tiles/grass.png"/></floor>
</elevation></map>"#,
        );
        let mut world = world(temp.path());
        world.load_map(&map_path).expect("load map");
        assert_eq!(world.map().map(Map::name), Some("field"));

        let mut target = RecordingTarget::new(640, 480);
        let stats = world.render(&mut target);
        assert_eq!(stats.floor_tiles, 4);
        assert_eq!(target.draws_with_color([0, 200, 0, 255]).len(), 4);
        assert_eq!(world.cache().stats().loads, 1);
    }

    #[test]
    fn set_map_resets_elevation_and_take_map_clears_selection() {
        let temp = TempDir::new().expect("temp");
        let mut world = world(temp.path());
        let geometry = GridGeometry::default();
        let mut map = Map::new("two");
        for _ in 0..2 {
            map.add_elevation(MapElevation::new(
                MapTileGrid::new(2, 2, geometry),
                MapTileGrid::new(2, 2, geometry),
                ObjectGrid::with_geometry(geometry),
            ));
        }
        world.set_map(map.clone());
        world.view_mut().set_elevation(&map, 1).expect("elevation 1");
        world.set_map(map.clone());
        assert_eq!(world.view().elevation(), 0);

        world.view_mut().select_tile_at(&map, Point::new(5, 5));
        assert!(world.view().selected_tile().is_some());
        assert!(world.take_map().is_some());
        assert!(world.view().selected_tile().is_none());
        assert!(world.map().is_none());
    }
}
