use std::time::{Duration, Instant};

use crate::video::RenderTarget;
use crate::view::FrameStats;

use super::World;

/// Ticks per frame when none is configured (milliseconds at 60 fps).
pub const DEFAULT_TICKS_PER_FRAME: u64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub frame: u64,
    pub now_ticks: u64,
    pub view: FrameStats,
    pub evicted: usize,
    pub duration: Duration,
}

/// Drives one world through update, render and collect on a fixed tick step.
#[derive(Debug, Clone)]
pub struct FrameDriver {
    frame: u64,
    now_ticks: u64,
    ticks_per_frame: u64,
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new(DEFAULT_TICKS_PER_FRAME)
    }
}

impl FrameDriver {
    pub fn new(ticks_per_frame: u64) -> Self {
        Self {
            frame: 0,
            now_ticks: 0,
            ticks_per_frame,
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn now_ticks(&self) -> u64 {
        self.now_ticks
    }

    pub fn ticks_per_frame(&self) -> u64 {
        self.ticks_per_frame
    }

    pub fn run_frame(&mut self, world: &mut World, target: &mut dyn RenderTarget) -> FrameReport {
        let started = Instant::now();
        world.cache_mut().update_animations(self.now_ticks);
        let view = world.render(target);
        let evicted = world.cache_mut().collect();

        let report = FrameReport {
            frame: self.frame,
            now_ticks: self.now_ticks,
            view,
            evicted,
            duration: started.elapsed(),
        };
        self.frame = self.frame.saturating_add(1);
        self.now_ticks = self.now_ticks.saturating_add(self.ticks_per_frame);
        report
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::cache::{CacheConfig, Handle, RenderableLocation};
    use crate::config::ViewConfig;
    use crate::geometry::{GridGeometry, Point};
    use crate::map::{Map, MapElevation, MapObject, MapTileGrid, ObjectGrid};
    use crate::test_fixtures::{write_png, RecordingTarget};
    use crate::video::{Animation, AnimationFrame, Renderable};
    use tempfile::TempDir;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    fn animated_world(root: &Path, cache: CacheConfig) -> World {
        write_png(root, "red.png", 8, 8, RED);
        write_png(root, "blue.png", 8, 8, BLUE);
        let mut world = World::new(root, cache, &ViewConfig::default());
        let red = world
            .cache_mut()
            .add_from_location(RenderableLocation::file("red.png"));
        let blue = world
            .cache_mut()
            .add_from_location(RenderableLocation::file("blue.png"));
        let animation = Animation::new(
            vec![
                AnimationFrame::new(red, Point::ZERO),
                AnimationFrame::new(blue, Point::ZERO),
            ],
            32,
        )
        .expect("animation");
        let visual = world
            .cache_mut()
            .add_image(Renderable::Animation(animation))
            .expect("animation handle");

        let geometry = GridGeometry::default();
        let mut elevation = MapElevation::new(
            MapTileGrid::new(2, 2, geometry),
            MapTileGrid::new(2, 2, geometry),
            ObjectGrid::with_geometry(geometry),
        );
        elevation.add_object(MapObject::new("beacon", 0).with_visual(visual), true);
        let mut map = Map::new("anim");
        map.add_elevation(elevation);
        world.set_map(map);
        world
    }

    #[test]
    fn frames_advance_ticks_and_animations() {
        let temp = TempDir::new().expect("temp");
        let mut world = animated_world(temp.path(), CacheConfig::default());
        let mut driver = FrameDriver::new(16);
        let mut target = RecordingTarget::new(64, 64);

        let colors: Vec<_> = (0..5)
            .map(|_| {
                let report = driver.run_frame(&mut world, &mut target);
                assert_eq!(report.view.objects, 1);
                target.draws.last().and_then(|draw| draw.color)
            })
            .collect();
        // Frames switch every 32 ticks: ticks 0, 16 red; 32, 48 blue; 64 red.
        assert_eq!(
            colors,
            vec![Some(RED), Some(RED), Some(BLUE), Some(BLUE), Some(RED)]
        );
        assert_eq!(driver.frame(), 5);
        assert_eq!(driver.now_ticks(), 80);
    }

    #[test]
    fn collect_runs_after_render() {
        let temp = TempDir::new().expect("temp");
        let config = CacheConfig {
            chunk_size: 16,
            min_alive: 0,
            load_credits: 1,
            hit_credits: 1,
            preallocation: 8,
        };
        let mut world = animated_world(temp.path(), config);
        let mut driver = FrameDriver::new(16);
        let mut target = RecordingTarget::new(64, 64);

        // The red frame is drawn and then decays in the same frame.
        let report = driver.run_frame(&mut world, &mut target);
        assert_eq!(report.evicted, 1);
        assert!(!world.cache().is_loaded(Handle::from_raw(1)));
        let report = driver.run_frame(&mut world, &mut target);
        assert_eq!(report.view.objects, 1);
        assert_eq!(target.draws.last().and_then(|draw| draw.color), Some(RED));
    }
}
