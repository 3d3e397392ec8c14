use thiserror::Error;
use tileview::{
    Animation, AnimationFrame, CacheError, ComplexAnimation, GridError, GridGeometry, Handle,
    ImageCache, Map, MapElevation, MapObject, MapTileGrid, ObjectGrid, Point, Renderable,
    StaticImage, VideoError,
};

const DEMO_WIDTH: u32 = 24;
const DEMO_HEIGHT: u32 = 18;
const CELL_PX: u32 = 32;
const BEACON_FRAME_TICKS: u64 = 120;

const GRASS_A: [u8; 4] = [58, 122, 52, 255];
const GRASS_B: [u8; 4] = [66, 134, 58, 255];
const ROAD: [u8; 4] = [128, 118, 96, 255];
const ROOF: [u8; 4] = [150, 60, 44, 255];
const TREE: [u8; 4] = [24, 78, 32, 255];
const BEACON_DIM: [u8; 4] = [120, 100, 20, 255];
const BEACON_LIT: [u8; 4] = [250, 220, 60, 255];
const CRITTER_IDLE: [u8; 4] = [200, 200, 210, 255];
const CRITTER_WALK: [u8; 4] = [90, 150, 230, 255];

#[derive(Debug, Error)]
pub(crate) enum DemoError {
    #[error("failed to register demo asset: {0}")]
    Cache(#[from] CacheError),
    #[error("failed to build demo animation: {0}")]
    Video(#[from] VideoError),
    #[error("failed to lay out demo grid: {0}")]
    Grid(#[from] GridError),
}

/// Procedural map shown when no map file is configured. Every asset is a
/// prebuilt image, so it needs nothing on disk.
pub(crate) fn build_demo_map(cache: &mut ImageCache) -> Result<Map, DemoError> {
    let geometry = GridGeometry::rectangular(CELL_PX, CELL_PX);
    let grass_a = solid(cache, CELL_PX, CELL_PX, GRASS_A)?;
    let grass_b = solid(cache, CELL_PX, CELL_PX, GRASS_B)?;
    let road = solid(cache, CELL_PX, CELL_PX, ROAD)?;
    let roof_tile = solid(cache, CELL_PX, CELL_PX, ROOF)?;

    let mut floor = MapTileGrid::new(DEMO_WIDTH, DEMO_HEIGHT, geometry);
    for y in 0..DEMO_HEIGHT as i32 {
        for x in 0..DEMO_WIDTH as i32 {
            let tile = match (x, y) {
                (_, 8) | (11, _) => road,
                _ if (x + y) % 2 == 0 => grass_a,
                _ => grass_b,
            };
            floor.set_tile(x, y, tile)?;
        }
    }

    let mut roof = MapTileGrid::new(DEMO_WIDTH, DEMO_HEIGHT, geometry);
    roof.set_shift(Point::new(0, -(CELL_PX as i32) / 2));
    roof.set_global_alpha(220);
    for y in 2..5 {
        for x in 3..8 {
            roof.set_tile(x, y, roof_tile)?;
        }
    }

    let mut elevation = MapElevation::new(
        floor,
        roof,
        ObjectGrid::new(DEMO_WIDTH, DEMO_HEIGHT, geometry),
    );

    let tree = cache.add_image(Renderable::Image(
        StaticImage::solid(20, 40, TREE).with_shift(Point::new(6, -8)),
    ))?;
    for (x, y) in [(1, 1), (15, 3), (19, 12), (5, 14), (18, 2)] {
        let position = y * DEMO_WIDTH as i32 + x;
        elevation.add_object(MapObject::new("tree", position).with_visual(tree), true);
    }

    let beacon = beacon(cache)?;
    elevation.add_object(
        MapObject::new("beacon", 8 * DEMO_WIDTH as i32 + 11).with_visual(beacon),
        true,
    );

    let critter = critter(cache)?;
    elevation.add_object(
        MapObject::new("critter", 10 * DEMO_WIDTH as i32 + 6)
            .with_visual(critter)
            .with_opacity(200),
        true,
    );

    let mut map = Map::new("demo");
    map.add_elevation(elevation);
    Ok(map)
}

fn solid(
    cache: &mut ImageCache,
    width: u32,
    height: u32,
    color: [u8; 4],
) -> Result<Handle, CacheError> {
    cache.add_image(Renderable::Image(StaticImage::solid(width, height, color)))
}

fn beacon(cache: &mut ImageCache) -> Result<Handle, DemoError> {
    let dim = solid(cache, 16, 16, BEACON_DIM)?;
    let lit = solid(cache, 16, 16, BEACON_LIT)?;
    let animation = Animation::new(
        vec![
            AnimationFrame::new(dim, Point::new(8, 8)),
            AnimationFrame::new(lit, Point::new(8, 8)),
            AnimationFrame::new(lit, Point::new(7, 7)),
        ],
        BEACON_FRAME_TICKS,
    )?;
    Ok(cache.add_image(Renderable::Animation(animation))?)
}

fn critter(cache: &mut ImageCache) -> Result<Handle, DemoError> {
    let idle = solid(cache, 24, 24, CRITTER_IDLE)?;
    let walk = solid(cache, 24, 24, CRITTER_WALK)?;
    let mut complex = ComplexAnimation::new("critter");
    complex.register_all_directions(0, idle);
    complex.register_all_directions(1, walk);
    complex.activate_first()?;
    complex.set_action(1)?;
    Ok(cache.add_image(Renderable::ComplexAnimation(complex))?)
}
