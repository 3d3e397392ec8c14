use serde::{Deserialize, Serialize};

use crate::geometry::Point;

pub const DEFAULT_CHUNK_SIZE: usize = 100;
pub const DEFAULT_MIN_ALIVE: usize = 500;
pub const DEFAULT_LOAD_CREDITS: u32 = 100;
pub const DEFAULT_HIT_CREDITS: u32 = 1024;
pub const DEFAULT_PREALLOCATION: usize = 10240;

/// Tuning for [`crate::cache::ImageCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Entries visited by one `collect()` call.
    pub chunk_size: usize,
    /// Collection is skipped while fewer payloads than this are loaded.
    pub min_alive: usize,
    /// Credits an entry starts with right after loading.
    pub load_credits: u32,
    /// Credits an entry is reset to on every access.
    pub hit_credits: u32,
    /// Entry slots reserved up front.
    pub preallocation: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            min_alive: DEFAULT_MIN_ALIVE,
            load_credits: DEFAULT_LOAD_CREDITS,
            hit_credits: DEFAULT_HIT_CREDITS,
            preallocation: DEFAULT_PREALLOCATION,
        }
    }
}

impl CacheConfig {
    pub(crate) fn normalized(self) -> Self {
        Self {
            chunk_size: self.chunk_size.max(1),
            load_credits: self.load_credits.max(1),
            hit_credits: self.hit_credits.max(1),
            ..self
        }
    }
}

pub const DEFAULT_VIEWPORT_WIDTH: u32 = 640;
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 480;
pub const DEFAULT_CULL_PADDING_PX: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewConfig {
    pub viewport_x: i32,
    pub viewport_y: i32,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub show_floor: bool,
    pub show_objects: bool,
    pub show_roof: bool,
    pub show_tile_grid: bool,
    pub show_object_grid: bool,
    pub roof_alpha: u8,
    /// Extra screen offset applied to roof tiles on top of the grid's own shift.
    pub roof_shift: Point,
    pub cull_padding_px: u32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            viewport_x: 0,
            viewport_y: 0,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            show_floor: true,
            show_objects: true,
            show_roof: true,
            show_tile_grid: false,
            show_object_grid: false,
            roof_alpha: u8::MAX,
            roof_shift: Point::ZERO,
            cull_padding_px: DEFAULT_CULL_PADDING_PX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let cache: CacheConfig = serde_json::from_str("{}").expect("cache config");
        assert_eq!(cache, CacheConfig::default());
        let view: ViewConfig = serde_json::from_str("{}").expect("view config");
        assert_eq!(view, ViewConfig::default());
    }

    #[test]
    fn partial_json_overrides_fields() {
        let cache: CacheConfig =
            serde_json::from_str(r#"{"chunk_size": 8, "min_alive": 0}"#).expect("cache config");
        assert_eq!(cache.chunk_size, 8);
        assert_eq!(cache.min_alive, 0);
        assert_eq!(cache.hit_credits, DEFAULT_HIT_CREDITS);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<CacheConfig>(r#"{"chunk": 8}"#).is_err());
    }

    #[test]
    fn normalized_keeps_credits_and_chunks_positive() {
        let config = CacheConfig {
            chunk_size: 0,
            load_credits: 0,
            hit_credits: 0,
            ..CacheConfig::default()
        }
        .normalized();
        assert_eq!(
            (config.chunk_size, config.load_credits, config.hit_credits),
            (1, 1, 1)
        );
    }
}
