use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tileview::{CacheConfig, ViewConfig, DEFAULT_TICKS_PER_FRAME};

pub(crate) const CONFIG_ENV_VAR: &str = "TILEVIEW_CONFIG";

const DEFAULT_FRAME_COUNT: u32 = 120;
const DEFAULT_OUTPUT: &str = "tileview_frame.png";
const DEFAULT_METRICS_INTERVAL_MS: u64 = 1000;
const DEFAULT_CLEAR_COLOR: [u8; 4] = [16, 16, 24, 255];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ViewerConfig {
    /// Overrides the asset directory found from `TILEVIEW_ROOT`.
    pub(crate) asset_root: Option<PathBuf>,
    /// XML map, relative to the asset directory. A built-in demo map is
    /// shown when unset.
    pub(crate) map: Option<PathBuf>,
    pub(crate) frames: u32,
    pub(crate) ticks_per_frame: u64,
    pub(crate) output: PathBuf,
    pub(crate) metrics_interval_ms: u64,
    pub(crate) clear_color: [u8; 4],
    pub(crate) cache: CacheConfig,
    pub(crate) view: ViewConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset_root: None,
            map: None,
            frames: DEFAULT_FRAME_COUNT,
            ticks_per_frame: DEFAULT_TICKS_PER_FRAME,
            output: PathBuf::from(DEFAULT_OUTPUT),
            metrics_interval_ms: DEFAULT_METRICS_INTERVAL_MS,
            clear_color: DEFAULT_CLEAR_COLOR,
            cache: CacheConfig::default(),
            view: ViewConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config '{path}' at {json_path}: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Config file named by the first argument, else by `TILEVIEW_CONFIG`.
pub(crate) fn config_path_from_env() -> Option<PathBuf> {
    env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
        .filter(|path| !path.as_os_str().is_empty())
}

pub(crate) fn load_viewer_config(path: Option<&Path>) -> Result<ViewerConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(ViewerConfig::default());
    };
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_viewer_config(&raw, path)
}

pub(crate) fn parse_viewer_config(raw: &str, path: &Path) -> Result<ViewerConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, ViewerConfig>(&mut deserializer).map_err(|error| {
        let json_path = match error.path().to_string() {
            path if path.is_empty() || path == "." => "<root>".to_string(),
            path => path,
        };
        ConfigError::Parse {
            path: path.to_path_buf(),
            json_path,
            source: error.into_inner(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_viewer_config(None).expect("defaults");
        assert_eq!(config, ViewerConfig::default());
        assert!(config.map.is_none());
    }

    #[test]
    fn nested_sections_override_defaults() {
        let raw = r#"{
            "map": "maps/town.xml",
            "frames": 3,
            "cache": { "chunk_size": 10 },
            "view": { "viewport_width": 320, "roof_alpha": 90 }
        }"#;
        let config = parse_viewer_config(raw, Path::new("viewer.json")).expect("config");
        assert_eq!(config.map, Some(PathBuf::from("maps/town.xml")));
        assert_eq!(config.frames, 3);
        assert_eq!(config.cache.chunk_size, 10);
        assert_eq!(config.cache.min_alive, CacheConfig::default().min_alive);
        assert_eq!(config.view.viewport_width, 320);
        assert_eq!(config.view.roof_alpha, 90);
        assert!(config.view.show_floor);
    }

    #[test]
    fn parse_errors_name_the_json_path() {
        let raw = r#"{ "view": { "viewport_width": "wide" } }"#;
        let error = parse_viewer_config(raw, Path::new("viewer.json")).expect_err("bad width");
        match error {
            ConfigError::Parse { json_path, .. } => assert_eq!(json_path, "view.viewport_width"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = parse_viewer_config(r#"{ "frame": 3 }"#, Path::new("viewer.json"))
            .expect_err("unknown field");
        assert!(error.to_string().contains("viewer.json"));
    }

    #[test]
    fn unreadable_file_reports_its_path() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("absent.json");
        let error = load_viewer_config(Some(&path)).expect_err("missing file");
        assert!(matches!(error, ConfigError::Read { .. }));

        fs::write(&path, r#"{ "frames": 7 }"#).expect("write config");
        assert_eq!(load_viewer_config(Some(&path)).expect("config").frames, 7);
    }
}
