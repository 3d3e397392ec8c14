use std::path::PathBuf;

use thiserror::Error;
use tileview::{resolve_asset_paths, MapLoadError, StartupError, World};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{config_path_from_env, load_viewer_config, ConfigError, ViewerConfig};

use super::demo::{build_demo_map, DemoError};

#[derive(Debug, Error)]
pub(crate) enum ViewerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to load map: {0}")]
    MapLoad(#[from] MapLoadError),
    #[error(transparent)]
    Demo(#[from] DemoError),
    #[error("failed to write frame to {path}: {source}")]
    WriteFrame {
        path: PathBuf,
        #[source]
        source: tileview::ImageError,
    },
}

pub(crate) struct ViewerWiring {
    pub(crate) config: ViewerConfig,
    pub(crate) world: World,
}

pub(crate) fn build_viewer() -> Result<ViewerWiring, ViewerError> {
    init_tracing();
    info!("=== tileview startup ===");

    let config_path = config_path_from_env();
    let config = load_viewer_config(config_path.as_deref())?;
    let asset_root = match &config.asset_root {
        Some(root) => root.clone(),
        None => resolve_asset_paths()?.assets_dir,
    };
    let config_label = config_path
        .as_deref()
        .map_or_else(|| "<defaults>".to_string(), |path| path.display().to_string());
    info!(
        config = %config_label,
        asset_root = %asset_root.display(),
        frames = config.frames,
        ticks_per_frame = config.ticks_per_frame,
        "viewer_config"
    );

    let world = build_world(&config, asset_root)?;
    Ok(ViewerWiring { config, world })
}

pub(crate) fn build_world(
    config: &ViewerConfig,
    asset_root: PathBuf,
) -> Result<World, ViewerError> {
    let mut world = World::new(asset_root.clone(), config.cache, &config.view);
    match &config.map {
        Some(map) => world.load_map(&asset_root.join(map))?,
        None => {
            let map = build_demo_map(world.cache_mut())?;
            info!(map = map.name(), "demo_map_built");
            world.set_map(map);
        }
    }
    Ok(world)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use tempfile::TempDir;

    #[test]
    fn configured_map_is_loaded_from_the_asset_root() {
        let temp = TempDir::new().expect("temp");
        fs::create_dir_all(temp.path().join("maps")).expect("maps dir");
        fs::write(
            temp.path().join("maps").join("yard.xml"),
            r#"<map name="yard"><elevation><floor width="3" height="3"/></elevation></map>"#,
        )
        .expect("map file");
        let config = ViewerConfig {
            map: Some(PathBuf::from("maps/yard.xml")),
            ..ViewerConfig::default()
        };

        let world = build_world(&config, temp.path().to_path_buf()).expect("world");
        assert_eq!(world.map().map(|map| map.name()), Some("yard"));
    }

    #[test]
    fn demo_map_is_used_without_a_configured_map() {
        let temp = TempDir::new().expect("temp");
        let world = build_world(&ViewerConfig::default(), temp.path().to_path_buf())
            .expect("world");
        assert_eq!(world.map().map(|map| map.name()), Some("demo"));
    }

    #[test]
    fn missing_map_file_is_a_load_error() {
        let temp = TempDir::new().expect("temp");
        let config = ViewerConfig {
            map: Some(PathBuf::from("maps/none.xml")),
            ..ViewerConfig::default()
        };
        let error = build_world(&config, temp.path().to_path_buf()).expect_err("missing map");
        assert!(matches!(error, ViewerError::MapLoad(_)));
    }
}
