use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod cache;
pub mod config;
pub mod geometry;
pub mod map;
pub mod video;
pub mod view;

#[cfg(test)]
mod test_fixtures;

pub use app::{
    FrameDriver, FrameMetricsAccumulator, FrameMetricsSnapshot, FrameReport, World,
    DEFAULT_TICKS_PER_FRAME,
};
pub use cache::{
    CacheConfig, CacheError, CacheStats, Handle, ImageCache, LoadError, LocationExtension,
    LocationKind, RenderableLocation,
};
pub use config::ViewConfig;
pub use geometry::{GridGeometry, Point, Rect};
pub use image::ImageError;
pub use map::{
    load_map_file, parse_map_xml, GridError, Map, MapElevation, MapErrorCode, MapLoadError,
    MapObject, MapTileGrid, ObjectGrid, ObjectId, SourceLocation, POS_NOT_ON_MAP,
};
pub use video::{
    Animation, AnimationFrame, ComplexAnimation, FrameBuffer, RenderTarget, Renderable,
    StaticImage, VideoError,
};
pub use view::{FrameStats, Layer, LayerVisibility, MapView, ViewError};

pub const ROOT_ENV_VAR: &str = "TILEVIEW_ROOT";

#[derive(Debug, Clone)]
pub struct AssetPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub maps_dir: PathBuf,
}

impl AssetPaths {
    pub fn from_root(root: PathBuf) -> Self {
        let assets_dir = root.join("assets");
        let maps_dir = assets_dir.join("maps");
        Self {
            root,
            assets_dir,
            maps_dir,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "TILEVIEW_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/tileview\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_asset_paths() -> Result<AssetPaths, StartupError> {
    Ok(AssetPaths::from_root(resolve_root()?))
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(Path::new(&value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;
            find_root_above(&exe_dir).ok_or_else(|| StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn find_root_above(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|candidate| is_repo_marker(candidate))
        .map(normalize_path)
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
