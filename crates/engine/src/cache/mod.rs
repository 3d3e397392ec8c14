mod asset_paths;
mod handle;
mod image_cache;
mod location;
mod provider;
pub mod providers;

use thiserror::Error;

pub use crate::config::CacheConfig;
pub use asset_paths::AssetPathError;
pub use handle::Handle;
pub use image_cache::{CacheStats, ImageCache, MAX_RENDERABLE_NESTING};
pub use location::{LocationExtension, LocationKind, RenderableLocation};
pub use provider::{
    AssetRegistry, KindFactory, LoadError, ProviderFactory, RenderableProvider,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("cannot register an empty renderable")]
    InvalidArgument,
    #[error("handle {handle} is out of range ({len} entries)")]
    IndexOutOfRange { handle: Handle, len: usize },
}
