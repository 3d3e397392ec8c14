use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::video::{Renderable, StaticImage, VideoError};

use super::asset_paths::AssetPathError;
use super::{CacheError, Handle, LocationExtension, LocationKind, RenderableLocation};

/// What a provider may do to the cache while it builds a renderable.
pub trait AssetRegistry {
    fn asset_root(&self) -> &Path;
    fn add_from_location(&mut self, location: RenderableLocation) -> Handle;
    fn add_image(&mut self, renderable: Renderable) -> Result<Handle, CacheError>;
    /// Pixels of the static image behind `handle`, loading it if needed.
    fn image_data(&mut self, handle: Handle) -> Option<StaticImage>;
}

/// Builds the renderable for one cache entry. Kept alive while the entry is
/// loaded and dropped on eviction.
pub trait RenderableProvider: fmt::Debug {
    fn create_renderable(
        &mut self,
        registry: &mut dyn AssetRegistry,
    ) -> Result<Renderable, LoadError>;
}

pub trait ProviderFactory {
    fn name(&self) -> &str;
    fn accepts(&self, kind: LocationKind) -> bool;
    fn create(&self, location: &RenderableLocation) -> Box<dyn RenderableProvider>;
}

type BuildProvider = fn(&RenderableLocation) -> Box<dyn RenderableProvider>;

/// Factory accepting a fixed set of location kinds.
#[derive(Clone, Copy)]
pub struct KindFactory {
    name: &'static str,
    kinds: &'static [LocationKind],
    build: BuildProvider,
}

impl KindFactory {
    pub const fn new(
        name: &'static str,
        kinds: &'static [LocationKind],
        build: BuildProvider,
    ) -> Self {
        Self { name, kinds, build }
    }
}

impl fmt::Debug for KindFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindFactory")
            .field("name", &self.name)
            .field("kinds", &self.kinds)
            .finish()
    }
}

impl ProviderFactory for KindFactory {
    fn name(&self) -> &str {
        self.name
    }

    fn accepts(&self, kind: LocationKind) -> bool {
        self.kinds.contains(&kind)
    }

    fn create(&self, location: &RenderableLocation) -> Box<dyn RenderableProvider> {
        (self.build)(location)
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("asset file not found: {path}")]
    NotFound { path: PathBuf },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("{message} (file={path}, line={line}, column={column})")]
    Malformed {
        path: PathBuf,
        message: String,
        line: usize,
        column: usize,
    },
    #[error("no provider accepts {kind} locations")]
    UnsupportedKind { kind: &'static str },
    #[error("invalid asset path '{path}': {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: AssetPathError,
    },
    #[error("location is missing the {extension:?} extension")]
    MissingExtension { extension: LocationExtension },
    #[error("parent {parent} is not a static image")]
    ParentNotImage { parent: Handle },
    #[error("{handle} is already being loaded")]
    Recursive { handle: Handle },
    #[error(transparent)]
    Video(#[from] VideoError),
}

impl LoadError {
    /// Short reason for log fields.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Io { .. } => "io",
            Self::Decode { .. } => "decode",
            Self::Malformed { .. } => "malformed",
            Self::UnsupportedKind { .. } => "unsupported_kind",
            Self::InvalidPath { .. } => "invalid_path",
            Self::MissingExtension { .. } => "missing_extension",
            Self::ParentNotImage { .. } => "parent_not_image",
            Self::Recursive { .. } => "recursive",
            Self::Video(_) => "video",
        }
    }
}
