use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetPathError {
    #[error("asset path is empty")]
    Empty,
    #[error("asset path must be relative to the asset root")]
    Absolute,
    #[error("asset path climbs out of the asset root through '..'")]
    EscapesRoot,
}

/// Joins a location path onto the asset root. Any file name is accepted;
/// only paths that would leave the root are refused.
pub(crate) fn resolve_asset_path(root: &Path, path: &str) -> Result<PathBuf, AssetPathError> {
    let mut resolved = root.to_path_buf();
    let mut pushed = false;
    for component in Path::new(path).components() {
        match component {
            Component::Normal(segment) => {
                resolved.push(segment);
                pushed = true;
            }
            Component::CurDir => {}
            Component::ParentDir => return Err(AssetPathError::EscapesRoot),
            Component::RootDir | Component::Prefix(_) => return Err(AssetPathError::Absolute),
        }
    }
    if !pushed {
        return Err(AssetPathError::Empty);
    }
    Ok(resolved)
}
