mod animation_file;
mod complex_animation_file;
mod image_file;
mod sub_image;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;

use roxmltree::{Document, Node};

use super::asset_paths::resolve_asset_path;
use super::{KindFactory, LoadError, LocationKind, ProviderFactory};

pub use animation_file::{AnimationFileProvider, DEFAULT_FRAME_DURATION_MS};
pub use complex_animation_file::ComplexAnimationFileProvider;
pub use image_file::ImageFileProvider;
pub use sub_image::SubImageProvider;

/// Built-in factories in lookup order.
pub fn default_factories() -> Vec<Rc<dyn ProviderFactory>> {
    vec![
        Rc::new(KindFactory::new(
            "animation_file",
            &[LocationKind::Animation],
            AnimationFileProvider::boxed,
        )),
        Rc::new(KindFactory::new(
            "sub_image",
            &[LocationKind::SubImage],
            SubImageProvider::boxed,
        )),
        Rc::new(KindFactory::new(
            "complex_animation_file",
            &[LocationKind::ComplexAnimation],
            ComplexAnimationFileProvider::boxed,
        )),
        Rc::new(KindFactory::new(
            "image_file",
            &[LocationKind::Undefined, LocationKind::Image],
            ImageFileProvider::boxed,
        )),
    ]
}

fn resolve_location_path(root: &Path, path: &str) -> Result<PathBuf, LoadError> {
    resolve_asset_path(root, path).map_err(|source| LoadError::InvalidPath {
        path: path.to_string(),
        source,
    })
}

fn io_error(path: &Path, source: io::Error) -> LoadError {
    if source.kind() == io::ErrorKind::NotFound {
        LoadError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        LoadError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn read_descriptor(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| io_error(path, source))
}

fn parse_document<'input>(path: &Path, raw: &'input str) -> Result<Document<'input>, LoadError> {
    Document::parse(raw).map_err(|error| LoadError::Malformed {
        path: path.to_path_buf(),
        message: format!("XML parse error: {error}"),
        line: error.pos().row as usize,
        column: error.pos().col as usize,
    })
}

fn malformed_at(path: &Path, doc: &Document<'_>, node: Node<'_, '_>, message: String) -> LoadError {
    let pos = doc.text_pos_at(node.range().start);
    LoadError::Malformed {
        path: path.to_path_buf(),
        message,
        line: pos.row as usize,
        column: pos.col as usize,
    }
}

fn expect_root(path: &Path, doc: &Document<'_>, name: &str) -> Result<(), LoadError> {
    let root = doc.root_element();
    if root.tag_name().name() != name {
        return Err(malformed_at(
            path,
            doc,
            root,
            format!("root element must be <{name}>"),
        ));
    }
    Ok(())
}

fn required_attr<'a>(
    path: &Path,
    doc: &Document<'_>,
    node: Node<'a, '_>,
    name: &str,
) -> Result<&'a str, LoadError> {
    match node.attribute(name).map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(malformed_at(
            path,
            doc,
            node,
            format!(
                "<{}> is missing required attribute '{}'",
                node.tag_name().name(),
                name
            ),
        )),
    }
}

fn parse_attr<T: FromStr>(
    path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
    name: &str,
) -> Result<Option<T>, LoadError> {
    let Some(raw) = node.attribute(name) else {
        return Ok(None);
    };
    raw.trim().parse::<T>().map(Some).map_err(|_| {
        malformed_at(
            path,
            doc,
            node,
            format!("attribute '{name}' has invalid value '{raw}'"),
        )
    })
}
