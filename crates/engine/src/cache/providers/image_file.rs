use std::path::Path;

use image::ImageReader;

use crate::cache::{
    AssetRegistry, LoadError, LocationExtension, RenderableLocation, RenderableProvider,
};
use crate::geometry::Point;
use crate::video::{Renderable, StaticImage};

use super::{io_error, resolve_location_path};

/// Decodes an image file below the asset root. `X`/`Y` extensions become the
/// image shift.
#[derive(Debug)]
pub struct ImageFileProvider {
    location: RenderableLocation,
}

impl ImageFileProvider {
    pub fn new(location: &RenderableLocation) -> Self {
        Self {
            location: location.clone(),
        }
    }

    pub(crate) fn boxed(location: &RenderableLocation) -> Box<dyn RenderableProvider> {
        Box::new(Self::new(location))
    }
}

impl RenderableProvider for ImageFileProvider {
    fn create_renderable(
        &mut self,
        registry: &mut dyn AssetRegistry,
    ) -> Result<Renderable, LoadError> {
        let path = resolve_location_path(registry.asset_root(), self.location.path())?;
        let image = load_image_rgba(&path)?;
        let shift = Point::new(
            self.location
                .extension_i32(LocationExtension::X)
                .unwrap_or(0),
            self.location
                .extension_i32(LocationExtension::Y)
                .unwrap_or(0),
        );
        Ok(Renderable::Image(image.with_shift(shift)))
    }
}

pub(crate) fn load_image_rgba(path: &Path) -> Result<StaticImage, LoadError> {
    let reader = ImageReader::open(path).map_err(|source| io_error(path, source))?;
    let decoded = reader.decode().map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let image = decoded.to_rgba8();
    let (width, height) = image.dimensions();
    Ok(StaticImage::from_rgba(width, height, image.into_raw())?)
}
