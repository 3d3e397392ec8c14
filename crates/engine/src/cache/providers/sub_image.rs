use crate::cache::{
    AssetRegistry, Handle, LoadError, LocationExtension, RenderableLocation, RenderableProvider,
};
use crate::video::Renderable;

/// Crops `X, Y, W, H` out of the image whose handle sits in `ImageId`.
#[derive(Debug)]
pub struct SubImageProvider {
    location: RenderableLocation,
}

impl SubImageProvider {
    pub fn new(location: &RenderableLocation) -> Self {
        Self {
            location: location.clone(),
        }
    }

    pub(crate) fn boxed(location: &RenderableLocation) -> Box<dyn RenderableProvider> {
        Box::new(Self::new(location))
    }

    fn extension(&self, extension: LocationExtension) -> Result<u32, LoadError> {
        self.location
            .extension_u32(extension)
            .ok_or(LoadError::MissingExtension { extension })
    }
}

impl RenderableProvider for SubImageProvider {
    fn create_renderable(
        &mut self,
        registry: &mut dyn AssetRegistry,
    ) -> Result<Renderable, LoadError> {
        let parent = Handle::from_raw(self.extension(LocationExtension::ImageId)?);
        let x = self.extension(LocationExtension::X)?;
        let y = self.extension(LocationExtension::Y)?;
        let w = self.extension(LocationExtension::W)?;
        let h = self.extension(LocationExtension::H)?;

        let image = registry
            .image_data(parent)
            .ok_or(LoadError::ParentNotImage { parent })?;
        Ok(Renderable::Image(image.sub_image(x, y, w, h)?))
    }
}
