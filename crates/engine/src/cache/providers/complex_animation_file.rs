use crate::cache::{AssetRegistry, LoadError, LocationKind, RenderableLocation, RenderableProvider};
use crate::video::{ComplexAnimation, Renderable, HEX_DIRECTION_COUNT};

use super::{
    expect_root, malformed_at, parse_attr, parse_document, read_descriptor, required_attr,
    resolve_location_path,
};

/// Reads a `<complex-animation>` descriptor. Each `<action id direction>`
/// names an animation file; direction `any` fills all hex directions.
#[derive(Debug)]
pub struct ComplexAnimationFileProvider {
    location: RenderableLocation,
}

impl ComplexAnimationFileProvider {
    pub fn new(location: &RenderableLocation) -> Self {
        Self {
            location: location.clone(),
        }
    }

    pub(crate) fn boxed(location: &RenderableLocation) -> Box<dyn RenderableProvider> {
        Box::new(Self::new(location))
    }
}

impl RenderableProvider for ComplexAnimationFileProvider {
    fn create_renderable(
        &mut self,
        registry: &mut dyn AssetRegistry,
    ) -> Result<Renderable, LoadError> {
        let path = resolve_location_path(registry.asset_root(), self.location.path())?;
        let raw = read_descriptor(&path)?;
        let doc = parse_document(&path, &raw)?;
        expect_root(&path, &doc, "complex-animation")?;
        let root = doc.root_element();

        let name = root.attribute("name").unwrap_or(self.location.path());
        let mut complex = ComplexAnimation::new(name);

        for action in root.children().filter(|node| node.has_tag_name("action")) {
            let id = parse_attr::<u8>(&path, &doc, action, "id")?.ok_or_else(|| {
                malformed_at(
                    &path,
                    &doc,
                    action,
                    "<action> is missing required attribute 'id'".to_string(),
                )
            })?;
            let direction = required_attr(&path, &doc, action, "direction")?;
            let Some(animation) = action
                .children()
                .find(|node| node.has_tag_name("animation"))
            else {
                return Err(malformed_at(
                    &path,
                    &doc,
                    action,
                    format!("<action id=\"{id}\"> has no <animation> child"),
                ));
            };
            let src = required_attr(&path, &doc, animation, "src")?;

            let directions = if direction == "any" {
                (0..HEX_DIRECTION_COUNT).collect::<Vec<u8>>()
            } else {
                let parsed = direction.parse::<u8>().map_err(|_| {
                    malformed_at(
                        &path,
                        &doc,
                        action,
                        format!("direction '{direction}' is neither a number nor 'any'"),
                    )
                })?;
                vec![parsed]
            };

            for direction in directions {
                let handle = registry.add_from_location(
                    RenderableLocation::file(src)
                        .with_kind(LocationKind::Animation)
                        .with_direction(direction as u32),
                );
                complex.register_animation(id, direction, handle);
            }
        }

        if complex.registered_count() == 0 {
            return Err(malformed_at(
                &path,
                &doc,
                root,
                "complex animation registers no actions".to_string(),
            ));
        }
        complex.activate_first()?;
        Ok(Renderable::ComplexAnimation(complex))
    }
}
