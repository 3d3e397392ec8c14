use roxmltree::Node;

use crate::cache::{AssetRegistry, LoadError, RenderableLocation, RenderableProvider};
use crate::geometry::Point;
use crate::video::{Animation, AnimationFrame, Renderable};

use super::{
    expect_root, malformed_at, parse_attr, parse_document, read_descriptor, required_attr,
    resolve_location_path,
};

pub const DEFAULT_FRAME_DURATION_MS: u64 = 100;

/// Reads an `<animation>` descriptor. The location's direction picks the
/// `<direction index=..>` group; frames are registered in the cache as
/// image locations.
#[derive(Debug)]
pub struct AnimationFileProvider {
    location: RenderableLocation,
}

impl AnimationFileProvider {
    pub fn new(location: &RenderableLocation) -> Self {
        Self {
            location: location.clone(),
        }
    }

    pub(crate) fn boxed(location: &RenderableLocation) -> Box<dyn RenderableProvider> {
        Box::new(Self::new(location))
    }
}

impl RenderableProvider for AnimationFileProvider {
    fn create_renderable(
        &mut self,
        registry: &mut dyn AssetRegistry,
    ) -> Result<Renderable, LoadError> {
        let path = resolve_location_path(registry.asset_root(), self.location.path())?;
        let raw = read_descriptor(&path)?;
        let doc = parse_document(&path, &raw)?;
        expect_root(&path, &doc, "animation")?;
        let root = doc.root_element();

        let frame_duration = parse_attr::<u64>(&path, &doc, root, "frame_duration")?
            .unwrap_or(DEFAULT_FRAME_DURATION_MS);
        let shift = Point::new(
            parse_attr::<i32>(&path, &doc, root, "x_shift")?.unwrap_or(0),
            parse_attr::<i32>(&path, &doc, root, "y_shift")?.unwrap_or(0),
        );

        let direction = self.location.direction();
        let groups = root
            .children()
            .filter(|node| node.has_tag_name("direction"))
            .collect::<Vec<Node<'_, '_>>>();
        let frame_parent = if groups.is_empty() {
            root
        } else {
            let mut selected = None;
            for group in groups {
                let index = parse_attr::<u32>(&path, &doc, group, "index")?.unwrap_or(0);
                if index == direction {
                    selected = Some(group);
                    break;
                }
            }
            selected.ok_or_else(|| {
                malformed_at(
                    &path,
                    &doc,
                    root,
                    format!("no <direction index=\"{direction}\"> group"),
                )
            })?
        };

        let mut frames = Vec::new();
        for node in frame_parent
            .children()
            .filter(|node| node.has_tag_name("frame"))
        {
            let src = required_attr(&path, &doc, node, "src")?;
            let frame_shift = Point::new(
                parse_attr::<i32>(&path, &doc, node, "x_shift")?.unwrap_or(0),
                parse_attr::<i32>(&path, &doc, node, "y_shift")?.unwrap_or(0),
            );
            let image = registry.add_from_location(RenderableLocation::file(src));
            frames.push(AnimationFrame::new(image, frame_shift));
        }
        if frames.is_empty() {
            return Err(malformed_at(
                &path,
                &doc,
                frame_parent,
                "animation has no <frame> elements".to_string(),
            ));
        }

        Ok(Renderable::Animation(
            Animation::new(frames, frame_duration)?.with_shift(shift),
        ))
    }
}
