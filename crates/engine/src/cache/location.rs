use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LocationKind {
    #[default]
    Undefined,
    Image,
    Animation,
    ComplexAnimation,
    SubImage,
}

impl LocationKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Image => "image",
            Self::Animation => "animation",
            Self::ComplexAnimation => "complex_animation",
            Self::SubImage => "sub_image",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LocationExtension {
    ImageId,
    X,
    Y,
    W,
    H,
    Palette,
}

/// Describes where a renderable comes from. Used as the cache's dedup key
/// and to pick a provider.
#[derive(Debug, Clone, Default)]
pub struct RenderableLocation {
    kind: LocationKind,
    path: String,
    frame: u32,
    direction: u32,
    extensions: BTreeMap<LocationExtension, String>,
}

impl RenderableLocation {
    pub fn undefined() -> Self {
        Self::default()
    }

    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn file_frame(path: impl Into<String>, frame: u32) -> Self {
        Self::file(path).with_frame(frame)
    }

    pub fn file_frame_dir(path: impl Into<String>, frame: u32, direction: u32) -> Self {
        Self::file(path).with_frame(frame).with_direction(direction)
    }

    /// Sub-image of the image at `parent`; path stays empty.
    pub fn sub_image(parent: u32, x: u32, y: u32, w: u32, h: u32) -> Self {
        Self::default()
            .with_kind(LocationKind::SubImage)
            .with_extension(LocationExtension::ImageId, parent)
            .with_extension(LocationExtension::X, x)
            .with_extension(LocationExtension::Y, y)
            .with_extension(LocationExtension::W, w)
            .with_extension(LocationExtension::H, h)
    }

    pub fn with_kind(mut self, kind: LocationKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_frame(mut self, frame: u32) -> Self {
        self.frame = frame;
        self
    }

    pub fn with_direction(mut self, direction: u32) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_extension(mut self, extension: LocationExtension, value: impl fmt::Display) -> Self {
        self.extensions.insert(extension, value.to_string());
        self
    }

    pub fn kind(&self) -> LocationKind {
        self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn direction(&self) -> u32 {
        self.direction
    }

    pub fn extension(&self, extension: LocationExtension) -> Option<&str> {
        self.extensions.get(&extension).map(String::as_str)
    }

    pub fn extension_i32(&self, extension: LocationExtension) -> Option<i32> {
        self.extension(extension)?.trim().parse().ok()
    }

    pub fn extension_u32(&self, extension: LocationExtension) -> Option<u32> {
        self.extension(extension)?.trim().parse().ok()
    }

    pub fn has_extension(&self, extension: LocationExtension) -> bool {
        self.extensions.contains_key(&extension)
    }

    pub fn is_valid(&self) -> bool {
        match self.kind {
            LocationKind::SubImage => !self.extensions.is_empty(),
            _ => !self.path.is_empty(),
        }
    }

    /// Text after the last '.', or the whole path when there is none.
    pub fn file_extension(&self) -> &str {
        match self.path.rfind('.') {
            Some(index) => &self.path[index + 1..],
            None => &self.path,
        }
    }
}

// Paths are compared back to front: locations sharing a directory prefix
// differ at the end, so this settles most comparisons early.
fn cmp_reversed(a: &str, b: &str) -> Ordering {
    a.bytes().rev().cmp(b.bytes().rev())
}

impl Ord for RenderableLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_reversed(&self.path, &other.path)
            .then(self.frame.cmp(&other.frame))
            .then(self.direction.cmp(&other.direction))
            .then(self.kind.cmp(&other.kind))
            .then_with(|| self.extensions.cmp(&other.extensions))
    }
}

impl PartialOrd for RenderableLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RenderableLocation {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RenderableLocation {}

impl Hash for RenderableLocation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.path.hash(state);
        self.frame.hash(state);
        self.direction.hash(state);
        self.extensions.hash(state);
    }
}

impl fmt::Display for RenderableLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind.name(), self.path)?;
        match self.kind {
            LocationKind::Undefined | LocationKind::Image => {
                write!(f, " frame={} direction={}", self.frame, self.direction)
            }
            LocationKind::Animation => write!(f, " direction={}", self.direction),
            LocationKind::ComplexAnimation => Ok(()),
            LocationKind::SubImage => {
                for (extension, value) in &self.extensions {
                    write!(f, " {extension:?}={value}")?;
                }
                Ok(())
            }
        }
    }
}
