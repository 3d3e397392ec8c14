mod animation;
mod complex_animation;
mod image;
mod renderable;
mod target;

use thiserror::Error;

pub use animation::{Animation, AnimationFrame, PlayDirection};
pub use complex_animation::{ComplexAnimation, HEX_DIRECTION_COUNT};
pub use image::{StaticImage, PLACEHOLDER_SIZE_PX};
pub use renderable::Renderable;
pub use target::{FrameBuffer, RenderTarget};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VideoError {
    #[error("frame index {index} out of range for {count} frames")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("animation has no frames")]
    NoFrames,
    #[error("no animation registered for action {action} direction {direction}")]
    UnregisteredAction { action: u8, direction: u8 },
    #[error("pixel buffer size mismatch: expected {expected} bytes, got {actual}")]
    PixelCountMismatch { expected: usize, actual: usize },
    #[error("sub-image {x},{y} {w}x{h} lies outside a {width}x{height} image")]
    SubImageOutOfBounds {
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        width: u32,
        height: u32,
    },
}
