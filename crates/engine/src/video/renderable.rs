use crate::cache::Handle;
use crate::geometry::{Point, Rect};

use super::{Animation, ComplexAnimation, RenderTarget, StaticImage};

#[derive(Debug, Clone)]
pub enum Renderable {
    Image(StaticImage),
    Animation(Animation),
    ComplexAnimation(ComplexAnimation),
    /// Stand-in for an asset that could not be produced.
    Placeholder(StaticImage),
}

impl Renderable {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Image(_) => "image",
            Self::Animation(_) => "animation",
            Self::ComplexAnimation(_) => "complex_animation",
            Self::Placeholder(_) => "placeholder",
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }

    /// Size of a drawable leaf. Composites report zero; resolve them through
    /// the cache to get the size of the frame currently shown.
    pub fn width(&self) -> u32 {
        self.leaf_image().map_or(0, StaticImage::width)
    }

    pub fn height(&self) -> u32 {
        self.leaf_image().map_or(0, StaticImage::height)
    }

    pub fn shift(&self) -> Point {
        match self {
            Self::Image(image) | Self::Placeholder(image) => image.shift(),
            Self::Animation(animation) => animation.shift(),
            Self::ComplexAnimation(_) => Point::ZERO,
        }
    }

    pub fn as_image(&self) -> Option<&StaticImage> {
        match self {
            Self::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_animation_mut(&mut self) -> Option<&mut Animation> {
        match self {
            Self::Animation(animation) => Some(animation),
            _ => None,
        }
    }

    pub fn as_complex_animation_mut(&mut self) -> Option<&mut ComplexAnimation> {
        match self {
            Self::ComplexAnimation(complex) => Some(complex),
            _ => None,
        }
    }

    /// Next hop for composites: the handle currently shown and the extra
    /// shift to apply to it.
    pub fn current_frame(&self) -> Option<(Handle, Point)> {
        match self {
            Self::Animation(animation) => {
                let frame = animation.current_frame();
                Some((frame.image, frame.shift))
            }
            Self::ComplexAnimation(complex) => complex
                .active_animation()
                .map(|handle| (handle, Point::ZERO)),
            Self::Image(_) | Self::Placeholder(_) => None,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Animation(_) | Self::ComplexAnimation(_))
    }

    /// Draws a leaf into `dest`. Composites draw nothing here.
    pub fn render(&self, target: &mut dyn RenderTarget, dest: Rect, alpha: u8) -> bool {
        match self.leaf_image() {
            Some(image) => image.render(target, dest, alpha),
            None => false,
        }
    }

    pub fn update(&mut self, now_ticks: u64) {
        if let Self::Animation(animation) = self {
            animation.update(now_ticks);
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        match self {
            Self::Image(image) | Self::Placeholder(image) => image.is_empty(),
            Self::Animation(animation) => animation.frame_count() == 0,
            Self::ComplexAnimation(complex) => complex.registered_count() == 0,
        }
    }

    pub(crate) fn identity(&self) -> Option<usize> {
        match self {
            Self::Image(image) | Self::Placeholder(image) => Some(image.identity()),
            Self::Animation(_) | Self::ComplexAnimation(_) => None,
        }
    }

    fn leaf_image(&self) -> Option<&StaticImage> {
        match self {
            Self::Image(image) | Self::Placeholder(image) => Some(image),
            Self::Animation(_) | Self::ComplexAnimation(_) => None,
        }
    }
}
