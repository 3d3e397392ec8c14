use std::rc::Rc;

use crate::geometry::{Point, Rect};

use super::{RenderTarget, VideoError};

pub const PLACEHOLDER_SIZE_PX: u32 = 32;
const PLACEHOLDER_CHECKER_PX: u32 = 8;
const PLACEHOLDER_COLOR_A: [u8; 4] = [255, 0, 255, 255];
const PLACEHOLDER_COLOR_B: [u8; 4] = [24, 24, 24, 255];

/// Decoded RGBA pixels plus the per-image screen shift.
///
/// Pixels are shared: clones point at the same buffer, which is also what the
/// cache uses to recognise an image it has already been given.
#[derive(Debug, Clone)]
pub struct StaticImage {
    width: u32,
    height: u32,
    rgba: Rc<[u8]>,
    shift: Point,
}

impl StaticImage {
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, VideoError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(VideoError::PixelCountMismatch {
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba: Rc::from(rgba),
            shift: Point::ZERO,
        })
    }

    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let rgba = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect::<Vec<u8>>();
        Self {
            width,
            height,
            rgba: Rc::from(rgba),
            shift: Point::ZERO,
        }
    }

    /// One-pixel border, transparent inside. Used for grid and cursor overlays.
    pub fn outline(width: u32, height: u32, color: [u8; 4]) -> Self {
        let mut rgba = vec![0u8; width as usize * height as usize * 4];
        for y in 0..height {
            for x in 0..width {
                if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                    let offset = (y as usize * width as usize + x as usize) * 4;
                    rgba[offset..offset + 4].copy_from_slice(&color);
                }
            }
        }
        Self {
            width,
            height,
            rgba: Rc::from(rgba),
            shift: Point::ZERO,
        }
    }

    /// Magenta checkerboard drawn in place of anything that failed to load.
    pub fn placeholder() -> Self {
        let size = PLACEHOLDER_SIZE_PX;
        let mut rgba = Vec::with_capacity(size as usize * size as usize * 4);
        for y in 0..size {
            for x in 0..size {
                let checker = (x / PLACEHOLDER_CHECKER_PX + y / PLACEHOLDER_CHECKER_PX) % 2 == 0;
                rgba.extend_from_slice(if checker {
                    &PLACEHOLDER_COLOR_A
                } else {
                    &PLACEHOLDER_COLOR_B
                });
            }
        }
        Self {
            width: size,
            height: size,
            rgba: Rc::from(rgba),
            shift: Point::ZERO,
        }
    }

    pub fn with_shift(mut self, shift: Point) -> Self {
        self.shift = shift;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn shift(&self) -> Point {
        self.shift
    }

    pub fn set_shift(&mut self, shift: Point) {
        self.shift = shift;
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let mut out = [0u8; 4];
        out.copy_from_slice(self.rgba.get(offset..offset + 4)?);
        Some(out)
    }

    pub fn sub_image(&self, x: u32, y: u32, w: u32, h: u32) -> Result<StaticImage, VideoError> {
        let fits_x = x.checked_add(w).is_some_and(|right| right <= self.width);
        let fits_y = y.checked_add(h).is_some_and(|bottom| bottom <= self.height);
        if !fits_x || !fits_y {
            return Err(VideoError::SubImageOutOfBounds {
                x,
                y,
                w,
                h,
                width: self.width,
                height: self.height,
            });
        }

        let mut rgba = Vec::with_capacity(w as usize * h as usize * 4);
        let stride = self.width as usize * 4;
        for row in y..y + h {
            let start = row as usize * stride + x as usize * 4;
            rgba.extend_from_slice(&self.rgba[start..start + w as usize * 4]);
        }
        StaticImage::from_rgba(w, h, rgba)
    }

    pub fn render(&self, target: &mut dyn RenderTarget, dest: Rect, alpha: u8) -> bool {
        if alpha == 0 || dest.is_empty() || self.is_empty() {
            return false;
        }
        target.draw_image(self, dest, alpha);
        true
    }

    pub(crate) fn identity(&self) -> usize {
        Rc::as_ptr(&self.rgba) as *const u8 as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba_rejects_wrong_length() {
        let error = StaticImage::from_rgba(2, 2, vec![0; 15]).expect_err("short buffer");
        assert_eq!(
            error,
            VideoError::PixelCountMismatch {
                expected: 16,
                actual: 15
            }
        );
    }

    #[test]
    fn placeholder_is_visible_and_nonempty() {
        let placeholder = StaticImage::placeholder();
        assert_eq!(placeholder.width(), PLACEHOLDER_SIZE_PX);
        assert_eq!(placeholder.height(), PLACEHOLDER_SIZE_PX);
        assert_eq!(placeholder.pixel(0, 0), Some(PLACEHOLDER_COLOR_A));
        assert_eq!(
            placeholder.pixel(PLACEHOLDER_CHECKER_PX, 0),
            Some(PLACEHOLDER_COLOR_B)
        );
    }

    #[test]
    fn sub_image_copies_the_requested_window() {
        let mut rgba = Vec::new();
        for y in 0..4u8 {
            for x in 0..4u8 {
                rgba.extend_from_slice(&[x, y, 0, 255]);
            }
        }
        let image = StaticImage::from_rgba(4, 4, rgba).expect("image");
        let sub = image.sub_image(1, 2, 2, 2).expect("sub image");
        assert_eq!(sub.width(), 2);
        assert_eq!(sub.pixel(0, 0), Some([1, 2, 0, 255]));
        assert_eq!(sub.pixel(1, 1), Some([2, 3, 0, 255]));
        assert!(image.sub_image(3, 3, 2, 1).is_err());
    }

    #[test]
    fn clones_share_identity() {
        let image = StaticImage::solid(2, 2, [1, 2, 3, 4]);
        let other = StaticImage::solid(2, 2, [1, 2, 3, 4]);
        assert_eq!(image.identity(), image.clone().identity());
        assert_ne!(image.identity(), other.identity());
    }

    #[test]
    fn outline_leaves_interior_transparent() {
        let outline = StaticImage::outline(4, 3, [9, 9, 9, 255]);
        assert_eq!(outline.pixel(0, 1), Some([9, 9, 9, 255]));
        assert_eq!(outline.pixel(1, 1), Some([0, 0, 0, 0]));
        assert_eq!(outline.pixel(3, 2), Some([9, 9, 9, 255]));
    }
}
