use std::path::Path;

use image::{ImageBuffer, ImageError, Rgba};

use crate::geometry::Rect;

use super::StaticImage;

/// Pixel sink the view draws into.
pub trait RenderTarget {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Draws `image` stretched to `dest`, with `alpha` multiplied into every pixel.
    fn draw_image(&mut self, image: &StaticImage, dest: Rect, alpha: u8);
    /// Restricts subsequent draws to `clip`; `None` lifts the restriction.
    fn set_clip(&mut self, _clip: Option<Rect>) {}
}

/// Software RGBA target with nearest-neighbour scaling and source-over blending.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
    clip: Option<Rect>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![0; width as usize * height as usize * 4],
            clip: None,
        }
    }

    pub fn clear(&mut self, color: [u8; 4]) {
        for pixel in self.rgba.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.rgba[offset..offset + 4]);
        Some(out)
    }

    pub fn as_rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn save_png(&self, path: &Path) -> Result<(), ImageError> {
        let Some(buffer) =
            ImageBuffer::<Rgba<u8>, _>::from_raw(self.width, self.height, self.rgba.as_slice())
        else {
            return Err(ImageError::Parameter(image::error::ParameterError::from_kind(
                image::error::ParameterErrorKind::DimensionMismatch,
            )));
        };
        buffer.save_with_format(path, image::ImageFormat::Png)
    }

    fn visible_area(&self) -> Rect {
        let full = Rect::new(0, 0, self.width as i32, self.height as i32);
        match self.clip {
            Some(clip) => clip.intersection(&full).unwrap_or_default(),
            None => full,
        }
    }
}

impl RenderTarget for FrameBuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_clip(&mut self, clip: Option<Rect>) {
        self.clip = clip;
    }

    fn draw_image(&mut self, image: &StaticImage, dest: Rect, alpha: u8) {
        if alpha == 0 || dest.is_empty() || image.is_empty() {
            return;
        }
        let Some(area) = dest.intersection(&self.visible_area()) else {
            return;
        };

        let src = image.rgba();
        let src_width = image.width() as usize;
        let frame_width = self.width as usize;

        for out_y in area.y..area.bottom() {
            let dy = (out_y - dest.y) as u64;
            let src_y = (dy * image.height() as u64 / dest.h as u64) as usize;
            let src_y = src_y.min(image.height() as usize - 1);
            let src_row_offset = src_y * src_width * 4;
            let dst_row_offset = out_y as usize * frame_width * 4;

            for out_x in area.x..area.right() {
                let dx = (out_x - dest.x) as u64;
                let src_x = (dx * image.width() as u64 / dest.w as u64) as usize;
                let src_x = src_x.min(src_width - 1);
                let src_offset = src_row_offset + src_x * 4;
                let dst_offset = dst_row_offset + out_x as usize * 4;

                let source = [
                    src[src_offset],
                    src[src_offset + 1],
                    src[src_offset + 2],
                    src[src_offset + 3],
                ];
                blend_pixel(&mut self.rgba[dst_offset..dst_offset + 4], source, alpha);
            }
        }
    }
}

fn blend_pixel(dst: &mut [u8], src: [u8; 4], alpha: u8) {
    let a = src[3] as u32 * alpha as u32 / 255;
    if a == 0 {
        return;
    }
    if a == 255 {
        dst.copy_from_slice(&src);
        return;
    }
    let inv = 255 - a;
    for channel in 0..3 {
        dst[channel] = ((src[channel] as u32 * a + dst[channel] as u32 * inv) / 255) as u8;
    }
    dst[3] = (a + dst[3] as u32 * inv / 255).min(255) as u8;
}
