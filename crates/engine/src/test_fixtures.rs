use std::fs;
use std::path::{Path, PathBuf};

use crate::geometry::Rect;
use crate::video::{RenderTarget, StaticImage};

pub(crate) fn write_png(root: &Path, rel: &str, width: u32, height: u32, color: [u8; 4]) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture dir");
    }
    image::RgbaImage::from_pixel(width, height, image::Rgba(color))
        .save_with_format(&path, image::ImageFormat::Png)
        .expect("write png fixture");
    path
}

pub(crate) fn write_file(root: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture dir");
    }
    fs::write(&path, contents).expect("write fixture");
    path
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DrawCall {
    pub dest: Rect,
    pub alpha: u8,
    pub size: (u32, u32),
    pub color: Option<[u8; 4]>,
}

/// Render target that records draw calls instead of touching pixels.
#[derive(Debug, Default)]
pub(crate) struct RecordingTarget {
    pub width: u32,
    pub height: u32,
    pub draws: Vec<DrawCall>,
    pub clips: Vec<Option<Rect>>,
}

impl RecordingTarget {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn draws_with_color(&self, color: [u8; 4]) -> Vec<&DrawCall> {
        self.draws
            .iter()
            .filter(|draw| draw.color == Some(color))
            .collect()
    }
}

impl RenderTarget for RecordingTarget {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn draw_image(&mut self, image: &StaticImage, dest: Rect, alpha: u8) {
        self.draws.push(DrawCall {
            dest,
            alpha,
            size: (image.width(), image.height()),
            color: image.pixel(0, 0),
        });
    }

    fn set_clip(&mut self, clip: Option<Rect>) {
        self.clips.push(clip);
    }
}
