mod map_view;

use thiserror::Error;

pub use map_view::{FrameStats, Layer, LayerVisibility, MapView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("elevation {index} does not exist (map has {count})")]
    UnknownElevation { index: usize, count: usize },
}
