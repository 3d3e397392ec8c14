mod frame;
mod metrics;
mod world;

pub use frame::{FrameDriver, FrameReport, DEFAULT_TICKS_PER_FRAME};
pub use metrics::{FrameMetricsAccumulator, FrameMetricsSnapshot};
pub use world::World;
