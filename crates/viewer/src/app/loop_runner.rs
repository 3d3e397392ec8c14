use std::process::ExitCode;
use std::time::{Duration, Instant};

use tileview::{
    FrameBuffer, FrameDriver, FrameMetricsAccumulator, FrameMetricsSnapshot, RenderTarget, World,
};
use tracing::{error, info};

use crate::config::ViewerConfig;

use super::bootstrap::{ViewerError, ViewerWiring};

pub(crate) fn run(mut app: ViewerWiring) -> ExitCode {
    match run_frames(&app.config, &mut app.world) {
        Ok(summary) => {
            info!(
                frames = summary.frames,
                frame_time_ms = summary.frame_time_ms,
                draw_calls_per_frame = summary.draw_calls_per_frame,
                evictions = summary.evictions,
                "viewer_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "viewer_failed");
            ExitCode::FAILURE
        }
    }
}

/// Runs the configured number of frames headless and writes the last one
/// to the output PNG. Returns metrics over the whole run.
pub(crate) fn run_frames(
    config: &ViewerConfig,
    world: &mut World,
) -> Result<FrameMetricsSnapshot, ViewerError> {
    let viewport = world.view().viewport();
    let mut target = FrameBuffer::new(
        viewport.right().max(1) as u32,
        viewport.bottom().max(1) as u32,
    );
    let mut driver = FrameDriver::new(config.ticks_per_frame);
    let mut interval_metrics =
        FrameMetricsAccumulator::new(Duration::from_millis(config.metrics_interval_ms.max(1)));
    let mut run_metrics = FrameMetricsAccumulator::new(Duration::ZERO);

    for _ in 0..config.frames {
        target.clear(config.clear_color);
        let report = driver.run_frame(world, &mut target);
        interval_metrics.record_frame(&report);
        run_metrics.record_frame(&report);
        if let Some(snapshot) = interval_metrics.maybe_snapshot(Instant::now()) {
            log_metrics(&snapshot, world);
        }
    }

    let summary = run_metrics.snapshot(Instant::now());
    target
        .save_png(&config.output)
        .map_err(|source| ViewerError::WriteFrame {
            path: config.output.clone(),
            source,
        })?;
    info!(
        path = %config.output.display(),
        width = target.width(),
        height = target.height(),
        "frame_written"
    );
    Ok(summary)
}

fn log_metrics(snapshot: &FrameMetricsSnapshot, world: &World) {
    let cache = world.cache().stats();
    info!(
        fps = snapshot.fps,
        frame_time_ms = snapshot.frame_time_ms,
        draw_calls_per_frame = snapshot.draw_calls_per_frame,
        evictions = snapshot.evictions,
        cache_alive = cache.alive,
        cache_total = cache.total,
        "frame_metrics"
    );
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::app::bootstrap::build_world;
    use tempfile::TempDir;

    #[test]
    fn demo_run_writes_the_last_frame() {
        let temp = TempDir::new().expect("temp");
        let config = ViewerConfig {
            frames: 3,
            output: temp.path().join("out").join("frame.png"),
            ..ViewerConfig::default()
        };
        fs::create_dir_all(temp.path().join("out")).expect("out dir");
        let mut world = build_world(&config, temp.path().to_path_buf()).expect("world");

        let summary = run_frames(&config, &mut world).expect("run");
        assert_eq!(summary.frames, 3);
        assert!(summary.draw_calls_per_frame > 0.0);
        let written = fs::metadata(&config.output).expect("png written");
        assert!(written.len() > 0);
    }

    #[test]
    fn unwritable_output_is_reported() {
        let temp = TempDir::new().expect("temp");
        let config = ViewerConfig {
            frames: 1,
            output: temp.path().join("missing_dir").join("frame.png"),
            ..ViewerConfig::default()
        };
        let mut world = build_world(&config, temp.path().to_path_buf()).expect("world");

        let error = run_frames(&config, &mut world).expect_err("no such directory");
        assert!(matches!(error, ViewerError::WriteFrame { .. }));
    }
}
