mod app;
mod config;

use std::process::ExitCode;

use tracing::error;

fn main() -> ExitCode {
    match app::build_viewer() {
        Ok(viewer) => app::run(viewer),
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}
