mod bootstrap;
mod demo;
mod loop_runner;

pub(crate) use bootstrap::build_viewer;
pub(crate) use loop_runner::run;
