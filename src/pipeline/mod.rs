//! Chapter pipeline: per-project driver and the runner that owns its tasks.
//! The driver is the only writer of a project while a run is active; the runner enforces that.

pub mod driver;
pub mod plan;
pub mod runner;

pub use driver::PipelineDriver;
pub use plan::{PipelineSettings, RunOutcome, StartRequest, MAX_TARGET_LENGTH};
pub use runner::{ClientFactory, PipelineRunner};
