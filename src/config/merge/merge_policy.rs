//! Merge rules: built-in defaults sit below every file and environment source.

use crate::config::default_store_path;
use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("pipeline.candidate_count", 3)?
        .set_default("pipeline.dispatch_pacing_ms", 1000)?
        .set_default("pipeline.unit_pacing_ms", 1000)?
        .set_default("pipeline.selection_check", "trust")?
        .set_default("observer.poll_interval_ms", 2000)?
        .set_default(
            "storage.path",
            default_store_path().to_string_lossy().into_owned(),
        )
}
