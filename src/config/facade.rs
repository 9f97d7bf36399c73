//! Entry point for loading a merged [`ScrivenerConfig`].

use super::merge::builder_with_defaults;
use super::sources::{environment, global_file, workspace_file};
use super::ScrivenerConfig;
use config::{ConfigError, File};
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for `workspace_root` from every layered source.
    pub fn load(workspace_root: &Path) -> Result<ScrivenerConfig, ConfigError> {
        Self::load_with_file(workspace_root, None)
    }

    /// Like [`ConfigLoader::load`], with an explicit file layered above the
    /// workspace files and below the environment. The explicit file must exist.
    pub fn load_with_file(
        workspace_root: &Path,
        explicit: Option<&Path>,
    ) -> Result<ScrivenerConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let mut builder = workspace_file::add_to_builder(builder, workspace_root)?;
        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Load a single file on top of the built-in defaults, ignoring every other source.
    pub fn load_from_file(path: &Path) -> Result<ScrivenerConfig, ConfigError> {
        builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
