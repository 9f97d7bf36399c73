//! Workspace files: `<root>/config/config.toml`, then `<root>/config/<env>.toml`
//! where `<env>` comes from `SCRIVENER_ENV`.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ENVIRONMENT_VAR: &str = "SCRIVENER_ENV";
pub const DEFAULT_ENVIRONMENT: &str = "development";

const CONFIG_DIR: &str = "config";
const BASE_FILE: &str = "config.toml";

/// Environment name for the env-specific file; blank values fall back to the default.
pub fn environment_name() -> String {
    resolve_environment(std::env::var(ENVIRONMENT_VAR).ok())
}

fn resolve_environment(raw: Option<String>) -> String {
    raw.map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
}

/// Existing workspace files for `environment`, lowest precedence first.
fn layered_files(workspace_root: &Path, environment: &str) -> Vec<PathBuf> {
    let dir = workspace_root.join(CONFIG_DIR);
    [dir.join(BASE_FILE), dir.join(format!("{}.toml", environment))]
        .into_iter()
        .filter(|path| path.is_file())
        .collect()
}

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let environment = environment_name();
    let files = layered_files(workspace_root, &environment);
    if files.is_empty() {
        debug!(workspace = %workspace_root.display(), environment = %environment, "no workspace configuration files");
    }
    Ok(files.into_iter().fold(builder, |builder, path| {
        debug!(config_path = %path.display(), "layering workspace configuration");
        builder.add_source(File::from(path).required(false))
    }))
}
