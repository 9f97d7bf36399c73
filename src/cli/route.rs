//! CLI route: single route table and run context. Dispatches to the runner,
//! store and observer, then hands results to presentation.

use crate::cli::help::command_name;
use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{
    format_progress_line, format_project_json, format_project_list_json,
    format_project_list_text, format_project_text, format_run_outcome,
};
use crate::config::{ConfigLoader, ScrivenerConfig};
use crate::error::{ApiError, StorageError};
use crate::pipeline::{PipelineRunner, StartRequest};
use crate::progress::{ProgressObserver, ProgressStore};
use crate::provider::Credential;
use crate::types::ProjectId;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Runtime context for CLI execution: workspace, merged config and the open store.
pub struct RunContext {
    workspace_root: PathBuf,
    config: ScrivenerConfig,
    store: Arc<ProgressStore>,
}

impl RunContext {
    /// Load config for `workspace_root` (plus an optional explicit file) and open the store.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = ConfigLoader::load_with_file(&workspace_root, config_path.as_deref())?;
        Self::from_config(workspace_root, config)
    }

    pub fn from_config(workspace_root: PathBuf, config: ScrivenerConfig) -> Result<Self, ApiError> {
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;

        let store_path = &config.storage.path;
        std::fs::create_dir_all(store_path)
            .map_err(|e| ApiError::StorageError(StorageError::IoError(e)))?;
        let store = Arc::new(ProgressStore::open(store_path)?);
        debug!(store_path = %store_path.display(), "progress store opened");

        for stalled in store.list_stalled()? {
            warn!(
                project_id = %stalled.id,
                status = %stalled.status,
                "project stalled; run 'scrivener resume {}' to continue",
                stalled.id
            );
        }

        Ok(Self {
            workspace_root,
            config,
            store,
        })
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn config(&self) -> &ScrivenerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<ProgressStore> {
        &self.store
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        info!(command = command_name(command), "executing command");
        match command {
            Commands::List { format } => self.handle_list(*format),
            Commands::Show { id, format } => self.handle_show(*id, *format),
            Commands::Start { .. } | Commands::Resume { .. } | Commands::Watch { .. } => {
                let rt = tokio::runtime::Runtime::new().map_err(|e| {
                    ApiError::PipelineFailed(format!("Failed to create async runtime: {}", e))
                })?;
                rt.block_on(self.execute_async(command))
            }
        }
    }

    async fn execute_async(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Start {
                title,
                chapters,
                model,
                api_key,
            } => {
                let request = StartRequest {
                    title: title.clone(),
                    target_length: *chapters,
                    model: self.model(model.as_deref()),
                    credential: self.credential(api_key.as_deref())?,
                };
                self.handle_start(request).await
            }
            Commands::Resume { id, model, api_key } => {
                let credential = self.credential(api_key.as_deref())?;
                self.handle_resume(*id, self.model(model.as_deref()), &credential)
                    .await
            }
            Commands::Watch { id } => self.handle_watch(*id).await,
            Commands::List { format } => self.handle_list(*format),
            Commands::Show { id, format } => self.handle_show(*id, *format),
        }
    }

    fn handle_list(&self, format: OutputFormat) -> Result<String, ApiError> {
        let projects = self.store.list()?;
        Ok(match format {
            OutputFormat::Text => format_project_list_text(&projects),
            OutputFormat::Json => format_project_list_json(&projects),
        })
    }

    fn handle_show(&self, id: ProjectId, format: OutputFormat) -> Result<String, ApiError> {
        let project = self.store.get(id)?;
        Ok(match format {
            OutputFormat::Text => format_project_text(&project),
            OutputFormat::Json => format_project_json(&project),
        })
    }

    async fn handle_start(&self, request: StartRequest) -> Result<String, ApiError> {
        let runner = self.runner();
        let id = runner.start(request)?;
        println!("Started project {}", id);
        self.follow_run(&runner, id).await
    }

    async fn handle_resume(
        &self,
        id: ProjectId,
        model: String,
        credential: &Credential,
    ) -> Result<String, ApiError> {
        let runner = self.runner();
        runner.resume(id, model, credential)?;
        println!("Resuming project {}", id);
        self.follow_run(&runner, id).await
    }

    async fn handle_watch(&self, id: ProjectId) -> Result<String, ApiError> {
        let last = self
            .observer()
            .follow(id, |project| println!("{}", format_progress_line(project)))
            .await?;
        Ok(format_run_outcome(&last))
    }

    /// Print progress lines until the run of `id` ends, then report its outcome.
    async fn follow_run(&self, runner: &PipelineRunner, id: ProjectId) -> Result<String, ApiError> {
        let mut watcher = self.spawn_watcher(id);
        let outcome = runner.wait(id).await;

        // The watcher exits on its next poll after the terminal write.
        let grace = self.config.observer.poll_interval() * 2;
        if tokio::time::timeout(grace, &mut watcher).await.is_err() {
            watcher.abort();
        }

        outcome?;
        let project = self.store.get(id)?;
        Ok(format_run_outcome(&project))
    }

    fn spawn_watcher(&self, id: ProjectId) -> JoinHandle<()> {
        let observer = self.observer();
        tokio::spawn(async move {
            let followed = observer
                .follow(id, |project| println!("{}", format_progress_line(project)))
                .await;
            if let Err(e) = followed {
                warn!(project_id = %id, error = %e, "progress watcher stopped");
            }
        })
    }

    fn runner(&self) -> PipelineRunner {
        PipelineRunner::with_provider(
            self.store.clone(),
            self.config.pipeline.settings(),
            self.config.pipeline.selection_check,
            self.config.provider.clone(),
        )
    }

    fn observer(&self) -> ProgressObserver {
        ProgressObserver::new(self.store.clone(), self.config.observer.poll_interval())
    }

    fn model(&self, flag: Option<&str>) -> String {
        flag.map(str::to_string)
            .unwrap_or_else(|| self.config.provider.model.clone())
    }

    /// `--api-key` wins over `provider.api_key` from config.
    fn credential(&self, flag: Option<&str>) -> Result<Credential, ApiError> {
        let secret = flag
            .map(str::to_string)
            .or_else(|| self.config.provider.api_key.clone())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ApiError::InvalidInput(
                    "no API key: pass --api-key or set provider.api_key \
                     (SCRIVENER__PROVIDER__API_KEY)"
                        .to_string(),
                )
            })?;
        Ok(Credential::new(secret))
    }
}
