//! Shared test utilities for integration tests
//!
//! Environment isolation for config lookups, plus a deterministic generation
//! client that stands in for the remote model.

use async_trait::async_trait;
use parking_lot::Mutex;
use scrivener::error::GenerationFailure;
use scrivener::provider::{ChatMessage, GenerationClient};
use std::collections::HashSet;
use std::sync::Mutex as StdMutex;
use tempfile::TempDir;

/// Global mutex to serialize environment variable access across all tests
static XDG_ENV_MUTEX: StdMutex<()> = StdMutex::new(());

const ISOLATED_VARS: [&str; 4] = ["HOME", "XDG_CONFIG_HOME", "XDG_DATA_HOME", "SCRIVENER_ENV"];

/// Environment variable state to restore after test
struct EnvState {
    saved: Vec<(&'static str, Option<String>)>,
}

impl EnvState {
    fn capture() -> Self {
        Self {
            saved: ISOLATED_VARS
                .iter()
                .map(|key| (*key, std::env::var(key).ok()))
                .collect(),
        }
    }

    fn restore(self) {
        for (key, value) in self.saved {
            match value {
                Some(orig) => std::env::set_var(key, orig),
                None => std::env::remove_var(key),
            }
        }
    }
}

/// Run `f` with HOME, XDG_CONFIG_HOME and XDG_DATA_HOME inside `test_dir`
/// and SCRIVENER_ENV unset, restoring the environment afterwards.
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = XDG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let env_state = EnvState::capture();

    let test_config_home = test_dir.path().join("config-home");
    let test_data_home = test_dir.path().join("data");
    let test_home = test_dir.path().join("home");
    for dir in [&test_config_home, &test_data_home, &test_home] {
        std::fs::create_dir_all(dir).unwrap();
    }

    std::env::set_var("HOME", &test_home);
    std::env::set_var("XDG_CONFIG_HOME", &test_config_home);
    std::env::set_var("XDG_DATA_HOME", &test_data_home);
    std::env::remove_var("SCRIVENER_ENV");

    let result = f();

    env_state.restore();

    result
}

/// One recorded call to [`StoryClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Draft { unit: u32 },
    Selection { unit: u32 },
}

/// Deterministic model stand-in.
///
/// Draft calls are numbered globally from 1 and reply
/// `"chapter {unit} draft {n}"`. Selection calls reply with the second draft
/// shown in the prompt (or the first when there is only one).
#[derive(Default)]
pub struct StoryClient {
    failing_drafts: HashSet<usize>,
    failing_selections: HashSet<u32>,
    calls: Mutex<Vec<Call>>,
    draft_count: Mutex<usize>,
}

impl StoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`th draft call (1-based, counted across all chapters).
    pub fn failing_draft(mut self, n: usize) -> Self {
        self.failing_drafts.insert(n);
        self
    }

    pub fn failing_selection(mut self, unit: u32) -> Self {
        self.failing_selections.insert(unit);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }
}

fn chapter_after(text: &str, marker: &str) -> u32 {
    text.split(marker)
        .nth(1)
        .map(|rest| {
            rest.chars()
                .take_while(|c| c.is_ascii_digit())
                .collect::<String>()
        })
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}

#[async_trait]
impl GenerationClient for StoryClient {
    async fn generate(
        &self,
        _model: &str,
        conversation: Vec<ChatMessage>,
    ) -> Result<String, GenerationFailure> {
        let prompt = conversation
            .last()
            .map(|turn| turn.content.clone())
            .unwrap_or_default();

        if prompt.contains("--- Draft 1 ---") {
            let unit = chapter_after(&prompt, "written for chapter ");
            self.calls.lock().push(Call::Selection { unit });
            if self.failing_selections.contains(&unit) {
                return Err(GenerationFailure::RequestFailed("editor unavailable".to_string()));
            }
            let pick = if prompt.contains("--- Draft 2 ---") { 2 } else { 1 };
            let chosen = prompt
                .split(&format!("--- Draft {} ---\n", pick))
                .nth(1)
                .and_then(|rest| rest.split("\n\n").next())
                .unwrap_or_default();
            return Ok(chosen.to_string());
        }

        let unit = chapter_after(&prompt, "write chapter ");
        self.calls.lock().push(Call::Draft { unit });
        let n = {
            let mut count = self.draft_count.lock();
            *count += 1;
            *count
        };
        if self.failing_drafts.contains(&n) {
            return Err(GenerationFailure::RateLimited(format!("draft {} throttled", n)));
        }
        Ok(format!("chapter {} draft {}", unit, n))
    }

    fn provider_name(&self) -> &str {
        "story"
    }
}
