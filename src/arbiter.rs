//! Candidate Arbiter
//!
//! Picks exactly one of several candidate drafts by asking the generation
//! client once. The model is instructed to reply with one draft verbatim;
//! [`SelectionCheck::RequireMatch`] additionally verifies that it did.

use crate::error::GenerationFailure;
use crate::prompt;
use crate::provider::GenerationClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// How much to trust the arbitration reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionCheck {
    /// Accept any non-empty reply as the chosen text.
    #[default]
    Trust,
    /// Fail unless the reply identifies exactly one candidate.
    RequireMatch,
}

#[async_trait]
pub trait Arbiter: Send + Sync {
    /// Choose one of `candidates` for chapter `unit`. `candidates` is non-empty
    /// and in dispatch order.
    async fn select_best(
        &self,
        model: &str,
        title: &str,
        unit: u32,
        context: &str,
        candidates: &[String],
    ) -> Result<String, GenerationFailure>;
}

/// Arbiter backed by a second model invocation.
pub struct CandidateArbiter {
    client: Arc<dyn GenerationClient>,
    check: SelectionCheck,
}

impl CandidateArbiter {
    pub fn new(client: Arc<dyn GenerationClient>, check: SelectionCheck) -> Self {
        Self { client, check }
    }
}

#[async_trait]
impl Arbiter for CandidateArbiter {
    async fn select_best(
        &self,
        model: &str,
        title: &str,
        unit: u32,
        context: &str,
        candidates: &[String],
    ) -> Result<String, GenerationFailure> {
        if candidates.is_empty() {
            return Err(GenerationFailure::NoCandidates);
        }

        let conversation = prompt::selection_conversation(title, unit, context, candidates);
        let reply = self.client.generate(model, conversation).await?;
        if reply.trim().is_empty() {
            return Err(GenerationFailure::EmptyResponse);
        }

        match self.check {
            SelectionCheck::Trust => Ok(reply),
            SelectionCheck::RequireMatch => match match_candidate(&reply, candidates) {
                Some(index) => {
                    debug!(unit, candidate = index + 1, "selection matched candidate");
                    Ok(candidates[index].clone())
                }
                None => {
                    warn!(unit, candidates = candidates.len(), "selection matched no candidate");
                    Err(GenerationFailure::UnmatchedSelection(candidates.len()))
                }
            },
        }
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Index of the candidate the reply refers to: an exact match after
/// whitespace normalization, or else the only candidate contained in it.
fn match_candidate(reply: &str, candidates: &[String]) -> Option<usize> {
    let reply = normalize(reply);
    let normalized: Vec<String> = candidates.iter().map(|c| normalize(c)).collect();

    if let Some(index) = normalized.iter().position(|c| *c == reply) {
        return Some(index);
    }

    let mut contained = normalized
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.is_empty() && reply.contains(c.as_str()))
        .map(|(index, _)| index);
    match (contained.next(), contained.next()) {
        (Some(index), None) => Some(index),
        _ => None,
    }
}
