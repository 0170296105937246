//! UCB1 bandit that learns which free model ("expert") to route requests to.

#[cfg(feature = "s3")]
mod s3;
mod storage;

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

#[cfg(feature = "s3")]
pub use s3::S3Storage;
pub use storage::{CheckpointStorage, LocalFileStorage, StorageError, StorageResult};

/// Checkpoint object name used when none is configured.
pub const DEFAULT_CHECKPOINT_KEY: &str = "router_state.json";

/// A routable expert, e.g. one free LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expert {
    /// Unique id, the OpenRouter model id.
    pub id: String,
    #[serde(default)]
    /// Free-form details stored alongside the checkpoint.
    pub metadata: Option<Map<String, Value>>,
}

impl Expert {
    /// Expert without metadata.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: None,
        }
    }
}

/// Running reward statistics for one expert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpertStats {
    /// Number of recorded rewards.
    pub pulls: u64,
    /// Sum of recorded rewards.
    pub reward_sum: f64,
}

impl ExpertStats {
    /// Average reward, zero before the first pull.
    pub fn mean_reward(&self) -> f64 {
        if self.pulls == 0 {
            0.0
        } else {
            self.reward_sum / self.pulls as f64
        }
    }
}

/// Tuning knobs of [`UcbRouter`].
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Object name the checkpoint is stored under.
    pub checkpoint_key: String,
    /// Experts pulled fewer times than this are always explored first.
    pub min_pulls: u64,
    /// Weight of the confidence bonus.
    pub exploration: f64,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            checkpoint_key: DEFAULT_CHECKPOINT_KEY.to_string(),
            min_pulls: 1,
            exploration: 1.4,
        }
    }
}

/// Failures raised by the router.
#[derive(Debug, Error)]
pub enum RouterError {
    /// There is nothing to route to.
    #[error("no experts available")]
    NoExperts,
    /// The checkpoint backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// A stored checkpoint could not be parsed, or state could not be encoded.
    #[error("invalid router checkpoint `{key}`")]
    Checkpoint {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result alias for router operations.
pub type RouterResult<T> = Result<T, RouterError>;

#[derive(Deserialize)]
struct Checkpoint {
    #[serde(default)]
    state: IndexMap<String, ExpertStats>,
}

#[derive(Serialize)]
struct CheckpointRef<'a> {
    experts: &'a [Expert],
    state: &'a IndexMap<String, ExpertStats>,
}

/// Upper Confidence Bound (UCB1) router with optional checkpointing.
pub struct UcbRouter {
    experts: Vec<Expert>,
    storage: Option<Arc<dyn CheckpointStorage>>,
    options: RouterOptions,
    state: IndexMap<String, ExpertStats>,
}

impl UcbRouter {
    /// Build a router over `experts`, restoring statistics from `storage` when a checkpoint exists.
    pub async fn open(
        experts: impl IntoIterator<Item = Expert>,
        storage: Option<Arc<dyn CheckpointStorage>>,
        options: RouterOptions,
    ) -> RouterResult<Self> {
        let experts: Vec<Expert> = experts.into_iter().collect();
        let state = experts
            .iter()
            .map(|expert| (expert.id.clone(), ExpertStats::default()))
            .collect();

        let mut router = Self {
            experts,
            storage,
            options,
            state,
        };
        router.load().await?;
        Ok(router)
    }

    /// Experts in selection order.
    pub fn experts(&self) -> &[Expert] {
        &self.experts
    }

    /// Options the router was opened with.
    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    /// Statistics keyed by expert id, including ids restored from a checkpoint.
    pub fn state(&self) -> &IndexMap<String, ExpertStats> {
        &self.state
    }

    /// Statistics of one expert.
    pub fn stats(&self, expert_id: &str) -> Option<&ExpertStats> {
        self.state.get(expert_id)
    }

    /// Pick the next expert to call.
    ///
    /// Before any reward is recorded the first expert is returned. Ties resolve to the expert
    /// listed first.
    pub fn select(&self) -> RouterResult<&Expert> {
        let (first, rest) = self.experts.split_first().ok_or(RouterError::NoExperts)?;

        let total_pulls: u64 = self.state.values().map(|stats| stats.pulls).sum();
        if total_pulls == 0 {
            return Ok(first);
        }

        let mut best = first;
        let mut best_score = self.score(first, total_pulls);
        for expert in rest {
            let score = self.score(expert, total_pulls);
            if score > best_score {
                best = expert;
                best_score = score;
            }
        }
        debug!(expert = %best.id, score = best_score, "selected expert");
        Ok(best)
    }

    fn score(&self, expert: &Expert, total_pulls: u64) -> f64 {
        let stats = self.state.get(&expert.id).copied().unwrap_or_default();
        if stats.pulls < self.options.min_pulls || stats.pulls == 0 {
            return f64::INFINITY;
        }
        let bonus = ((total_pulls as f64).ln() / stats.pulls as f64).sqrt();
        stats.mean_reward() + self.options.exploration * bonus
    }

    /// Record the outcome of calling `expert_id` and checkpoint the new state.
    pub async fn record_reward(&mut self, expert_id: &str, reward: f64) -> RouterResult<()> {
        let stats = self.state.entry(expert_id.to_string()).or_default();
        stats.pulls += 1;
        stats.reward_sum += reward;
        self.save().await
    }

    async fn save(&self) -> RouterResult<()> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };
        let key = &self.options.checkpoint_key;
        let payload = serde_json::to_vec(&CheckpointRef {
            experts: &self.experts,
            state: &self.state,
        })
        .map_err(|source| RouterError::Checkpoint {
            key: key.clone(),
            source,
        })?;
        storage.save(key, payload).await?;
        Ok(())
    }

    async fn load(&mut self) -> RouterResult<()> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };
        let key = &self.options.checkpoint_key;
        let Some(raw) = storage.load(key).await? else {
            return Ok(());
        };
        if raw.is_empty() {
            return Ok(());
        }

        let checkpoint: Checkpoint =
            serde_json::from_slice(&raw).map_err(|source| RouterError::Checkpoint {
                key: key.clone(),
                source,
            })?;
        info!(key = %key, experts = checkpoint.state.len(), "restored router checkpoint");
        self.state.extend(checkpoint.state);
        Ok(())
    }
}
