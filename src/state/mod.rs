//! Shared state handed to every UI handler.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    dragon::Dragon,
    router::{CheckpointStorage, Expert, RouterOptions, RouterResult, UcbRouter},
};

/// Handle to [`AppState`] shared across handlers.
pub type SharedState = Arc<AppState>;

/// State shared by every UI request handler.
pub struct AppState {
    api_key: String,
    dragon: Arc<Dragon>,
    checkpoints: Option<Arc<dyn CheckpointStorage>>,
    router_options: RouterOptions,
    router_gate: Mutex<()>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// Without `checkpoints` the router starts from scratch on every request.
    pub fn new(
        api_key: impl Into<String>,
        dragon: Arc<Dragon>,
        checkpoints: Option<Arc<dyn CheckpointStorage>>,
    ) -> SharedState {
        Arc::new(Self {
            api_key: api_key.into(),
            dragon,
            checkpoints,
            router_options: RouterOptions::default(),
            router_gate: Mutex::new(()),
        })
    }

    /// Key clients must present; an empty key rejects every protected request.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Free-model listing.
    pub fn dragon(&self) -> &Dragon {
        &self.dragon
    }

    /// Build a router over `experts`, restoring learnt statistics from the checkpoint store.
    pub async fn open_router(&self, experts: Vec<Expert>) -> RouterResult<UcbRouter> {
        UcbRouter::open(
            experts,
            self.checkpoints.clone(),
            self.router_options.clone(),
        )
        .await
    }

    /// Serialises checkpoint read-modify-write cycles within this process.
    pub fn router_gate(&self) -> &Mutex<()> {
        &self.router_gate
    }
}
