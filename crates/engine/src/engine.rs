//! Engine façade: plan, apply, destroy.

use std::sync::Arc;

use tracing::info;

use crate::component::Component;
use crate::destroyer::{self, DestroyPolicy};
use crate::error::Result;
use crate::executor::Executor;
use crate::plan::{Plan, Report};
use crate::planner;
use crate::store::StateStore;

/// Configuration for the engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineConfig {
    /// Teardown ordering used by [`Engine::destroy`].
    pub destroy_policy: DestroyPolicy,
}

/// The reconciliation engine: a state store plus configuration.
pub struct Engine {
    store: Arc<dyn StateStore>,
    config: EngineConfig,
}

impl Engine {
    /// Create an engine with the default configuration.
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    /// Create an engine with an explicit configuration.
    pub fn with_config(store: Arc<dyn StateStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// The underlying state store.
    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Plan-only preview: diff the graph against the store without
    /// running any hook or mutating any state.
    pub async fn plan(&self, root: Arc<dyn Component>) -> Result<Plan> {
        planner::build_plan(root, self.store.as_ref()).await
    }

    /// Reconcile the graph rooted at `root` with the persisted state:
    /// plan, then execute. Structural errors return `Err` before any
    /// hook runs; execution failures are carried inside the report.
    pub async fn apply(&self, root: Arc<dyn Component>) -> Result<Report> {
        let plan = planner::build_plan(root, self.store.as_ref()).await?;
        if !plan.has_changes() {
            info!("no changes needed");
        }
        Ok(Executor::new(self.store.as_ref()).execute(&plan).await)
    }

    /// Tear down every node reachable from `root`, unconditionally,
    /// ordered by the configured [`DestroyPolicy`].
    pub async fn destroy(&self, root: Arc<dyn Component>) -> Result<Report> {
        let plan = destroyer::build_destroy_plan(root, self.config.destroy_policy)?;
        Ok(Executor::new(self.store.as_ref()).execute(&plan).await)
    }
}
