//! Executor: run a plan strictly in order.
//!
//! Plan order already encodes dependency order, so the executor never
//! reorders. For every live node the `read` hook runs first; the decided
//! hook (`create`/`update`, nothing for NOOP) follows; only after the
//! hook returned successfully is the store mutation committed. A hook or
//! store failure halts the remainder of the plan: the returned report
//! holds exactly the committed events plus the failure, and nodes not
//! yet reached are left untouched.
//!
//! A store failure after a successful hook leaves the side effect
//! unrecorded; the next apply will classify the node as new or stale.
//! This inconsistency window is accepted and not corrected automatically.

use tracing::{debug, info, warn};

use crate::plan::{Action, ActionFailure, ActionKind, Plan, Report};
use crate::store::StateStore;
use crate::types::StateRecord;

/// Runs plans against a state store.
pub struct Executor<'a> {
    store: &'a dyn StateStore,
}

impl<'a> Executor<'a> {
    /// Create an executor over a store.
    pub fn new(store: &'a dyn StateStore) -> Self {
        Self { store }
    }

    /// Execute the plan. Always returns a report; a failure is recorded
    /// in the report rather than propagated, so callers see exactly what
    /// was committed before the halt.
    pub async fn execute(&self, plan: &Plan) -> Report {
        let mut report = Report::default();
        for action in &plan.actions {
            debug!(kind = %action.kind, identity = %action.identity, "executing action");
            if let Err(failure) = self.run_action(action, &mut report).await {
                warn!(
                    kind = %failure.kind,
                    identity = %failure.identity,
                    reason = %failure.reason,
                    "action failed; halting plan"
                );
                report.failure = Some(failure);
                return report;
            }
        }
        info!(events = report.events.len(), "plan executed");
        report
    }

    async fn run_action(
        &self,
        action: &Action,
        report: &mut Report,
    ) -> std::result::Result<(), ActionFailure> {
        let fail = |kind: ActionKind, reason: String| ActionFailure {
            kind,
            identity: action.identity.to_string(),
            reason,
        };

        match action.kind {
            ActionKind::Create | ActionKind::Update | ActionKind::Noop => {
                let Some(node) = &action.node else {
                    return Err(fail(action.kind, "live action carries no node".to_string()));
                };

                node.read()
                    .await
                    .map_err(|e| fail(ActionKind::Read, e.to_string()))?;
                report.push(ActionKind::Read, action.identity.to_string());

                match action.kind {
                    ActionKind::Create => {
                        node.create()
                            .await
                            .map_err(|e| fail(ActionKind::Create, e.to_string()))?;
                        self.commit(action)
                            .await
                            .map_err(|e| fail(ActionKind::Create, e.to_string()))?;
                        report.push(ActionKind::Create, action.detail());
                    }
                    ActionKind::Update => {
                        node.update()
                            .await
                            .map_err(|e| fail(ActionKind::Update, e.to_string()))?;
                        self.commit(action)
                            .await
                            .map_err(|e| fail(ActionKind::Update, e.to_string()))?;
                        report.push(ActionKind::Update, action.detail());
                    }
                    // NOOP: the read already happened; no store mutation.
                    _ => {}
                }
            }
            ActionKind::Delete => {
                if let Some(node) = &action.node {
                    node.delete()
                        .await
                        .map_err(|e| fail(ActionKind::Delete, e.to_string()))?;
                }
                self.store
                    .delete(&action.identity)
                    .await
                    .map_err(|e| fail(ActionKind::Delete, e.to_string()))?;
                report.push(ActionKind::Delete, action.detail());
            }
            // READ never appears as a standalone planned action.
            ActionKind::Read => {}
        }
        Ok(())
    }

    /// Durably record a successful CREATE/UPDATE.
    async fn commit(&self, action: &Action) -> crate::error::Result<()> {
        let Some(full_digest) = action.full_digest else {
            return Err(crate::error::Error::store_failed(
                "live action carries no full digest",
            ));
        };
        let record = StateRecord::new(
            action.identity.clone(),
            full_digest,
            action.child_keys.clone(),
        );
        self.store.put(&action.identity, record).await
    }
}
