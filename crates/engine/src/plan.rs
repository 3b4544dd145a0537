//! Plan and report types.
//!
//! A [`Plan`] is an ordered sequence of [`Action`]s whose order already
//! encodes dependency order; the executor never reorders it. A
//! [`Report`] is the ordered list of events that actually ran, plus the
//! failure that halted execution, if any.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::component::Component;
use crate::types::{Digest, Identity};

/// Kind of an action or report event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Create,
    Read,
    Update,
    Delete,
    Noop,
}

impl ActionKind {
    /// Upper-case rendering used in report lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Read => "READ",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Noop => "NOOP",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One planned operation against one identity.
#[derive(Clone)]
pub struct Action {
    /// What to do.
    pub kind: ActionKind,
    /// The identity the action targets.
    pub identity: Identity,
    /// The live component whose hooks run. `None` only for orphan
    /// deletions with no surviving node of the same type and label.
    pub node: Option<Arc<dyn Component>>,
    /// Direct subcomponent count, for reporting.
    pub deps: usize,
    /// Identity keys of direct subcomponents, persisted into the state
    /// record on CREATE/UPDATE.
    pub child_keys: Vec<String>,
    /// Full-state digest to persist on CREATE/UPDATE.
    pub full_digest: Option<Digest>,
}

impl Action {
    /// Report detail string:
    /// `{type_name}/{label}/{short breaking digest}[: deps→N]`.
    pub fn detail(&self) -> String {
        if self.deps > 0 {
            format!("{}: deps→{}", self.identity, self.deps)
        } else {
            self.identity.to_string()
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("kind", &self.kind)
            .field("identity", &self.identity.to_string())
            .field("deps", &self.deps)
            .finish_non_exhaustive()
    }
}

/// Ordered sequence of actions reconciling a desired graph with the
/// persisted state.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub actions: Vec<Action>,
}

impl Plan {
    /// Number of actions, NOOPs included.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the plan holds no actions at all.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Whether the plan would change anything (any non-NOOP action).
    pub fn has_changes(&self) -> bool {
        self.actions.iter().any(|a| a.kind != ActionKind::Noop)
    }

    /// Human-readable rendering: one line per non-NOOP action.
    pub fn render(&self) -> Vec<String> {
        self.actions
            .iter()
            .filter(|a| a.kind != ActionKind::Noop)
            .map(|a| format!("{} {}", a.kind, a.detail()))
            .collect()
    }
}

/// One executed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEvent {
    pub kind: ActionKind,
    pub detail: String,
}

/// The failure that halted execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionFailure {
    pub kind: ActionKind,
    pub identity: String,
    pub reason: String,
}

/// Ordered record of what an apply/destroy run actually did.
///
/// On failure the events list holds exactly the committed actions;
/// everything after the failing action was never attempted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    pub events: Vec<ReportEvent>,
    pub failure: Option<ActionFailure>,
}

impl Report {
    /// Whether the whole plan ran to completion.
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// Append an event row.
    pub(crate) fn push(&mut self, kind: ActionKind, detail: impl Into<String>) {
        self.events.push(ReportEvent {
            kind,
            detail: detail.into(),
        });
    }

    /// Events of a given kind.
    pub fn events_of(&self, kind: ActionKind) -> Vec<&ReportEvent> {
        self.events.iter().filter(|e| e.kind == kind).collect()
    }
}
