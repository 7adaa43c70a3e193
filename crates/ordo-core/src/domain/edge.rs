//! Precedence edge: "subject should be done after target".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{EdgeId, TaskId};

/// Which side of a task's edges to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeDirection {
    /// Edges whose subject is the task; their targets come before it.
    Predecessors,
    /// Edges whose target is the task; their subjects come after it.
    Successors,
}

/// Directed edge. Advisory only: nothing blocks a write because of it.
///
/// There is no acyclicity check; readers bound their traversal instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecedenceEdge {
    pub id: EdgeId,
    pub subject: TaskId,
    pub target: TaskId,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl PrecedenceEdge {
    pub fn new(id: EdgeId, subject: TaskId, target: TaskId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            subject,
            target,
            created_at: now,
            deleted_at: None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    pub fn soft_delete(&mut self, now: DateTime<Utc>) {
        if self.deleted_at.is_none() {
            self.deleted_at = Some(now);
        }
    }

    pub fn connects(&self, subject: TaskId, target: TaskId) -> bool {
        self.subject == subject && self.target == target
    }

    /// The endpoint seen from `task` when reading in `direction`.
    pub fn far_end(&self, direction: EdgeDirection) -> TaskId {
        match direction {
            EdgeDirection::Predecessors => self.target,
            EdgeDirection::Successors => self.subject,
        }
    }
}
