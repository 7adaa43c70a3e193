//! PrecedenceGraph - 先行関係の読み取り
//!
//! 循環検出はしない。その代わり、返す関係データは 1 段だけに制限して、
//! エッジ集合がどんな形（A→B→A を含む）でも必ず終了するようにしている。

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::{EdgeDirection, OrdoError, PrecedenceEdge, Task, TaskId};
use crate::ports::TaskStore;

/// Relation data is populated this many levels below the requested task.
pub const PRECEDENCE_HOPS: usize = 1;

/// A neighbouring task with its own relations, ids only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkedTask {
    pub task: Task,
    /// Tasks that come before `task`.
    pub before: Vec<TaskId>,
    /// Tasks that come after `task`.
    pub after: Vec<TaskId>,
}

/// Read side of the precedence edges.
///
/// Soft-deleted edges, and edges whose far end is missing or trashed, are
/// invisible in both directions.
#[derive(Clone)]
pub struct PrecedenceGraph {
    store: Arc<dyn TaskStore>,
}

impl PrecedenceGraph {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Tasks that must happen after `task_id`.
    pub async fn successors(&self, task_id: TaskId) -> Result<Vec<LinkedTask>, OrdoError> {
        self.expand(task_id, EdgeDirection::Successors).await
    }

    /// Tasks that must happen before `task_id`.
    pub async fn predecessors(&self, task_id: TaskId) -> Result<Vec<LinkedTask>, OrdoError> {
        self.expand(task_id, EdgeDirection::Predecessors).await
    }

    /// Live edges of `task_id` in `direction` whose far end is a live task.
    pub async fn live_edges(
        &self,
        task_id: TaskId,
        direction: EdgeDirection,
    ) -> Result<Vec<(PrecedenceEdge, Task)>, OrdoError> {
        let mut out = Vec::new();
        for edge in self.store.list_edges(task_id, direction).await? {
            if !edge.is_live() {
                continue;
            }
            match self.store.get_task(edge.far_end(direction)).await? {
                Some(task) if task.is_live() => out.push((edge, task)),
                _ => {}
            }
        }
        Ok(out)
    }

    async fn expand(
        &self,
        task_id: TaskId,
        direction: EdgeDirection,
    ) -> Result<Vec<LinkedTask>, OrdoError> {
        let root = self
            .store
            .get_task(task_id)
            .await?
            .ok_or_else(|| OrdoError::not_found("task", task_id))?;
        if !root.is_live() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (_, task) in self.live_edges(task_id, direction).await? {
            // duplicate edges between the same pair collapse to one entry
            if !seen.insert(task.id) {
                continue;
            }
            let before = self.neighbour_ids(task.id, EdgeDirection::Predecessors).await?;
            let after = self.neighbour_ids(task.id, EdgeDirection::Successors).await?;
            out.push(LinkedTask {
                task,
                before,
                after,
            });
        }
        tracing::debug!(
            task_id = %task_id,
            ?direction,
            count = out.len(),
            hops = PRECEDENCE_HOPS,
            "expanded precedence"
        );
        Ok(out)
    }

    async fn neighbour_ids(
        &self,
        task_id: TaskId,
        direction: EdgeDirection,
    ) -> Result<Vec<TaskId>, OrdoError> {
        let mut ids = Vec::new();
        for (_, task) in self.live_edges(task_id, direction).await? {
            if !ids.contains(&task.id) {
                ids.push(task.id);
            }
        }
        Ok(ids)
    }
}
