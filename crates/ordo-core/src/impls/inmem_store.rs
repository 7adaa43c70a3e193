//! InMemoryTaskStore - 開発用・テスト用の TaskStore
//!
//! # 実装詳細
//! - tokio の Mutex で状態全体を保護
//! - edge は forward / reverse の両方向インデックスで引ける
//! - `commit` は状態の複製に適用し、全部成功したときだけ差し替える（all-or-nothing）

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    EdgeDirection, EdgeId, PrecedenceEdge, RecurrenceRule, Task, TaskId, UserId,
};
use crate::ports::{Change, ChangeSet, StoreError, TaskStore};

/// Edge lookup by endpoint.
///
/// - `by_subject`: task -> edges where it is the subject (its predecessors)
/// - `by_target`: task -> edges where it is the target (its successors)
/// - Invariant: every edge id appears once in each map
#[derive(Debug, Clone, Default)]
struct EdgeIndex {
    by_subject: HashMap<TaskId, HashSet<EdgeId>>,
    by_target: HashMap<TaskId, HashSet<EdgeId>>,
}

impl EdgeIndex {
    fn insert(&mut self, edge: &PrecedenceEdge) {
        self.by_subject.entry(edge.subject).or_default().insert(edge.id);
        self.by_target.entry(edge.target).or_default().insert(edge.id);
    }

    /// Must update both maps to keep the invariant.
    fn remove(&mut self, edge: &PrecedenceEdge) {
        for (map, key) in [
            (&mut self.by_subject, edge.subject),
            (&mut self.by_target, edge.target),
        ] {
            if let Entry::Occupied(mut e) = map.entry(key) {
                e.get_mut().remove(&edge.id);
                if e.get().is_empty() {
                    e.remove_entry();
                }
            }
        }
    }

    fn edges_of(&self, task: TaskId, direction: EdgeDirection) -> Vec<EdgeId> {
        let map = match direction {
            EdgeDirection::Predecessors => &self.by_subject,
            EdgeDirection::Successors => &self.by_target,
        };
        map.get(&task)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    tasks: HashMap<TaskId, Task>,
    rules: HashMap<TaskId, RecurrenceRule>,
    edges: HashMap<EdgeId, PrecedenceEdge>,
    index: EdgeIndex,
}

impl StoreState {
    fn put_edge(&mut self, edge: PrecedenceEdge) {
        if let Some(previous) = self.edges.get(&edge.id) {
            let previous = previous.clone();
            self.index.remove(&previous);
        }
        self.index.insert(&edge);
        self.edges.insert(edge.id, edge);
    }

    fn apply(&mut self, change: Change) -> Result<(), StoreError> {
        match change {
            Change::SaveTask(task) => {
                self.tasks.insert(task.id, task);
            }
            Change::DeleteTask(id) => {
                if self.tasks.remove(&id).is_none() {
                    return Err(StoreError::Conflict(format!("{id} does not exist")));
                }
            }
            Change::SaveRule(rule) => {
                self.rules.insert(rule.task_id, rule);
            }
            Change::DeleteRule(task_id) => {
                self.rules.remove(&task_id);
            }
            Change::SaveEdge(edge) => self.put_edge(edge),
        }
        Ok(())
    }
}

/// InMemoryTaskStore は開発用の正本
///
/// # 使用例
/// ```ignore
/// let store = Arc::new(InMemoryTaskStore::new());
/// store.save_task(task).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows (trashed included). For tests and the demo.
    pub async fn task_count(&self) -> usize {
        self.state.lock().await.tasks.len()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn get_task(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.state.lock().await.tasks.get(&id).cloned())
    }

    async fn list_tasks(&self, owner: UserId) -> Result<Vec<Task>, StoreError> {
        let state = self.state.lock().await;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| t.owner == owner)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| (t.created_at, t.id));
        Ok(tasks)
    }

    async fn save_task(&self, task: Task) -> Result<(), StoreError> {
        self.state.lock().await.tasks.insert(task.id, task);
        Ok(())
    }

    async fn get_recurrence_rule(
        &self,
        task_id: TaskId,
    ) -> Result<Option<RecurrenceRule>, StoreError> {
        Ok(self.state.lock().await.rules.get(&task_id).cloned())
    }

    async fn save_recurrence_rule(&self, rule: RecurrenceRule) -> Result<(), StoreError> {
        self.state.lock().await.rules.insert(rule.task_id, rule);
        Ok(())
    }

    async fn list_edges(
        &self,
        task_id: TaskId,
        direction: EdgeDirection,
    ) -> Result<Vec<PrecedenceEdge>, StoreError> {
        let state = self.state.lock().await;
        let mut edges: Vec<PrecedenceEdge> = state
            .index
            .edges_of(task_id, direction)
            .into_iter()
            .filter_map(|id| state.edges.get(&id).cloned())
            .collect();
        edges.sort_by_key(|e| (e.created_at, e.id));
        Ok(edges)
    }

    async fn save_edge(&self, edge: PrecedenceEdge) -> Result<(), StoreError> {
        self.state.lock().await.put_edge(edge);
        Ok(())
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        for change in changes.into_changes() {
            next.apply(change)?;
        }
        *state = next;
        Ok(())
    }
}
