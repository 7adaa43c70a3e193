//! TaskStore port - タスク・繰り返しルール・先行関係の正本（source of truth）
//!
//! 永続化の方式（テーブル・インデックス）はこの port の実装側の関心事です。
//!
//! # 設計原則
//! - 単発の読み書きは個別メソッドで行う
//! - 複数の書き込みをまとめて適用したいとき（complete / purge / edge の付け替え）は `commit` を使う。
//!   `commit` は all-or-nothing で適用されなければならない
//! - リトライは store の責務（エンジンはリトライしない）

use async_trait::async_trait;

use crate::domain::{EdgeDirection, PrecedenceEdge, RecurrenceRule, Task, TaskId, UserId};

/// StoreError はストレージ実装が返すエラー
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(String),

    #[error("write conflict: {0}")]
    Conflict(String),
}

/// 1 件の書き込み
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    SaveTask(Task),
    /// Hard removal (purge).
    DeleteTask(TaskId),
    SaveRule(RecurrenceRule),
    DeleteRule(TaskId),
    SaveEdge(PrecedenceEdge),
}

/// まとめて適用する書き込みの集合（unit of work）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: Change) -> &mut Self {
        self.changes.push(change);
        self
    }

    pub fn save_task(&mut self, task: Task) -> &mut Self {
        self.push(Change::SaveTask(task))
    }

    pub fn save_rule(&mut self, rule: RecurrenceRule) -> &mut Self {
        self.push(Change::SaveRule(rule))
    }

    pub fn save_edge(&mut self, edge: PrecedenceEdge) -> &mut Self {
        self.push(Change::SaveEdge(edge))
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn into_changes(self) -> Vec<Change> {
        self.changes
    }
}

/// TaskStore は状態・ルール・先行関係の正本
///
/// `list_edges` は soft delete 済みの edge も返してよい。
/// フィルタは読む側（`PrecedenceGraph`）の責務。
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn get_task(&self, id: TaskId) -> Result<Option<Task>, StoreError>;

    /// All tasks of an owner, trashed ones included.
    async fn list_tasks(&self, owner: UserId) -> Result<Vec<Task>, StoreError>;

    async fn save_task(&self, task: Task) -> Result<(), StoreError>;

    async fn get_recurrence_rule(
        &self,
        task_id: TaskId,
    ) -> Result<Option<RecurrenceRule>, StoreError>;

    async fn save_recurrence_rule(&self, rule: RecurrenceRule) -> Result<(), StoreError>;

    async fn list_edges(
        &self,
        task_id: TaskId,
        direction: EdgeDirection,
    ) -> Result<Vec<PrecedenceEdge>, StoreError>;

    async fn save_edge(&self, edge: PrecedenceEdge) -> Result<(), StoreError>;

    /// Apply every change or none of them.
    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError>;
}
