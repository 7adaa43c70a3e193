//! Domain identifiers (strongly-typed IDs).
//!
//! # ULID ベースの ID + Phantom type
//! すべての ID は ULID を内部に持ち、`Id<T>` のマーカー型 `T` で種類を区別します。
//!
//! - **時刻でソート可能**: 生成順序でソートできる
//! - **分散生成可能**: 調整なしで生成できる
//! - **型安全**: `TaskId` と `EdgeId` は混同できない
//!
//! `UserId` と `ProjectId` はこのエンジンの外側（認証・プロジェクト管理）で
//! 発行される参照ですが、同じ表現を使います。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"task-", "edge-" など）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// `T` は PhantomData で、実行時にはメモリを消費しません。
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    /// ULID から Id を作成
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// 内部の ULID を取得
    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Task のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {}

impl IdMarker for Task {
    fn prefix() -> &'static str {
        "task-"
    }
}

/// Precedence edge のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Edge {}

impl IdMarker for Edge {
    fn prefix() -> &'static str {
        "edge-"
    }
}

/// User のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum User {}

impl IdMarker for User {
    fn prefix() -> &'static str {
        "user-"
    }
}

/// Project のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Project {}

impl IdMarker for Project {
    fn prefix() -> &'static str {
        "project-"
    }
}

// ========================================
// Type Alias
// ========================================

/// Identifier of a Task (one unit of work, one occurrence of a series).
pub type TaskId = Id<Task>;

/// Identifier of a precedence edge.
pub type EdgeId = Id<Edge>;

/// Identifier of the owning user.
pub type UserId = Id<User>;

/// Identifier of an owning project.
pub type ProjectId = Id<Project>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let ulid1 = Ulid::new();
        let ulid2 = Ulid::new();

        let task = TaskId::from_ulid(ulid1);
        let edge = EdgeId::from_ulid(ulid2);

        assert_eq!(task.as_ulid(), ulid1);
        assert_eq!(edge.as_ulid(), ulid2);

        assert!(task.to_string().starts_with("task-"));
        assert!(edge.to_string().starts_with("edge-"));
        assert!(UserId::from_ulid(ulid1).to_string().starts_with("user-"));
        assert!(ProjectId::from_ulid(ulid1).to_string().starts_with("project-"));

        // let _: TaskId = edge; // <- does not compile
    }

    #[test]
    fn ids_serialize_as_plain_ulid() {
        let task_id = TaskId::from_ulid(Ulid::new());

        let serialized = serde_json::to_string(&task_id).unwrap();
        let deserialized: TaskId = serde_json::from_str(&serialized).unwrap();

        assert_eq!(task_id, deserialized);
        assert!(serialized.contains(&task_id.as_ulid().to_string()));
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        use std::mem::size_of;

        assert_eq!(size_of::<TaskId>(), size_of::<Ulid>());
        assert_eq!(size_of::<EdgeId>(), size_of::<Ulid>());
    }
}
