//! State - タスクの状態

use serde::{Deserialize, Serialize};
use std::fmt;

/// TaskState はタスクの作業状態
///
/// # 状態遷移
/// - to-do ⇄ in-progress ⇄ stalled: 自由に遷移できる（順序の強制なし）
/// - (any) → done: complete でのみ
/// - done → to-do: uncomplete でのみ
///
/// trash（soft delete）はこの状態とは直交していて、`Task::deleted_at` で表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    ToDo,
    InProgress,
    Stalled,
    Done,
}

impl TaskState {
    pub fn is_done(self) -> bool {
        matches!(self, TaskState::Done)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::ToDo => "to-do",
            TaskState::InProgress => "in-progress",
            TaskState::Stalled => "stalled",
            TaskState::Done => "done",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
