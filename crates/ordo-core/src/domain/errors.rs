//! Errors - エラー型と分類
//!
//! - NotFound: 参照先（task / rule / edge）が存在しない
//! - InvalidTransition: 状態遷移として許されない操作（例: trash にない task の purge）
//! - Validation: 入力値の検証エラー
//! - Store: ストレージ側のエラー（リトライは store の責務）

use thiserror::Error;

use super::task::TaskState;
use crate::ports::StoreError;

/// OrdoError はエンジンが呼び出し側に返すエラー
#[derive(Debug, Error)]
pub enum OrdoError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("cannot {action} {id} (state={from}, trashed={trashed})")]
    InvalidTransition {
        id: String,
        from: TaskState,
        trashed: bool,
        action: &'static str,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OrdoError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        OrdoError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
