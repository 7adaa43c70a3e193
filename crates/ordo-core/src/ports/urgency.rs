//! Urgency port - 期限から緊急度を求める外部関数
//!
//! 減衰カーブそのものはこのエンジンの外側の責務。ここでは
//! 「期限が近づく・過ぎるほど値が下がらない」ことだけを前提にします。

use chrono::{DateTime, Utc};

/// Urgency maps a due date to an integer that does not decrease as the
/// due date approaches and passes "now".
pub trait Urgency: Send + Sync {
    fn urgency(&self, due: DateTime<Utc>) -> i64;
}

impl<F> Urgency for F
where
    F: Fn(DateTime<Utc>) -> i64 + Send + Sync,
{
    fn urgency(&self, due: DateTime<Utc>) -> i64 {
        self(due)
    }
}
