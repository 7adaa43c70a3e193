//! Score calculator.
//!
//! `score = importance * urgency - effort`. The levels are already
//! constrained by their enums; urgency comes from outside and is unbounded,
//! so the arithmetic saturates at the `i64` limits.

use super::level::{Effort, Importance};

pub fn compute_score(importance: Importance, urgency: i64, effort: Effort) -> i64 {
    importance
        .weight()
        .saturating_mul(urgency)
        .saturating_sub(effort.weight())
}
