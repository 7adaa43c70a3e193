//! Recurrence rule and the engine that computes a task's next occurrence.
//!
//! The rule is keyed by the task it decorates. The engine is a pure
//! function of (task due, rule, now); it performs no writes. Counter
//! increments and successor creation belong to the lifecycle layer.

use chrono::{DateTime, Datelike, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use super::errors::OrdoError;
use super::ids::TaskId;
use super::task::Task;

/// Cycle unit. Unknown values read from storage land in `Unrecognized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cycle {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    #[serde(other)]
    Unrecognized,
}

/// One advance step, resolved from (cycle, interval).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Days(i64),
    Months(u32),
}

impl Cycle {
    fn step(self, interval: u32) -> Option<Step> {
        let interval_days = i64::from(interval);
        match self {
            Cycle::Daily => Some(Step::Days(interval_days)),
            Cycle::Weekly => Some(Step::Days(interval_days * 7)),
            Cycle::Monthly => Some(Step::Months(interval)),
            Cycle::Yearly => interval.checked_mul(12).map(Step::Months),
            Cycle::Unrecognized => None,
        }
    }
}

/// How a task regenerates after completion.
///
/// - `until` and `count` are both optional; when both are set both must hold.
/// - `current_count` only ever grows.
/// - Once a successor has taken the series over, `continued_by` names it and
///   this copy is frozen: re-completing the task does not spawn again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub task_id: TaskId,
    pub cycle: Cycle,
    pub interval: u32,
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    current_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    continued_by: Option<TaskId>,
}

impl RecurrenceRule {
    pub fn new(task_id: TaskId, cycle: Cycle, interval: u32) -> Self {
        Self {
            task_id,
            cycle,
            interval,
            until: None,
            count: None,
            current_count: 0,
            continued_by: None,
        }
    }

    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Start from an existing counter (rule loaded from storage, tests).
    pub fn with_current_count(mut self, current_count: u32) -> Self {
        self.current_count = current_count;
        self
    }

    pub fn current_count(&self) -> u32 {
        self.current_count
    }

    /// Checks applied when a caller attaches a rule.
    pub fn validate(&self) -> Result<(), OrdoError> {
        if self.interval == 0 {
            return Err(OrdoError::Validation("interval must be at least 1".into()));
        }
        if self.count == Some(0) {
            return Err(OrdoError::Validation("count must be at least 1".into()));
        }
        if self.cycle == Cycle::Unrecognized {
            return Err(OrdoError::Validation("unrecognized cycle kind".into()));
        }
        Ok(())
    }

    /// One completed occurrence. Called whether or not a successor follows.
    pub fn record_completion(&mut self) {
        self.current_count = self.current_count.saturating_add(1);
    }

    /// Keep the larger counter when a rule replaces an older one.
    pub fn absorb_counter(&mut self, previous: &RecurrenceRule) {
        self.current_count = self.current_count.max(previous.current_count);
    }

    /// Same rule, re-keyed onto another task. The copy owns the series.
    pub fn carried_to(&self, task_id: TaskId) -> RecurrenceRule {
        RecurrenceRule {
            task_id,
            continued_by: None,
            ..self.clone()
        }
    }

    /// The task that took the series over, if any.
    pub fn continued_by(&self) -> Option<TaskId> {
        self.continued_by
    }

    /// Mark this copy as superseded by `successor`.
    pub fn hand_over(&mut self, successor: TaskId) {
        self.continued_by = Some(successor);
    }

    fn exhausted(&self) -> bool {
        match self.count {
            Some(count) => self.current_count.saturating_add(1) > count,
            None => false,
        }
    }
}

/// Computes next occurrences.
///
/// `strict_cycles = false`: an unusable rule (unrecognized cycle, zero
/// interval) means "not recurring". `true`: it is a `Validation` error.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecurrenceEngine {
    strict_cycles: bool,
}

impl RecurrenceEngine {
    pub fn new(strict_cycles: bool) -> Self {
        Self { strict_cycles }
    }

    /// Next due date for `task` under `rule`, or `None` when it does not
    /// recur (no rule, rule for another task, ended, exhausted).
    ///
    /// The candidate is always strictly after `now`: missed cycles are
    /// skipped, so a regenerated task is never born overdue.
    pub fn next_occurrence(
        &self,
        task: &Task,
        rule: Option<&RecurrenceRule>,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, OrdoError> {
        let Some(rule) = rule.filter(|r| r.task_id == task.id) else {
            return Ok(None);
        };

        let step = match rule.cycle.step(rule.interval) {
            Some(step) if rule.interval > 0 => step,
            _ => {
                if self.strict_cycles {
                    return Err(OrdoError::Validation(format!(
                        "unusable recurrence for {}: cycle={:?} interval={}",
                        task.id, rule.cycle, rule.interval
                    )));
                }
                tracing::warn!(
                    task_id = %task.id,
                    cycle = ?rule.cycle,
                    interval = rule.interval,
                    "unusable recurrence rule, treating task as not recurring"
                );
                return Ok(None);
            }
        };

        let Some(candidate) = advance_past(task.due, step, now) else {
            return Ok(None);
        };

        if rule.until.is_some_and(|until| candidate > until) {
            return Ok(None);
        }
        if rule.exhausted() {
            return Ok(None);
        }
        Ok(Some(candidate))
    }
}

/// Smallest `due + k * step` with k >= 1 that is strictly after `now`.
///
/// Month steps are measured from `due` itself, not from the previous
/// candidate, so a day clamped in a short month (Jan 31 -> Feb 29) does not
/// stick for the rest of the series. `None` on calendar overflow.
fn advance_past(due: DateTime<Utc>, step: Step, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match step {
        Step::Days(days) => {
            let step = Duration::try_days(days)?;
            let step_secs = step.num_seconds();
            let k = if due > now {
                1
            } else {
                (now - due).num_seconds() / step_secs + 1
            };
            let mut candidate = due.checked_add_signed(step.checked_mul(i32::try_from(k).ok()?)?)?;
            while candidate <= now {
                candidate = candidate.checked_add_signed(step)?;
            }
            Some(candidate)
        }
        Step::Months(months) => {
            let elapsed = if due > now {
                0
            } else {
                let years = i64::from(now.year() - due.year());
                let whole = years * 12 + i64::from(now.month()) - i64::from(due.month());
                u32::try_from(whole).ok()?
            };
            let mut k = (elapsed / months).max(1);
            loop {
                let candidate = due.checked_add_months(Months::new(k.checked_mul(months)?))?;
                if candidate > now {
                    return Some(candidate);
                }
                k = k.checked_add(1)?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::UserId;
    use crate::domain::level::{Effort, Importance};
    use crate::domain::task::NewTask;
    use chrono::TimeZone;
    use rstest::rstest;
    use ulid::Ulid;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
    }

    fn task_due(due: DateTime<Utc>) -> Task {
        let draft = NewTask {
            owner: UserId::from_ulid(Ulid::new()),
            title: "water plants".into(),
            importance: Importance::Medium,
            effort: Effort::Minutes,
            due,
            project: None,
        };
        Task::new(TaskId::from_ulid(Ulid::new()), draft, 0, due)
    }

    #[test]
    fn no_rule_means_not_recurring() {
        let engine = RecurrenceEngine::default();
        let t = task_due(at(2024, 3, 1));
        assert_eq!(engine.next_occurrence(&t, None, at(2024, 3, 1)).unwrap(), None);
    }

    #[test]
    fn rule_for_another_task_is_ignored() {
        let engine = RecurrenceEngine::default();
        let t = task_due(at(2024, 3, 1));
        let rule = RecurrenceRule::new(TaskId::from_ulid(Ulid::new()), Cycle::Daily, 1);
        assert_eq!(
            engine.next_occurrence(&t, Some(&rule), at(2024, 3, 1)).unwrap(),
            None
        );
    }

    #[rstest]
    #[case::daily(Cycle::Daily, 1, at(2024, 3, 2))]
    #[case::every_three_days(Cycle::Daily, 3, at(2024, 3, 4))]
    #[case::weekly(Cycle::Weekly, 1, at(2024, 3, 8))]
    #[case::biweekly(Cycle::Weekly, 2, at(2024, 3, 15))]
    #[case::monthly(Cycle::Monthly, 1, at(2024, 4, 1))]
    #[case::quarterly(Cycle::Monthly, 3, at(2024, 6, 1))]
    #[case::yearly(Cycle::Yearly, 1, at(2025, 3, 1))]
    fn advances_one_step_when_due_is_now(
        #[case] cycle: Cycle,
        #[case] interval: u32,
        #[case] expected: DateTime<Utc>,
    ) {
        let engine = RecurrenceEngine::default();
        let t = task_due(at(2024, 3, 1));
        let rule = RecurrenceRule::new(t.id, cycle, interval);
        let next = engine.next_occurrence(&t, Some(&rule), at(2024, 3, 1)).unwrap();
        assert_eq!(next, Some(expected));
    }

    #[test]
    fn future_due_still_advances_once() {
        let engine = RecurrenceEngine::default();
        let t = task_due(at(2024, 3, 10));
        let rule = RecurrenceRule::new(t.id, Cycle::Daily, 1);
        let next = engine.next_occurrence(&t, Some(&rule), at(2024, 3, 1)).unwrap();
        assert_eq!(next, Some(at(2024, 3, 11)));
    }

    #[test]
    fn missed_daily_cycles_catch_up_past_now() {
        let engine = RecurrenceEngine::default();
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 12, 30, 0).unwrap();
        let t = task_due(now - Duration::days(3));
        let rule = RecurrenceRule::new(t.id, Cycle::Daily, 1);

        let next = engine.next_occurrence(&t, Some(&rule), now).unwrap().unwrap();
        assert!(next > now);
        assert_ne!(next, t.due + Duration::days(1));
        assert_eq!(next, now + Duration::days(1));
    }

    #[test]
    fn missed_monthly_cycles_catch_up_past_now() {
        let engine = RecurrenceEngine::default();
        let t = task_due(at(2023, 11, 15));
        let rule = RecurrenceRule::new(t.id, Cycle::Monthly, 1);
        let now = at(2024, 3, 20);
        let next = engine.next_occurrence(&t, Some(&rule), now).unwrap();
        assert_eq!(next, Some(at(2024, 4, 15)));
    }

    #[test]
    fn month_end_does_not_drift() {
        let engine = RecurrenceEngine::default();
        let t = task_due(at(2024, 1, 31));
        let rule = RecurrenceRule::new(t.id, Cycle::Monthly, 1);

        let feb = engine.next_occurrence(&t, Some(&rule), at(2024, 1, 31)).unwrap();
        assert_eq!(feb, Some(at(2024, 2, 29)));

        let mar = engine.next_occurrence(&t, Some(&rule), at(2024, 3, 1)).unwrap();
        assert_eq!(mar, Some(at(2024, 3, 31)));
    }

    #[test]
    fn same_inputs_same_answer() {
        let engine = RecurrenceEngine::default();
        let t = task_due(at(2024, 2, 20));
        let rule = RecurrenceRule::new(t.id, Cycle::Weekly, 1).with_count(10);
        let now = at(2024, 3, 5);

        let first = engine.next_occurrence(&t, Some(&rule), now).unwrap();
        let second = engine.next_occurrence(&t, Some(&rule), now).unwrap();
        assert_eq!(first, second);
        assert!(first.is_some());
    }

    #[rstest]
    #[case::spent(1, 2, true)]
    #[case::last_one_left(0, 2, false)]
    #[case::over(5, 2, true)]
    fn count_boundary(#[case] current: u32, #[case] count: u32, #[case] ended: bool) {
        let engine = RecurrenceEngine::default();
        let t = task_due(at(2024, 3, 1));
        // The lifecycle records the completion before asking for the next date.
        let mut rule = RecurrenceRule::new(t.id, Cycle::Daily, 1)
            .with_count(count)
            .with_current_count(current);
        rule.record_completion();

        let next = engine.next_occurrence(&t, Some(&rule), at(2024, 3, 1)).unwrap();
        assert_eq!(next.is_none(), ended);
    }

    #[test]
    fn until_before_candidate_ends_series() {
        let engine = RecurrenceEngine::default();
        let t = task_due(at(2024, 3, 1));
        let rule = RecurrenceRule::new(t.id, Cycle::Weekly, 1).with_until(at(2024, 3, 5));
        assert_eq!(
            engine.next_occurrence(&t, Some(&rule), at(2024, 3, 1)).unwrap(),
            None
        );
    }

    #[test]
    fn until_on_candidate_is_inclusive() {
        let engine = RecurrenceEngine::default();
        let t = task_due(at(2024, 3, 1));
        let rule = RecurrenceRule::new(t.id, Cycle::Weekly, 1).with_until(at(2024, 3, 8));
        assert_eq!(
            engine.next_occurrence(&t, Some(&rule), at(2024, 3, 1)).unwrap(),
            Some(at(2024, 3, 8))
        );
    }

    #[test]
    fn until_and_count_must_both_hold() {
        let engine = RecurrenceEngine::default();
        let t = task_due(at(2024, 3, 1));
        let rule = RecurrenceRule::new(t.id, Cycle::Daily, 1)
            .with_until(at(2025, 1, 1))
            .with_count(1)
            .with_current_count(1);
        assert_eq!(
            engine.next_occurrence(&t, Some(&rule), at(2024, 3, 1)).unwrap(),
            None
        );
    }

    #[test]
    fn unrecognized_cycle_is_lenient_by_default() {
        let t = task_due(at(2024, 3, 1));
        let rule: RecurrenceRule = serde_json::from_value(serde_json::json!({
            "task_id": t.id,
            "cycle": "fortnightly",
            "interval": 1,
        }))
        .unwrap();
        assert_eq!(rule.cycle, Cycle::Unrecognized);

        let lenient = RecurrenceEngine::new(false);
        assert_eq!(
            lenient.next_occurrence(&t, Some(&rule), at(2024, 3, 1)).unwrap(),
            None
        );

        let strict = RecurrenceEngine::new(true);
        assert!(matches!(
            strict.next_occurrence(&t, Some(&rule), at(2024, 3, 1)),
            Err(OrdoError::Validation(_))
        ));
    }

    #[test]
    fn zero_interval_never_loops() {
        let engine = RecurrenceEngine::default();
        let t = task_due(at(2024, 3, 1));
        let rule = RecurrenceRule::new(t.id, Cycle::Daily, 0);
        assert_eq!(
            engine.next_occurrence(&t, Some(&rule), at(2024, 3, 1)).unwrap(),
            None
        );
    }

    #[rstest]
    #[case::zero_interval(RecurrenceRule::new(TaskId::from_ulid(Ulid::new()), Cycle::Daily, 0))]
    #[case::zero_count(RecurrenceRule::new(TaskId::from_ulid(Ulid::new()), Cycle::Daily, 1).with_count(0))]
    #[case::unknown(RecurrenceRule::new(TaskId::from_ulid(Ulid::new()), Cycle::Unrecognized, 1))]
    fn validate_rejects(#[case] rule: RecurrenceRule) {
        assert!(matches!(rule.validate(), Err(OrdoError::Validation(_))));
    }

    #[test]
    fn counter_only_grows() {
        let id = TaskId::from_ulid(Ulid::new());
        let mut old = RecurrenceRule::new(id, Cycle::Daily, 1);
        old.record_completion();
        old.record_completion();

        let mut replacement = RecurrenceRule::new(id, Cycle::Weekly, 1);
        replacement.absorb_counter(&old);
        assert_eq!(replacement.current_count(), 2);

        let carried = replacement.carried_to(TaskId::from_ulid(Ulid::new()));
        assert_eq!(carried.current_count(), 2);
        assert_eq!(carried.cycle, Cycle::Weekly);
    }

    #[test]
    fn handed_over_rule_points_at_successor_and_copy_starts_clean() {
        let id = TaskId::from_ulid(Ulid::new());
        let next = TaskId::from_ulid(Ulid::new());
        let mut rule = RecurrenceRule::new(id, Cycle::Daily, 1).with_count(3);
        rule.record_completion();

        let carried = rule.carried_to(next);
        rule.hand_over(next);

        assert_eq!(rule.continued_by(), Some(next));
        assert_eq!(carried.continued_by(), None);
        assert_eq!(carried.current_count(), 1);

        // the marker survives storage, and older rows without it still load
        let json = serde_json::to_string(&rule).unwrap();
        let back: RecurrenceRule = serde_json::from_str(&json).unwrap();
        assert_eq!(back.continued_by(), Some(next));
        let plain = serde_json::to_string(&carried).unwrap();
        assert!(!plain.contains("continued_by"));
    }
}
