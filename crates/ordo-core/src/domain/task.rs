//! Task record: a unit of work plus its derived ranking fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::OrdoError;
use super::ids::{ProjectId, TaskId, UserId};
use super::level::{Effort, Importance};
use super::score::compute_score;

pub use super::state::TaskState;

/// Input for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub owner: UserId,
    pub title: String,
    pub importance: Importance,
    pub effort: Effort,
    pub due: DateTime<Utc>,
    #[serde(default)]
    pub project: Option<ProjectId>,
}

/// Partial update. `None` leaves a field as it is.
///
/// `project: Some(None)` detaches the task from its project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub importance: Option<Importance>,
    pub effort: Option<Effort>,
    pub due: Option<DateTime<Utc>>,
    pub project: Option<Option<ProjectId>>,
}

impl TaskPatch {
    /// Does this patch touch a field the score depends on?
    pub fn touches_score(&self) -> bool {
        self.importance.is_some() || self.effort.is_some() || self.due.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.importance.is_none()
            && self.effort.is_none()
            && self.due.is_none()
            && self.project.is_none()
    }
}

/// Task record.
///
/// - `urgency` and `score` are derived; callers never set them directly.
/// - `completed_at` is `Some` iff `state == Done`.
/// - `deleted_at` is `Some` while the task sits in the trash.
///
/// State transitions happen through methods so the invariants above hold
/// after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub owner: UserId,
    pub project: Option<ProjectId>,
    pub title: String,
    pub importance: Importance,
    pub effort: Effort,
    pub due: DateTime<Utc>,
    urgency: i64,
    score: i64,
    state: TaskState,
    completed_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(id: TaskId, draft: NewTask, urgency: i64, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner: draft.owner,
            project: draft.project,
            title: draft.title,
            importance: draft.importance,
            effort: draft.effort,
            due: draft.due,
            urgency,
            score: compute_score(draft.importance, urgency, draft.effort),
            state: TaskState::ToDo,
            completed_at: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn urgency(&self) -> i64 {
        self.urgency
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Not in the trash.
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Merge a patch.
    ///
    /// `urgency` is the freshly computed value when the patch carries a new
    /// `due`; otherwise the previous urgency is kept. The score is recomputed
    /// only when importance, effort or due changed.
    pub fn apply_patch(&mut self, patch: TaskPatch, urgency: Option<i64>, now: DateTime<Utc>) {
        let rescore = patch.touches_score();
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(importance) = patch.importance {
            self.importance = importance;
        }
        if let Some(effort) = patch.effort {
            self.effort = effort;
        }
        if let Some(project) = patch.project {
            self.project = project;
        }
        if let Some(due) = patch.due {
            self.due = due;
            if let Some(urgency) = urgency {
                self.urgency = urgency;
            }
        }
        if rescore {
            self.rescore();
        }
        self.updated_at = now;
    }

    /// Replace urgency (time moved on) and recompute the score.
    pub fn refresh_urgency(&mut self, urgency: i64, now: DateTime<Utc>) {
        self.urgency = urgency;
        self.rescore();
        self.updated_at = now;
    }

    fn rescore(&mut self) {
        self.score = compute_score(self.importance, self.urgency, self.effort);
    }

    /// Plain state change between the open states.
    pub fn set_state(&mut self, state: TaskState, now: DateTime<Utc>) -> Result<(), OrdoError> {
        if !self.is_live() || self.state.is_done() || state.is_done() {
            return Err(self.invalid("change state of"));
        }
        self.state = state;
        self.updated_at = now;
        Ok(())
    }

    /// Mark as done.
    pub fn mark_done(&mut self, now: DateTime<Utc>) -> Result<(), OrdoError> {
        if !self.is_live() || self.state.is_done() {
            return Err(self.invalid("complete"));
        }
        self.state = TaskState::Done;
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Back from done to to-do.
    pub fn mark_undone(&mut self, now: DateTime<Utc>) -> Result<(), OrdoError> {
        if !self.is_live() || !self.state.is_done() {
            return Err(self.invalid("uncomplete"));
        }
        self.state = TaskState::ToDo;
        self.completed_at = None;
        self.updated_at = now;
        Ok(())
    }

    /// Move to the trash.
    pub fn trash(&mut self, now: DateTime<Utc>) -> Result<(), OrdoError> {
        if !self.is_live() {
            return Err(self.invalid("soft-delete"));
        }
        self.deleted_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Take back out of the trash.
    pub fn recover(&mut self, now: DateTime<Utc>) -> Result<(), OrdoError> {
        if self.is_live() {
            return Err(self.invalid("recover"));
        }
        self.deleted_at = None;
        self.updated_at = now;
        Ok(())
    }

    /// Purge is only allowed from the trash.
    pub fn ensure_purgeable(&self) -> Result<(), OrdoError> {
        if self.is_live() {
            return Err(self.invalid("purge"));
        }
        Ok(())
    }

    /// Next occurrence of a recurring task: same title, levels, project and
    /// owner; fresh id; new due; back to to-do.
    pub fn successor(
        &self,
        id: TaskId,
        due: DateTime<Utc>,
        urgency: i64,
        now: DateTime<Utc>,
    ) -> Task {
        let draft = NewTask {
            owner: self.owner,
            title: self.title.clone(),
            importance: self.importance,
            effort: self.effort,
            due,
            project: self.project,
        };
        Task::new(id, draft, urgency, now)
    }

    fn invalid(&self, action: &'static str) -> OrdoError {
        OrdoError::InvalidTransition {
            id: self.id.to_string(),
            from: self.state,
            trashed: !self.is_live(),
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;
    use ulid::Ulid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn task(urgency: i64) -> Task {
        let draft = NewTask {
            owner: UserId::from_ulid(Ulid::new()),
            title: "write report".to_string(),
            importance: Importance::High,
            effort: Effort::Hour,
            due: now() + Duration::days(2),
            project: None,
        };
        Task::new(TaskId::from_ulid(Ulid::new()), draft, urgency, now())
    }

    fn assert_score_formula(t: &Task) {
        assert_eq!(
            t.score(),
            t.importance.weight() * t.urgency() - t.effort.weight()
        );
    }

    #[test]
    fn new_task_starts_in_todo_with_score() {
        let t = task(7);
        assert_eq!(t.state(), TaskState::ToDo);
        assert_eq!(t.score(), 3 * 7 - 1);
        assert!(t.completed_at().is_none());
        assert!(t.is_live());
    }

    #[test]
    fn title_only_patch_keeps_score() {
        let mut t = task(7);
        let before = t.score();
        t.apply_patch(
            TaskPatch {
                title: Some("rename".into()),
                ..Default::default()
            },
            None,
            now(),
        );
        assert_eq!(t.title, "rename");
        assert_eq!(t.score(), before);
    }

    #[test]
    fn importance_patch_reuses_previous_urgency() {
        let mut t = task(7);
        t.apply_patch(
            TaskPatch {
                importance: Some(Importance::Critical),
                ..Default::default()
            },
            None,
            now(),
        );
        assert_eq!(t.urgency(), 7);
        assert_eq!(t.score(), 4 * 7 - 1);
        assert_score_formula(&t);
    }

    #[test]
    fn due_patch_takes_new_urgency() {
        let mut t = task(7);
        t.apply_patch(
            TaskPatch {
                due: Some(now() + Duration::hours(1)),
                effort: Some(Effort::Day),
                ..Default::default()
            },
            Some(20),
            now(),
        );
        assert_eq!(t.urgency(), 20);
        assert_eq!(t.score(), 3 * 20 - 3);
        assert_score_formula(&t);
    }

    #[test]
    fn completion_roundtrip_keeps_completed_at_invariant() {
        let mut t = task(1);
        t.mark_done(now()).unwrap();
        assert_eq!(t.state(), TaskState::Done);
        assert_eq!(t.completed_at(), Some(now()));

        t.mark_undone(now()).unwrap();
        assert_eq!(t.state(), TaskState::ToDo);
        assert!(t.completed_at().is_none());
    }

    #[rstest]
    #[case::in_progress(TaskState::InProgress)]
    #[case::stalled(TaskState::Stalled)]
    #[case::todo(TaskState::ToDo)]
    fn open_states_move_freely(#[case] target: TaskState) {
        let mut t = task(1);
        t.set_state(TaskState::Stalled, now()).unwrap();
        t.set_state(target, now()).unwrap();
        assert_eq!(t.state(), target);
    }

    #[test]
    fn done_is_not_reachable_by_plain_state_change() {
        let mut t = task(1);
        let err = t.set_state(TaskState::Done, now()).unwrap_err();
        assert!(matches!(err, OrdoError::InvalidTransition { .. }));
        assert!(t.completed_at().is_none());
    }

    #[test]
    fn completing_twice_is_rejected() {
        let mut t = task(1);
        t.mark_done(now()).unwrap();
        assert!(matches!(
            t.mark_done(now()),
            Err(OrdoError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn purge_requires_trash() {
        let mut t = task(1);
        assert!(matches!(
            t.ensure_purgeable(),
            Err(OrdoError::InvalidTransition { action: "purge", .. })
        ));
        t.trash(now()).unwrap();
        assert!(t.ensure_purgeable().is_ok());
        t.recover(now()).unwrap();
        assert!(t.is_live());
    }

    #[test]
    fn successor_copies_levels_and_resets_state() {
        let mut t = task(3);
        t.mark_done(now()).unwrap();
        let next_due = now() + Duration::days(7);
        let s = t.successor(TaskId::from_ulid(Ulid::new()), next_due, 5, now());

        assert_ne!(s.id, t.id);
        assert_eq!(s.title, t.title);
        assert_eq!(s.importance, t.importance);
        assert_eq!(s.effort, t.effort);
        assert_eq!(s.owner, t.owner);
        assert_eq!(s.due, next_due);
        assert_eq!(s.state(), TaskState::ToDo);
        assert!(s.completed_at().is_none());
        assert_score_formula(&s);
    }
}
