//! View configuration and the pure re-projection used by every listing.
//!
//! Ordering: the selected sort field first (score, descending, by default),
//! then `title` ascending as the tie-break. The tie-break ignores the
//! selected direction.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::ids::ProjectId;
use super::task::{Task, TaskState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Score,
    Urgency,
    Importance,
    Effort,
    Due,
    Title,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// What a listing shows and in which order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub sort: SortField,
    pub direction: SortDirection,
    /// Only these states; empty means every state.
    pub states: Vec<TaskState>,
    pub project: Option<ProjectId>,
}

impl ViewConfig {
    pub fn sorted_by(sort: SortField, direction: SortDirection) -> Self {
        Self {
            sort,
            direction,
            ..Default::default()
        }
    }

    pub fn with_states(mut self, states: &[TaskState]) -> Self {
        self.states = states.to_vec();
        self
    }

    pub fn in_project(mut self, project: ProjectId) -> Self {
        self.project = Some(project);
        self
    }

    fn admits(&self, task: &Task) -> bool {
        let state_ok = self.states.is_empty() || self.states.contains(&task.state());
        let project_ok = self.project.is_none() || task.project == self.project;
        state_ok && project_ok
    }

    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let primary = match self.sort {
            SortField::Score => a.score().cmp(&b.score()),
            SortField::Urgency => a.urgency().cmp(&b.urgency()),
            SortField::Importance => a.importance.cmp(&b.importance),
            SortField::Effort => a.effort.cmp(&b.effort),
            SortField::Due => a.due.cmp(&b.due),
            SortField::Title => a.title.cmp(&b.title),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        let primary = match self.direction {
            SortDirection::Asc => primary,
            SortDirection::Desc => primary.reverse(),
        };
        primary.then_with(|| a.title.cmp(&b.title))
    }
}

/// Filter and order `tasks` for display. Pure: no store, no globals.
pub fn project(tasks: impl IntoIterator<Item = Task>, view: &ViewConfig) -> Vec<Task> {
    let mut out: Vec<Task> = tasks.into_iter().filter(|t| view.admits(t)).collect();
    out.sort_by(|a, b| view.compare(a, b));
    out
}
