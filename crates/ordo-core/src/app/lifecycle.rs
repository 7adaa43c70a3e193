//! TaskLifecycle - タスクのライフサイクル管理
//!
//! create / update / complete / uncomplete / soft delete / recover / purge と、
//! 先行関係・繰り返しルールの管理をまとめる。
//!
//! # 不変条件
//! - score は importance / urgency / effort から常に再計算できる
//! - complete は「状態更新・カウンタ加算・後続タスク生成」を 1 つの ChangeSet で適用する
//! - purge は trash にあるタスクだけ

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::config::EngineConfig;
use super::graph::{LinkedTask, PrecedenceGraph};
use crate::domain::{
    EdgeDirection, NewTask, OrdoError, PrecedenceEdge, RecurrenceEngine, RecurrenceRule, Task,
    TaskId, TaskPatch, TaskState, UserId, ViewConfig, project,
};
use crate::ports::{Change, ChangeSet, Clock, IdGenerator, TaskStore, Urgency};

/// Result of completing a task.
///
/// The completed task and its successor are separate entities; undoing the
/// completion later leaves the successor in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub completed: TaskId,
    pub successor: Option<TaskId>,
}

/// Lifecycle manager. Every operation is one request-scoped pass; the
/// only shared state lives in the store.
pub struct TaskLifecycle {
    store: Arc<dyn TaskStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    urgency: Arc<dyn Urgency>,
    engine: RecurrenceEngine,
    graph: PrecedenceGraph,
    config: EngineConfig,
}

impl TaskLifecycle {
    pub fn new(
        store: Arc<dyn TaskStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        urgency: Arc<dyn Urgency>,
        config: EngineConfig,
    ) -> Self {
        Self {
            graph: PrecedenceGraph::new(store.clone()),
            engine: RecurrenceEngine::new(config.strict_cycles),
            store,
            clock,
            ids,
            urgency,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn graph(&self) -> &PrecedenceGraph {
        &self.graph
    }

    async fn load(&self, id: TaskId) -> Result<Task, OrdoError> {
        self.store
            .get_task(id)
            .await?
            .ok_or_else(|| OrdoError::not_found("task", id))
    }

    pub async fn get(&self, id: TaskId) -> Result<Task, OrdoError> {
        self.load(id).await
    }

    // ========================================
    // Task mutations
    // ========================================

    pub async fn create(&self, draft: NewTask) -> Result<Task, OrdoError> {
        if draft.title.trim().is_empty() {
            return Err(OrdoError::Validation("title must not be empty".into()));
        }
        let now = self.clock.now();
        let urgency = self.urgency.urgency(draft.due);
        let task = Task::new(self.ids.generate_task_id(), draft, urgency, now);
        self.store.save_task(task.clone()).await?;
        tracing::info!(task_id = %task.id, score = task.score(), "task created");
        Ok(task)
    }

    /// Merge `patch`. Urgency is recomputed only when `due` is supplied; a
    /// trashed task stays trashed.
    pub async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<Task, OrdoError> {
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(OrdoError::Validation("title must not be empty".into()));
        }
        let mut task = self.load(id).await?;
        if patch.is_empty() {
            return Ok(task);
        }
        let urgency = patch.due.map(|due| self.urgency.urgency(due));
        task.apply_patch(patch, urgency, self.clock.now());
        self.store.save_task(task.clone()).await?;
        tracing::debug!(task_id = %id, urgency = task.urgency(), score = task.score(), "task updated");
        Ok(task)
    }

    /// Move between to-do, in-progress and stalled.
    pub async fn set_state(&self, id: TaskId, state: TaskState) -> Result<Task, OrdoError> {
        let mut task = self.load(id).await?;
        task.set_state(state, self.clock.now())?;
        self.store.save_task(task.clone()).await?;
        tracing::debug!(task_id = %id, %state, "task state changed");
        Ok(task)
    }

    /// Mark done, count the occurrence and spawn the next one if the rule
    /// allows. All writes land in a single commit.
    pub async fn complete(&self, id: TaskId) -> Result<Completion, OrdoError> {
        let now = self.clock.now();
        let mut task = self.load(id).await?;
        task.mark_done(now)?;

        let mut changes = ChangeSet::new();
        let mut successor = None;

        match self.store.get_recurrence_rule(id).await? {
            Some(rule) if rule.continued_by().is_some() => {
                // this occurrence already produced the next one
                tracing::debug!(
                    task_id = %id,
                    successor_id = ?rule.continued_by(),
                    "series already continued, not regenerating"
                );
            }
            Some(mut rule) => {
                successor = self.regenerate(&task, &mut rule, now, &mut changes)?;
                changes.save_rule(rule);
            }
            None => {}
        }

        changes.save_task(task);
        self.store.commit(changes).await?;
        tracing::info!(task_id = %id, "task completed");
        Ok(Completion {
            completed: id,
            successor,
        })
    }

    /// Count the occurrence and queue the successor (and, when carrying, the
    /// series rule) into `changes`.
    fn regenerate(
        &self,
        task: &Task,
        rule: &mut RecurrenceRule,
        now: DateTime<Utc>,
        changes: &mut ChangeSet,
    ) -> Result<Option<TaskId>, OrdoError> {
        rule.record_completion();
        let Some(due) = self.engine.next_occurrence(task, Some(&*rule), now)? else {
            tracing::info!(
                task_id = %task.id,
                occurrence = rule.current_count(),
                "recurrence ended"
            );
            return Ok(None);
        };

        let next = task.successor(
            self.ids.generate_task_id(),
            due,
            self.urgency.urgency(due),
            now,
        );
        if self.config.carry_rule_forward {
            changes.save_rule(rule.carried_to(next.id));
            rule.hand_over(next.id);
        }
        tracing::info!(
            task_id = %task.id,
            successor_id = %next.id,
            due = %due,
            occurrence = rule.current_count(),
            "recurring task regenerated"
        );
        let id = next.id;
        changes.save_task(next);
        Ok(Some(id))
    }

    /// Back to to-do. Successors and the recurrence counter are untouched,
    /// and completing again does not regenerate a series that already moved
    /// on.
    pub async fn uncomplete(&self, id: TaskId) -> Result<Task, OrdoError> {
        let mut task = self.load(id).await?;
        task.mark_undone(self.clock.now())?;
        self.store.save_task(task.clone()).await?;
        tracing::info!(task_id = %id, "task reopened");
        Ok(task)
    }

    /// Move to the trash. Edges stay; readers hide them while the task is
    /// trashed, and they come back on recover.
    pub async fn soft_delete(&self, id: TaskId) -> Result<Task, OrdoError> {
        let mut task = self.load(id).await?;
        task.trash(self.clock.now())?;
        self.store.save_task(task.clone()).await?;
        tracing::info!(task_id = %id, "task moved to trash");
        Ok(task)
    }

    pub async fn recover(&self, id: TaskId) -> Result<Task, OrdoError> {
        let mut task = self.load(id).await?;
        task.recover(self.clock.now())?;
        self.store.save_task(task.clone()).await?;
        tracing::info!(task_id = %id, "task recovered from trash");
        Ok(task)
    }

    /// Hard removal, only from the trash. Takes the rule and every edge
    /// touching the task with it.
    pub async fn purge(&self, id: TaskId) -> Result<(), OrdoError> {
        let task = self.load(id).await?;
        task.ensure_purgeable()?;

        let now = self.clock.now();
        let mut changes = ChangeSet::new();
        for direction in [EdgeDirection::Predecessors, EdgeDirection::Successors] {
            for mut edge in self.store.list_edges(id, direction).await? {
                if edge.is_live() {
                    edge.soft_delete(now);
                    changes.save_edge(edge);
                }
            }
        }
        changes
            .push(Change::DeleteRule(id))
            .push(Change::DeleteTask(id));
        self.store.commit(changes).await?;
        tracing::info!(task_id = %id, "task purged");
        Ok(())
    }

    // ========================================
    // Recurrence rules
    // ========================================

    /// Rule of `task_id`, following hand-overs to the rule that currently
    /// drives the series.
    pub async fn recurrence(&self, task_id: TaskId) -> Result<Option<RecurrenceRule>, OrdoError> {
        let Some(mut rule) = self.store.get_recurrence_rule(task_id).await? else {
            return Ok(None);
        };
        while let Some(next) = rule.continued_by() {
            match self.store.get_recurrence_rule(next).await? {
                Some(newer) => rule = newer,
                None => break,
            }
        }
        Ok(Some(rule))
    }

    /// Attach or replace the rule of `task_id`. A replacement never lowers
    /// the occurrence counter.
    pub async fn set_recurrence(
        &self,
        task_id: TaskId,
        rule: RecurrenceRule,
    ) -> Result<RecurrenceRule, OrdoError> {
        self.load(task_id).await?;
        let mut rule = rule.carried_to(task_id);
        rule.validate()?;
        if let Some(previous) = self.store.get_recurrence_rule(task_id).await? {
            rule.absorb_counter(&previous);
        }
        self.store.save_recurrence_rule(rule.clone()).await?;
        tracing::debug!(task_id = %task_id, cycle = ?rule.cycle, interval = rule.interval, "recurrence set");
        Ok(rule)
    }

    pub async fn clear_recurrence(&self, task_id: TaskId) -> Result<(), OrdoError> {
        if self.store.get_recurrence_rule(task_id).await?.is_none() {
            return Err(OrdoError::not_found("recurrence rule", task_id));
        }
        let mut changes = ChangeSet::new();
        changes.push(Change::DeleteRule(task_id));
        self.store.commit(changes).await?;
        tracing::debug!(task_id = %task_id, "recurrence cleared");
        Ok(())
    }

    // ========================================
    // Precedence edges
    // ========================================

    /// `subject` should be done after `target`. Returns the existing live
    /// edge if the pair is already linked.
    pub async fn link(&self, subject: TaskId, target: TaskId) -> Result<PrecedenceEdge, OrdoError> {
        let subject_task = self.load(subject).await?;
        self.check_link(&subject_task, target).await?;

        let existing = self
            .store
            .list_edges(subject, EdgeDirection::Predecessors)
            .await?
            .into_iter()
            .find(|e| e.is_live() && e.connects(subject, target));
        if let Some(edge) = existing {
            return Ok(edge);
        }

        let edge = PrecedenceEdge::new(self.ids.generate_edge_id(), subject, target, self.clock.now());
        self.store.save_edge(edge.clone()).await?;
        tracing::info!(edge_id = %edge.id, subject = %subject, target = %target, "precedence linked");
        Ok(edge)
    }

    /// Endpoint checks shared by `link` and `replace_predecessors`.
    async fn check_link(&self, subject: &Task, target: TaskId) -> Result<(), OrdoError> {
        if subject.id == target {
            return Err(OrdoError::Validation(format!("{target} cannot precede itself")));
        }
        let target_task = self.load(target).await?;
        if !subject.is_live() || !target_task.is_live() {
            return Err(OrdoError::Validation(
                "cannot link a task that is in the trash".into(),
            ));
        }
        if subject.owner != target_task.owner {
            return Err(OrdoError::Validation(format!(
                "{} and {target} belong to different owners",
                subject.id
            )));
        }
        Ok(())
    }

    /// Soft-delete every live edge from `subject` to `target` in one commit.
    /// Returns how many were removed.
    pub async fn unlink(&self, subject: TaskId, target: TaskId) -> Result<usize, OrdoError> {
        let now = self.clock.now();
        let mut changes = ChangeSet::new();
        for mut edge in self.store.list_edges(subject, EdgeDirection::Predecessors).await? {
            if edge.is_live() && edge.connects(subject, target) {
                edge.soft_delete(now);
                changes.save_edge(edge);
            }
        }
        let removed = changes.len();
        if !changes.is_empty() {
            self.store.commit(changes).await?;
        }
        tracing::info!(subject = %subject, target = %target, removed, "precedence unlinked");
        Ok(removed)
    }

    /// Make `targets` exactly the set of tasks `task_id` comes after.
    ///
    /// Every target is checked before anything is written; removals and
    /// additions then land in one commit, so a rejected target leaves the
    /// previous set intact.
    pub async fn replace_predecessors(
        &self,
        task_id: TaskId,
        targets: &[TaskId],
    ) -> Result<Vec<PrecedenceEdge>, OrdoError> {
        let subject = self.load(task_id).await?;
        let mut wanted: Vec<TaskId> = Vec::with_capacity(targets.len());
        for &target in targets {
            if !wanted.contains(&target) {
                self.check_link(&subject, target).await?;
                wanted.push(target);
            }
        }

        let now = self.clock.now();
        let mut changes = ChangeSet::new();
        let mut edges: Vec<PrecedenceEdge> = Vec::with_capacity(wanted.len());
        for mut edge in self
            .store
            .list_edges(task_id, EdgeDirection::Predecessors)
            .await?
        {
            if !edge.is_live() {
                continue;
            }
            let kept = wanted.contains(&edge.target)
                && !edges.iter().any(|e| e.target == edge.target);
            if kept {
                edges.push(edge);
            } else {
                edge.soft_delete(now);
                changes.save_edge(edge);
            }
        }
        for &target in &wanted {
            if !edges.iter().any(|e| e.target == target) {
                let edge = PrecedenceEdge::new(self.ids.generate_edge_id(), task_id, target, now);
                changes.save_edge(edge.clone());
                edges.push(edge);
            }
        }

        let written = changes.len();
        if !changes.is_empty() {
            self.store.commit(changes).await?;
        }
        tracing::info!(task_id = %task_id, count = edges.len(), written, "predecessors replaced");
        Ok(edges)
    }

    pub async fn successors(&self, task_id: TaskId) -> Result<Vec<LinkedTask>, OrdoError> {
        self.graph.successors(task_id).await
    }

    pub async fn predecessors(&self, task_id: TaskId) -> Result<Vec<LinkedTask>, OrdoError> {
        self.graph.predecessors(task_id).await
    }

    // ========================================
    // Listings
    // ========================================

    /// Live tasks of `owner`, ordered by `view` (or the configured default).
    pub async fn list_active(
        &self,
        owner: UserId,
        view: Option<&ViewConfig>,
    ) -> Result<Vec<Task>, OrdoError> {
        let view = view.unwrap_or(&self.config.default_view);
        let tasks = self.store.list_tasks(owner).await?;
        Ok(project(tasks.into_iter().filter(Task::is_live), view))
    }

    /// Trashed tasks of `owner`, most recently deleted first.
    pub async fn list_trash(&self, owner: UserId) -> Result<Vec<Task>, OrdoError> {
        let mut tasks: Vec<Task> = self
            .store
            .list_tasks(owner)
            .await?
            .into_iter()
            .filter(|t| !t.is_live())
            .collect();
        tasks.sort_by(|a, b| {
            b.deleted_at()
                .cmp(&a.deleted_at())
                .then_with(|| a.title.cmp(&b.title))
        });
        Ok(tasks)
    }

    /// Recompute urgency and score for live open tasks, since urgency moves
    /// with time. Returns how many tasks changed.
    pub async fn refresh_scores(&self, owner: UserId) -> Result<usize, OrdoError> {
        let now = self.clock.now();
        let mut changes = ChangeSet::new();
        for mut task in self.store.list_tasks(owner).await? {
            if !task.is_live() || task.state().is_done() {
                continue;
            }
            let urgency = self.urgency.urgency(task.due);
            if urgency != task.urgency() {
                task.refresh_urgency(urgency, now);
                changes.save_task(task);
            }
        }
        let changed = changes.len();
        if !changes.is_empty() {
            self.store.commit(changes).await?;
        }
        tracing::debug!(owner = %owner, changed, "scores refreshed");
        Ok(changed)
    }
}
