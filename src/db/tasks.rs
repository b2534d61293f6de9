//! Task operations: creation with write-time rules, completion with
//! award application, skipping, and the focus/ad-hoc lookups that feed
//! award resolution.

use crate::awards::{AdhocAward, AwardInput, resolve_awards};
use crate::error::{Error, Result};
use crate::model::stat::StatId;
use crate::model::task::{AdhocTask, Focus, NewTask, Task, TaskId, TaskSource, TaskStatus};
use crate::model::user::UserId;
use crate::progression::{LevelCurve, XpOutcome};
use crate::telemetry::metrics;
use opentelemetry::KeyValue;
use tracing::{debug, warn};
use uuid::Uuid;

/// One award actually applied during task completion.
#[derive(Debug)]
pub struct AppliedAward {
    pub stat_id: StatId,
    pub xp: i64,
    pub progression: Option<XpOutcome>,
}

/// Result of completing a task: the task itself plus whatever awards
/// landed. Award failures are skipped, not fatal — `awards` may be
/// shorter than the resolved set.
#[derive(Debug)]
pub struct TaskCompletion {
    pub task: Task,
    pub awards: Vec<AppliedAward>,
}

/// Validate a status transition, returning an error if disallowed.
fn validate_transition(from: TaskStatus, to: TaskStatus) -> Result<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(Error::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

impl super::Db {
    /// Create a task.
    ///
    /// Todo-sourced tasks are forced to zero XP and no stat links here,
    /// regardless of what the builder carried. Referenced ad-hoc and
    /// focus rows must exist and belong to the same user.
    pub async fn create_task(&self, new: NewTask) -> Result<Task> {
        let id = TaskId::new();
        let now = chrono::Utc::now();

        let (estimated_xp, stat_id, linked_stat_ids, focus_id, adhoc_task_id) =
            if new.source.awards_xp() {
                (
                    new.estimated_xp,
                    new.stat_id,
                    new.linked_stat_ids,
                    new.focus_id,
                    new.adhoc_task_id,
                )
            } else {
                (0, None, Vec::new(), None, None)
            };

        if let Some(adhoc_id) = adhoc_task_id {
            self.get_adhoc_task(new.user_id, adhoc_id).await?;
        }
        if let Some(focus_id) = focus_id {
            self.get_focus(new.user_id, focus_id).await?;
        }

        let linked: Vec<Uuid> = linked_stat_ids.iter().map(|s| s.0).collect();
        sqlx::query(
            "INSERT INTO tasks (id, user_id, title, source, status, estimated_xp, stat_id, linked_stat_ids, focus_id, adhoc_task_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)",
        )
        .bind(id.0)
        .bind(new.user_id.0)
        .bind(&new.title)
        .bind(new.source.to_string())
        .bind(TaskStatus::Pending.to_string())
        .bind(estimated_xp)
        .bind(stat_id.map(|s| s.0))
        .bind(&linked)
        .bind(focus_id)
        .bind(adhoc_task_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_task(new.user_id, id).await
    }

    /// Get a task by ID, scoped to its owner.
    pub async fn get_task(&self, user_id: UserId, id: TaskId) -> Result<Task> {
        let row: Option<TaskRow> = sqlx::query_as(
            "SELECT id, user_id, title, source, status, estimated_xp, stat_id, linked_stat_ids, focus_id, adhoc_task_id, created_at, updated_at, completed_at
             FROM tasks WHERE id = $1 AND user_id = $2",
        )
        .bind(id.0)
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| Error::NotFound(format!("task {id}")))?
            .try_into_task()
    }

    /// List a user's tasks, newest first, optionally filtered by status.
    pub async fn list_tasks(
        &self,
        user_id: UserId,
        status: Option<TaskStatus>,
        limit: i64,
    ) -> Result<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT id, user_id, title, source, status, estimated_xp, stat_id, linked_stat_ids, focus_id, adhoc_task_id, created_at, updated_at, completed_at
             FROM tasks
             WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)
             ORDER BY created_at DESC LIMIT $3",
        )
        .bind(user_id.0)
        .bind(status.map(|s| s.to_string()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TaskRow::try_into_task).collect()
    }

    /// Complete a task and apply its stat awards.
    ///
    /// The status flips first (validated, guarded against concurrent
    /// edits), then each resolved award is applied through `grant_xp` —
    /// per stat, not batched. A failure applying one award is logged and
    /// skipped; the completion and the other awards stand.
    pub async fn complete_task(
        &self,
        curve: &LevelCurve,
        user_id: UserId,
        id: TaskId,
    ) -> Result<TaskCompletion> {
        let task = self.get_task(user_id, id).await?;
        validate_transition(task.status, TaskStatus::Completed)?;

        let now = chrono::Utc::now();
        let rows_affected = sqlx::query(
            "UPDATE tasks SET status = 'completed', completed_at = $1, updated_at = $1
             WHERE id = $2 AND status = 'pending'",
        )
        .bind(now)
        .bind(id.0)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(Error::InvalidTransition {
                from: "pending".to_string(),
                to: "completed".to_string(),
            });
        }

        metrics::tasks_completed().add(1, &[KeyValue::new("source", task.source.to_string())]);

        let input = self.assemble_award_input(&task).await?;
        let resolved = resolve_awards(&input);

        let mut awards = Vec::with_capacity(resolved.len());
        for award in resolved {
            match self
                .grant_xp(
                    curve,
                    user_id,
                    crate::model::grant::EntityType::CharacterStat,
                    award.stat_id.0,
                    award.xp,
                    crate::model::grant::SourceType::Task,
                    Some(id.0),
                )
                .await
            {
                Ok(outcome) => {
                    metrics::awards_applied().add(1, &[KeyValue::new("result", "ok")]);
                    awards.push(AppliedAward {
                        stat_id: award.stat_id,
                        xp: award.xp,
                        progression: outcome.progression,
                    });
                }
                Err(e) => {
                    // Partial failure: the task stays completed and the
                    // remaining stats still get their awards.
                    warn!(task = %id, stat = %award.stat_id, error = %e, "award failed, skipping");
                    metrics::awards_applied().add(1, &[KeyValue::new("result", "error")]);
                }
            }
        }

        let task = self.get_task(user_id, id).await?;
        Ok(TaskCompletion { task, awards })
    }

    /// Skip a task. Never awards XP.
    pub async fn skip_task(&self, user_id: UserId, id: TaskId) -> Result<Task> {
        let task = self.get_task(user_id, id).await?;
        validate_transition(task.status, TaskStatus::Skipped)?;

        let rows_affected = sqlx::query(
            "UPDATE tasks SET status = 'skipped', updated_at = now()
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id.0)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(Error::InvalidTransition {
                from: "pending".to_string(),
                to: "skipped".to_string(),
            });
        }

        self.get_task(user_id, id).await
    }

    /// Build the award-resolution input for a task.
    ///
    /// Secondary references are best-effort: a dangling ad-hoc, focus, or
    /// stat link is dropped silently (logged at debug) rather than
    /// failing the completion.
    async fn assemble_award_input(&self, task: &Task) -> Result<AwardInput> {
        let adhoc = match task.adhoc_task_id {
            Some(adhoc_id) => match self.get_adhoc_task(task.user_id, adhoc_id).await {
                Ok(def) => Some(AdhocAward {
                    stat_id: def.stat_id,
                    xp: def.xp,
                }),
                Err(Error::NotFound(_)) => {
                    debug!(task = %task.id, "ad-hoc definition gone, falling back");
                    None
                }
                Err(e) => return Err(e),
            },
            None => None,
        };

        let focus_stat_id = match task.focus_id {
            Some(focus_id) => match self.get_focus(task.user_id, focus_id).await {
                Ok(focus) => Some(focus.stat_id),
                Err(Error::NotFound(_)) => {
                    debug!(task = %task.id, "focus gone, dropping focus award candidate");
                    None
                }
                Err(e) => return Err(e),
            },
            None => None,
        };

        // Drop dangling stat references up front so no ledger rows are
        // written for stats that no longer exist.
        let mut candidates: Vec<StatId> = task.linked_stat_ids.clone();
        candidates.extend(task.stat_id);
        candidates.extend(focus_stat_id);
        let live = self.existing_stat_ids(task.user_id, &candidates).await?;

        Ok(AwardInput {
            status: TaskStatus::Completed,
            source: task.source,
            estimated_xp: task.estimated_xp,
            linked_stat_ids: task
                .linked_stat_ids
                .iter()
                .copied()
                .filter(|s| live.contains(s))
                .collect(),
            legacy_stat_id: task.stat_id.filter(|s| live.contains(s)),
            focus_stat_id: focus_stat_id.filter(|s| live.contains(s)),
            adhoc,
        })
    }

    // -----------------------------------------------------------------------
    // Ad-hoc definitions and focuses
    // -----------------------------------------------------------------------

    /// Create an ad-hoc task definition.
    pub async fn create_adhoc_task(
        &self,
        user_id: UserId,
        title: impl Into<String>,
        xp: i64,
        stat_id: StatId,
    ) -> Result<AdhocTask> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO adhoc_tasks (id, user_id, title, xp, stat_id)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(user_id.0)
        .bind(title.into())
        .bind(xp)
        .bind(stat_id.0)
        .execute(&self.pool)
        .await?;

        self.get_adhoc_task(user_id, id).await
    }

    /// Get an ad-hoc definition, scoped to its owner.
    pub async fn get_adhoc_task(&self, user_id: UserId, id: Uuid) -> Result<AdhocTask> {
        let row: Option<AdhocTaskRow> = sqlx::query_as(
            "SELECT id, user_id, title, xp, stat_id FROM adhoc_tasks
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AdhocTask::from)
            .ok_or_else(|| Error::NotFound(format!("ad-hoc task {id}")))
    }

    /// Create or replace the focus for a weekday (0 = Monday).
    pub async fn set_focus(
        &self,
        user_id: UserId,
        weekday: i16,
        theme: impl Into<String>,
        stat_id: StatId,
    ) -> Result<Focus> {
        let id = Uuid::new_v4();
        let row: (Uuid,) = sqlx::query_as(
            "INSERT INTO focuses (id, user_id, weekday, theme, stat_id)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (user_id, weekday)
             DO UPDATE SET theme = EXCLUDED.theme, stat_id = EXCLUDED.stat_id
             RETURNING id",
        )
        .bind(id)
        .bind(user_id.0)
        .bind(weekday)
        .bind(theme.into())
        .bind(stat_id.0)
        .fetch_one(&self.pool)
        .await?;

        self.get_focus(user_id, row.0).await
    }

    /// Get a focus by ID, scoped to its owner.
    pub async fn get_focus(&self, user_id: UserId, id: Uuid) -> Result<Focus> {
        let row: Option<FocusRow> = sqlx::query_as(
            "SELECT id, user_id, weekday, theme, stat_id FROM focuses
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Focus::from)
            .ok_or_else(|| Error::NotFound(format!("focus {id}")))
    }

    /// The user's focus for a weekday, if one is set.
    pub async fn focus_for_weekday(&self, user_id: UserId, weekday: i16) -> Result<Option<Focus>> {
        let row: Option<FocusRow> = sqlx::query_as(
            "SELECT id, user_id, weekday, theme, stat_id FROM focuses
             WHERE user_id = $1 AND weekday = $2",
        )
        .bind(user_id.0)
        .bind(weekday)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Focus::from))
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    source: String,
    status: String,
    estimated_xp: i64,
    stat_id: Option<Uuid>,
    linked_stat_ids: Vec<Uuid>,
    focus_id: Option<Uuid>,
    adhoc_task_id: Option<Uuid>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl TaskRow {
    fn try_into_task(self) -> Result<Task> {
        Ok(Task {
            id: TaskId(self.id),
            user_id: UserId(self.user_id),
            title: self.title,
            source: self.source.parse::<TaskSource>()?,
            status: self.status.parse::<TaskStatus>()?,
            estimated_xp: self.estimated_xp,
            stat_id: self.stat_id.map(StatId),
            linked_stat_ids: self.linked_stat_ids.into_iter().map(StatId).collect(),
            focus_id: self.focus_id,
            adhoc_task_id: self.adhoc_task_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AdhocTaskRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    xp: i64,
    stat_id: Uuid,
}

impl From<AdhocTaskRow> for AdhocTask {
    fn from(row: AdhocTaskRow) -> Self {
        Self {
            id: row.id,
            user_id: UserId(row.user_id),
            title: row.title,
            xp: row.xp,
            stat_id: StatId(row.stat_id),
        }
    }
}

#[derive(sqlx::FromRow)]
struct FocusRow {
    id: Uuid,
    user_id: Uuid,
    weekday: i16,
    theme: String,
    stat_id: Uuid,
}

impl From<FocusRow> for Focus {
    fn from(row: FocusRow) -> Self {
        Self {
            id: row.id,
            user_id: UserId(row.user_id),
            weekday: row.weekday,
            theme: row.theme,
            stat_id: StatId(row.stat_id),
        }
    }
}
