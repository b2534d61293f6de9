//! Task types.
//!
//! A task is a unit of intended effort. It has a source (where it came
//! from), a lifecycle status, an XP estimate, and up to three coexisting
//! stat-link shapes: the modern `linked_stat_ids` list, the legacy single
//! `stat_id`, and an indirect link via the day's focus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stat::StatId;
use super::user::UserId;
use crate::error::Error;

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// Newtype for task IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

/// A tracked task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    pub title: String,

    /// Where this task came from. Determines award eligibility:
    /// todo-sourced tasks never award XP.
    pub source: TaskSource,

    pub status: TaskStatus,

    /// XP awarded to every linked stat on completion. Forced to 0 for
    /// todo-sourced tasks at write time.
    pub estimated_xp: i64,

    /// Legacy single stat link. Still honored during award resolution.
    pub stat_id: Option<StatId>,

    /// Modern multi-stat link.
    pub linked_stat_ids: Vec<StatId>,

    /// Focus-of-the-day this task was generated under, if any. The focus's
    /// stat becomes an award candidate.
    pub focus_id: Option<Uuid>,

    /// Ad-hoc definition this task instantiates, if any. The definition's
    /// (stat, xp) pair overrides all other award sources.
    pub adhoc_task_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Open, awaiting completion or skip.
    Pending,
    /// Done. The only status that awards XP. Terminal.
    Completed,
    /// Explicitly declined. Never awards. Terminal.
    Skipped,
}

impl TaskStatus {
    /// Can transition from self to `to`?
    pub fn can_transition_to(self, to: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!((self, to), (Pending, Completed) | (Pending, Skipped))
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
            TaskStatus::Skipped => "skipped",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            "skipped" => Ok(TaskStatus::Skipped),
            other => Err(Error::Other(format!("unknown task status: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Where a task came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSource {
    /// Generated by the daily suggestion sweep.
    Ai,
    /// Spawned from a quest.
    Quest,
    /// Spawned from an experiment.
    Experiment,
    /// Plain checklist item. Excluded from the XP system entirely.
    Todo,
    /// Instantiated from a user-defined ad-hoc definition.
    Adhoc,
    /// Imported from an outside system.
    External,
}

impl TaskSource {
    /// Todo-sourced tasks carry no XP and no stat links, enforced at
    /// write time regardless of client-supplied values.
    pub fn awards_xp(self) -> bool {
        !matches!(self, TaskSource::Todo)
    }
}

impl std::fmt::Display for TaskSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskSource::Ai => "ai",
            TaskSource::Quest => "quest",
            TaskSource::Experiment => "experiment",
            TaskSource::Todo => "todo",
            TaskSource::Adhoc => "adhoc",
            TaskSource::External => "external",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for TaskSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ai" => Ok(TaskSource::Ai),
            "quest" => Ok(TaskSource::Quest),
            "experiment" => Ok(TaskSource::Experiment),
            "todo" => Ok(TaskSource::Todo),
            "adhoc" => Ok(TaskSource::Adhoc),
            "external" => Ok(TaskSource::External),
            other => Err(Error::Other(format!("unknown task source: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Ad-hoc definitions and focuses
// ---------------------------------------------------------------------------

/// A user-defined one-off task definition with an authoritative
/// (stat, xp) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdhocTask {
    pub id: Uuid,
    pub user_id: UserId,
    pub title: String,
    pub xp: i64,
    pub stat_id: StatId,
}

/// A day-of-week theme linked to a default stat (weekday 0 = Monday).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Focus {
    pub id: Uuid,
    pub user_id: UserId,
    pub weekday: i16,
    pub theme: String,
    pub stat_id: StatId,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for creating new tasks. The data layer's public API for inserts.
pub struct NewTask {
    pub(crate) user_id: UserId,
    pub(crate) title: String,
    pub(crate) source: TaskSource,
    pub(crate) estimated_xp: i64,
    pub(crate) stat_id: Option<StatId>,
    pub(crate) linked_stat_ids: Vec<StatId>,
    pub(crate) focus_id: Option<Uuid>,
    pub(crate) adhoc_task_id: Option<Uuid>,
}

impl NewTask {
    pub fn new(user_id: UserId, title: impl Into<String>, source: TaskSource) -> Self {
        Self {
            user_id,
            title: title.into(),
            source,
            estimated_xp: 0,
            stat_id: None,
            linked_stat_ids: Vec::new(),
            focus_id: None,
            adhoc_task_id: None,
        }
    }

    pub fn estimated_xp(mut self, xp: i64) -> Self {
        self.estimated_xp = xp;
        self
    }

    /// Legacy single stat link.
    pub fn stat(mut self, stat_id: StatId) -> Self {
        self.stat_id = Some(stat_id);
        self
    }

    pub fn linked_stats(mut self, stat_ids: Vec<StatId>) -> Self {
        self.linked_stat_ids = stat_ids;
        self
    }

    pub fn focus(mut self, focus_id: Uuid) -> Self {
        self.focus_id = Some(focus_id);
        self
    }

    pub fn adhoc(mut self, adhoc_task_id: Uuid) -> Self {
        self.adhoc_task_id = Some(adhoc_task_id);
        self
    }
}
