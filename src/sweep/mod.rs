//! Daily task-generation sweep.
//!
//! Triggered externally (cron or an operator command), not an in-process
//! scheduler: one pass iterates users sequentially, asks the content
//! collaborator for suggestions, and inserts tasks with source `ai`. A
//! failure for one user is caught and counted without aborting the rest.

use std::sync::Arc;
use std::time::Instant;

use chrono::Datelike;
use opentelemetry::KeyValue;
use tracing::{error, info};

use crate::db::Db;
use crate::error::Result;
use crate::llm::{Narrator, SuggestionContext};
use crate::model::task::{NewTask, TaskSource, TaskStatus};
use crate::model::user::User;
use crate::telemetry::metrics;

/// Configuration for one sweep pass.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Upper bound on tasks created per user per pass.
    pub max_tasks_per_user: usize,
    /// How many recently completed tasks to show the collaborator.
    pub recent_limit: i64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            max_tasks_per_user: 3,
            recent_limit: 10,
        }
    }
}

/// Summary of one sweep pass.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub users_processed: usize,
    pub users_failed: usize,
    pub tasks_created: usize,
}

/// The generation sweep. Holds its collaborators explicitly — constructed
/// once per pass, no hidden singletons.
pub struct Sweep {
    db: Arc<Db>,
    narrator: Narrator,
    config: SweepConfig,
}

impl Sweep {
    pub fn new(db: Arc<Db>, narrator: Narrator, config: SweepConfig) -> Self {
        Self {
            db,
            narrator,
            config,
        }
    }

    /// Run one pass over all users.
    pub async fn run(&self) -> Result<SweepReport> {
        let start = Instant::now();
        let users = self.db.list_users().await?;
        let mut report = SweepReport::default();

        info!(users = users.len(), "generation sweep started");

        for user in &users {
            match self.generate_for_user(user).await {
                Ok(created) => {
                    report.users_processed += 1;
                    report.tasks_created += created;
                    metrics::sweep_users().add(1, &[KeyValue::new("result", "ok")]);
                }
                Err(e) => {
                    // One user's failure never aborts the rest.
                    error!(user = %user.id, error = %e, "sweep failed for user");
                    report.users_failed += 1;
                    metrics::sweep_users().add(1, &[KeyValue::new("result", "error")]);
                }
            }
        }

        metrics::operation_duration_ms().record(
            start.elapsed().as_millis() as f64,
            &[KeyValue::new("operation", "sweep.run")],
        );
        info!(
            processed = report.users_processed,
            failed = report.users_failed,
            created = report.tasks_created,
            "generation sweep finished"
        );

        Ok(report)
    }

    /// Generate suggestions for one user and insert them as tasks.
    async fn generate_for_user(&self, user: &User) -> Result<usize> {
        let stats = self.db.list_stats(user.id).await?;
        if stats.is_empty() {
            return Ok(0);
        }

        let weekday = chrono::Utc::now().weekday().num_days_from_monday() as i16;
        let focus = self.db.focus_for_weekday(user.id, weekday).await?;

        let recent = self
            .db
            .list_tasks(user.id, Some(TaskStatus::Completed), self.config.recent_limit)
            .await?;

        let ctx = SuggestionContext {
            display_name: user.display_name.clone(),
            stats: stats.iter().map(|s| (s.name.clone(), s.current_level)).collect(),
            focus_theme: focus.as_ref().map(|f| f.theme.clone()),
            recent_titles: recent.into_iter().map(|t| t.title).collect(),
            max_tasks: self.config.max_tasks_per_user,
        };

        let suggestions = self.narrator.suggest_tasks(&ctx).await?;

        let mut created = 0;
        for suggestion in suggestions.into_iter().take(self.config.max_tasks_per_user) {
            // Match the suggested stat by name; an unknown name just means
            // no direct link (the focus link may still award).
            let linked = suggestion
                .stat_name
                .as_deref()
                .and_then(|name| {
                    stats
                        .iter()
                        .find(|s| s.name.eq_ignore_ascii_case(name))
                        .map(|s| s.id)
                })
                .into_iter()
                .collect::<Vec<_>>();

            let mut new = NewTask::new(user.id, suggestion.title, TaskSource::Ai)
                .estimated_xp(suggestion.estimated_xp)
                .linked_stats(linked);
            if let Some(ref focus) = focus {
                new = new.focus(focus.id);
            }

            self.db.create_task(new).await?;
            created += 1;
        }

        Ok(created)
    }
}
