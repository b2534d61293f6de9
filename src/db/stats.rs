//! Stat operations: progression edits, explicit level-ups, lookups.

use crate::error::{Error, Result};
use crate::model::stat::{Stat, StatId};
use crate::model::user::UserId;
use crate::progression::{LevelCurve, XpOutcome};
use crate::telemetry::metrics;
use opentelemetry::KeyValue;
use uuid::Uuid;

/// Result of a level-up attempt within a "level up all" pass.
#[derive(Debug)]
pub enum LevelUpStatus {
    LeveledUp(XpOutcome),
    /// The stat's total is below the next threshold — reported, not
    /// silently skipped.
    NotReady { total_xp: u64, required: u64 },
}

/// One stat's entry in a "level up all" result.
#[derive(Debug)]
pub struct StatLevelUp {
    pub stat_id: StatId,
    pub name: String,
    pub status: LevelUpStatus,
}

impl super::Db {
    /// Create a stat for a user. Names are unique per owner.
    pub async fn create_stat(&self, user_id: UserId, name: impl Into<String>) -> Result<Stat> {
        let id = StatId::new();
        let now = chrono::Utc::now();

        sqlx::query(
            "INSERT INTO stats (id, user_id, name, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)",
        )
        .bind(id.0)
        .bind(user_id.0)
        .bind(name.into())
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_stat(user_id, id).await
    }

    /// Get a stat by ID, scoped to its owner. A stat that exists but
    /// belongs to someone else is indistinguishable from a missing one.
    pub async fn get_stat(&self, user_id: UserId, id: StatId) -> Result<Stat> {
        let row: Option<StatRow> = sqlx::query_as(
            "SELECT id, user_id, name, current_level, total_xp, level_title, created_at, updated_at
             FROM stats WHERE id = $1 AND user_id = $2",
        )
        .bind(id.0)
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Stat::from)
            .ok_or_else(|| Error::NotFound(format!("stat {id}")))
    }

    /// List a user's stats, by name.
    pub async fn list_stats(&self, user_id: UserId) -> Result<Vec<Stat>> {
        let rows: Vec<StatRow> = sqlx::query_as(
            "SELECT id, user_id, name, current_level, total_xp, level_title, created_at, updated_at
             FROM stats WHERE user_id = $1 ORDER BY name",
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Stat::from).collect())
    }

    /// Filter candidate stat ids down to those that exist and belong to
    /// the user. Award assembly uses this to drop dangling legacy/focus
    /// references silently.
    pub async fn existing_stat_ids(
        &self,
        user_id: UserId,
        candidates: &[StatId],
    ) -> Result<Vec<StatId>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = candidates.iter().map(|s| s.0).collect();
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM stats WHERE user_id = $1 AND id = ANY($2)",
        )
        .bind(user_id.0)
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let found: Vec<Uuid> = rows.into_iter().map(|r| r.0).collect();
        // Preserve candidate order; the resolver's dedup is order-sensitive.
        Ok(candidates
            .iter()
            .copied()
            .filter(|c| found.contains(&c.0))
            .collect())
    }

    /// Directly set a stat's progression.
    ///
    /// The (total_xp, level) pair is validated against the curve before
    /// any write — an inconsistent pair is an error, never a silent fix.
    pub async fn set_progression(
        &self,
        curve: &LevelCurve,
        user_id: UserId,
        id: StatId,
        total_xp: u64,
        level: u32,
    ) -> Result<Stat> {
        curve.validate(total_xp, level)?;

        let rows_affected = sqlx::query(
            "UPDATE stats SET total_xp = $1, current_level = $2, updated_at = now()
             WHERE id = $3 AND user_id = $4",
        )
        .bind(total_xp as i64)
        .bind(level as i32)
        .bind(id.0)
        .bind(user_id.0)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(Error::NotFound(format!("stat {id}")));
        }

        self.get_stat(user_id, id).await
    }

    /// Set the level title on a stat (best-effort narration output).
    pub async fn set_level_title(
        &self,
        user_id: UserId,
        id: StatId,
        title: impl Into<String>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE stats SET level_title = $1, updated_at = now()
             WHERE id = $2 AND user_id = $3",
        )
        .bind(title.into())
        .bind(id.0)
        .bind(user_id.0)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Resolve an explicit level-up request for one stat.
    ///
    /// Errors with `NotReadyForLevelUp` when the stat's total is below the
    /// next threshold; on success persists the promoted level and returns
    /// the outcome (one event per level crossed).
    pub async fn level_up_stat(
        &self,
        curve: &LevelCurve,
        user_id: UserId,
        id: StatId,
    ) -> Result<XpOutcome> {
        let stat = self.get_stat(user_id, id).await?;
        let outcome = curve.resolve_level_up(&stat.name, stat.total_xp, stat.current_level)?;

        sqlx::query(
            "UPDATE stats SET current_level = $1, updated_at = now()
             WHERE id = $2 AND user_id = $3",
        )
        .bind(outcome.new_level as i32)
        .bind(id.0)
        .bind(user_id.0)
        .execute(&self.pool)
        .await?;

        metrics::level_ups().add(
            outcome.levels_gained as u64,
            &[KeyValue::new("entity_type", "character_stat")],
        );

        Ok(outcome)
    }

    /// Attempt a level-up on every stat the user owns.
    ///
    /// Per-stat results: ready stats are promoted, not-ready stats are
    /// reported distinctly. One entry per stat, never an aborted batch.
    pub async fn level_up_all(
        &self,
        curve: &LevelCurve,
        user_id: UserId,
    ) -> Result<Vec<StatLevelUp>> {
        let stats = self.list_stats(user_id).await?;
        let mut results = Vec::with_capacity(stats.len());

        for stat in stats {
            let status = match self.level_up_stat(curve, user_id, stat.id).await {
                Ok(outcome) => LevelUpStatus::LeveledUp(outcome),
                Err(Error::NotReadyForLevelUp {
                    total_xp, required, ..
                }) => LevelUpStatus::NotReady { total_xp, required },
                Err(e) => return Err(e),
            };
            results.push(StatLevelUp {
                stat_id: stat.id,
                name: stat.name,
                status,
            });
        }

        Ok(results)
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct StatRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    current_level: i32,
    total_xp: i64,
    level_title: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<StatRow> for Stat {
    fn from(row: StatRow) -> Self {
        Self {
            id: StatId(row.id),
            user_id: UserId(row.user_id),
            name: row.name,
            current_level: row.current_level as u32,
            total_xp: row.total_xp.max(0) as u64,
            level_title: row.level_title,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
