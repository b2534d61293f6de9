//! The XP-ledger write path shared by task completion, journal
//! finalization, and manual awards.
//!
//! The ledger row is inserted FIRST, in its own statement — the audit
//! trail survives a failed entity-side update. An orphaned ledger row
//! without a matching entity change is a known, accepted inconsistency;
//! reconciliation replays the ledger rather than trusting entity totals.

use crate::error::Result;
use crate::model::grant::{EntityType, GrantId, SourceType, XpGrant};
use crate::model::stat::StatId;
use crate::model::user::UserId;
use crate::progression::{LevelCurve, XpOutcome};
use crate::telemetry::grants::{record_level_change, start_grant_span};
use crate::telemetry::metrics;
use opentelemetry::KeyValue;
use tracing::Instrument;
use uuid::Uuid;

/// What happened when a grant was applied.
#[derive(Debug)]
pub struct GrantOutcome {
    pub grant: XpGrant,
    /// Present only for character-stat grants, which level through the
    /// curve. Other entity kinds either level linearly or not at all.
    pub progression: Option<XpOutcome>,
}

impl super::Db {
    /// Record one XP award: ledger row first, then the entity-side update.
    ///
    /// Entity update errors propagate; the ledger insert is not rolled
    /// back.
    pub async fn grant_xp(
        &self,
        curve: &LevelCurve,
        user_id: UserId,
        entity_type: EntityType,
        entity_id: Uuid,
        amount: i64,
        source_type: SourceType,
        source_id: Option<Uuid>,
    ) -> Result<GrantOutcome> {
        let id = GrantId::new();
        let now = chrono::Utc::now();

        sqlx::query(
            "INSERT INTO xp_grants (id, user_id, entity_type, entity_id, amount, source_type, source_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(id.0)
        .bind(user_id.0)
        .bind(entity_type.to_string())
        .bind(entity_id)
        .bind(amount)
        .bind(source_type.to_string())
        .bind(source_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let span = start_grant_span(&entity_type.to_string(), &entity_id);
        let entity_result = self
            .apply_entity_update(curve, user_id, entity_type, entity_id, amount, &span)
            .instrument(span.clone())
            .await;

        metrics::xp_granted().add(
            1,
            &[
                KeyValue::new("entity_type", entity_type.to_string()),
                KeyValue::new("source_type", source_type.to_string()),
                KeyValue::new(
                    "result",
                    if entity_result.is_ok() {
                        "ok"
                    } else {
                        "entity_error"
                    },
                ),
            ],
        );

        let progression = entity_result?;

        Ok(GrantOutcome {
            grant: XpGrant {
                id,
                user_id,
                entity_type,
                entity_id,
                amount,
                source_type,
                source_id,
                created_at: now,
            },
            progression,
        })
    }

    /// The entity-side half of a grant.
    async fn apply_entity_update(
        &self,
        curve: &LevelCurve,
        user_id: UserId,
        entity_type: EntityType,
        entity_id: Uuid,
        amount: i64,
        span: &tracing::Span,
    ) -> Result<Option<XpOutcome>> {
        match entity_type {
            EntityType::CharacterStat => {
                let stat = self.get_stat(user_id, StatId(entity_id)).await?;
                let outcome = curve.apply_xp(stat.total_xp, stat.current_level, amount);

                sqlx::query(
                    "UPDATE stats SET total_xp = $1, current_level = $2, updated_at = now()
                     WHERE id = $3",
                )
                .bind(outcome.new_total_xp as i64)
                .bind(outcome.new_level as i32)
                .bind(entity_id)
                .execute(&self.pool)
                .await?;

                if outcome.new_level != stat.current_level {
                    record_level_change(span, stat.current_level, outcome.new_level);
                }
                if outcome.leveled_up {
                    metrics::level_ups().add(
                        outcome.levels_gained as u64,
                        &[KeyValue::new("entity_type", "character_stat")],
                    );
                }

                Ok(Some(outcome))
            }
            EntityType::FamilyMember => {
                let before = self.get_family_member(user_id, entity_id).await?;
                let after = self.apply_connection_xp(user_id, entity_id, amount).await?;
                if after.connection_level != before.connection_level {
                    record_level_change(span, before.connection_level, after.connection_level);
                }
                Ok(None)
            }
            // Ledger-only kinds: no entity-side numeric field yet.
            EntityType::Goal | EntityType::Project | EntityType::Adventure => Ok(None),
        }
    }

    /// List a user's ledger rows, newest first.
    pub async fn list_grants(&self, user_id: UserId, limit: i64) -> Result<Vec<XpGrant>> {
        let rows: Vec<XpGrantRow> = sqlx::query_as(
            "SELECT id, user_id, entity_type, entity_id, amount, source_type, source_id, created_at
             FROM xp_grants WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(user_id.0)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(XpGrantRow::try_into_grant).collect()
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct XpGrantRow {
    id: Uuid,
    user_id: Uuid,
    entity_type: String,
    entity_id: Uuid,
    amount: i64,
    source_type: String,
    source_id: Option<Uuid>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl XpGrantRow {
    fn try_into_grant(self) -> Result<XpGrant> {
        Ok(XpGrant {
            id: GrantId(self.id),
            user_id: UserId(self.user_id),
            entity_type: self.entity_type.parse()?,
            entity_id: self.entity_id,
            amount: self.amount,
            source_type: self.source_type.parse()?,
            source_id: self.source_id,
            created_at: self.created_at,
        })
    }
}
