//! Family/relationship entity operations.

use crate::error::{Error, Result};
use crate::model::family::FamilyMember;
use crate::model::user::UserId;
use crate::progression::connection_level_for;
use uuid::Uuid;

impl super::Db {
    /// Create a family member for a user.
    pub async fn create_family_member(
        &self,
        user_id: UserId,
        name: impl Into<String>,
    ) -> Result<FamilyMember> {
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();

        sqlx::query(
            "INSERT INTO family_members (id, user_id, name, created_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(user_id.0)
        .bind(name.into())
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_family_member(user_id, id).await
    }

    /// Get a family member by ID, scoped to its owner.
    pub async fn get_family_member(&self, user_id: UserId, id: Uuid) -> Result<FamilyMember> {
        let row: Option<FamilyMemberRow> = sqlx::query_as(
            "SELECT id, user_id, name, connection_xp, connection_level, created_at
             FROM family_members WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(FamilyMember::from)
            .ok_or_else(|| Error::NotFound(format!("family member {id}")))
    }

    /// List a user's family members.
    pub async fn list_family_members(&self, user_id: UserId) -> Result<Vec<FamilyMember>> {
        let rows: Vec<FamilyMemberRow> = sqlx::query_as(
            "SELECT id, user_id, name, connection_xp, connection_level, created_at
             FROM family_members WHERE user_id = $1 ORDER BY name",
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(FamilyMember::from).collect())
    }

    /// Apply connection XP: floor at zero, recompute the linear level.
    pub(crate) async fn apply_connection_xp(
        &self,
        user_id: UserId,
        id: Uuid,
        amount: i64,
    ) -> Result<FamilyMember> {
        let member = self.get_family_member(user_id, id).await?;

        let new_xp = if amount < 0 {
            member.connection_xp.saturating_sub(amount.unsigned_abs())
        } else {
            member.connection_xp.saturating_add(amount as u64)
        };
        let new_level = connection_level_for(new_xp);

        sqlx::query(
            "UPDATE family_members SET connection_xp = $1, connection_level = $2
             WHERE id = $3 AND user_id = $4",
        )
        .bind(new_xp as i64)
        .bind(new_level as i32)
        .bind(id)
        .bind(user_id.0)
        .execute(&self.pool)
        .await?;

        self.get_family_member(user_id, id).await
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct FamilyMemberRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    connection_xp: i64,
    connection_level: i32,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<FamilyMemberRow> for FamilyMember {
    fn from(row: FamilyMemberRow) -> Self {
        Self {
            id: row.id,
            user_id: UserId(row.user_id),
            name: row.name,
            connection_xp: row.connection_xp.max(0) as u64,
            connection_level: row.connection_level as u32,
            created_at: row.created_at,
        }
    }
}
