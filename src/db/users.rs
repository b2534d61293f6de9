//! User operations: onboarding with default stat seeding, lookups.

use crate::error::{Error, Result};
use crate::model::stat::{DEFAULT_STAT_NAMES, StatId};
use crate::model::user::{User, UserId};
use tracing::info;
use uuid::Uuid;

impl super::Db {
    /// Create a user and seed the system-default stat set.
    pub async fn create_user(
        &self,
        email: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<User> {
        let id = UserId::new();
        let email = email.into();
        let display_name = display_name.into();
        let now = chrono::Utc::now();

        sqlx::query(
            "INSERT INTO users (id, email, display_name, created_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id.0)
        .bind(&email)
        .bind(&display_name)
        .bind(now)
        .execute(&self.pool)
        .await?;

        for name in DEFAULT_STAT_NAMES {
            sqlx::query(
                "INSERT INTO stats (id, user_id, name, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $4)",
            )
            .bind(StatId::new().0)
            .bind(id.0)
            .bind(name)
            .bind(now)
            .execute(&self.pool)
            .await?;
        }

        info!(user = %id, %email, "user created with default stats");
        self.get_user(id).await
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: UserId) -> Result<User> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, display_name, created_at FROM users WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::from)
            .ok_or_else(|| Error::NotFound(format!("user {id}")))
    }

    /// List all users, oldest first. The generation sweep iterates this.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, email, display_name, created_at FROM users ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    display_name: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId(row.id),
            email: row.email,
            display_name: row.display_name,
            created_at: row.created_at,
        }
    }
}
