//! Family/relationship entity types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

/// A family/relationship entity. Connection leveling is linear
/// (`level = xp / 100 + 1`), intentionally a different scale from stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyMember {
    pub id: Uuid,
    pub user_id: UserId,
    pub name: String,
    pub connection_xp: u64,
    pub connection_level: u32,
    pub created_at: DateTime<Utc>,
}
