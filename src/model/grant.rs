//! XP grant ledger types.
//!
//! A grant is an immutable record of one XP award to one entity from one
//! source. Rows are inserted before the entity-side update and never
//! mutated; entity totals can be rebuilt by replaying the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;
use crate::error::Error;

/// Newtype for grant IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrantId(pub Uuid);

impl GrantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for GrantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

impl Default for GrantId {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Entity and source kinds
// ---------------------------------------------------------------------------

/// What kind of entity a grant targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// A character stat. Leveled through the curve.
    CharacterStat,
    /// A family/relationship entity. Linear connection leveling.
    FamilyMember,
    /// Ledger-only for now.
    Goal,
    /// Ledger-only for now.
    Project,
    /// Ledger-only for now.
    Adventure,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntityType::CharacterStat => "character_stat",
            EntityType::FamilyMember => "family_member",
            EntityType::Goal => "goal",
            EntityType::Project => "project",
            EntityType::Adventure => "adventure",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for EntityType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "character_stat" => Ok(EntityType::CharacterStat),
            "family_member" => Ok(EntityType::FamilyMember),
            "goal" => Ok(EntityType::Goal),
            "project" => Ok(EntityType::Project),
            "adventure" => Ok(EntityType::Adventure),
            other => Err(Error::Other(format!("unknown entity type: {other}"))),
        }
    }
}

/// What produced a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Journal,
    Quest,
    Task,
    Manual,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SourceType::Journal => "journal",
            SourceType::Quest => "quest",
            SourceType::Task => "task",
            SourceType::Manual => "manual",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for SourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "journal" => Ok(SourceType::Journal),
            "quest" => Ok(SourceType::Quest),
            "task" => Ok(SourceType::Task),
            "manual" => Ok(SourceType::Manual),
            other => Err(Error::Other(format!("unknown source type: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Grant row
// ---------------------------------------------------------------------------

/// One ledger row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpGrant {
    pub id: GrantId,
    pub user_id: UserId,
    pub entity_type: EntityType,
    pub entity_id: Uuid,

    /// Signed: struggling/negative-sentiment journal content can emit
    /// negative awards.
    pub amount: i64,

    pub source_type: SourceType,
    pub source_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
