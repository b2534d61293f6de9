//! Stat types.
//!
//! A stat is a named progression track owned by a user: a level, a running
//! XP total, and an optional AI-generated title for the current level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stats seeded for every new user at onboarding.
pub const DEFAULT_STAT_NAMES: &[&str] = &[
    "Physical Fitness",
    "Mental Clarity",
    "Relationships",
    "Craft",
    "Discipline",
];

/// Newtype for stat IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatId(pub Uuid);

impl StatId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for StatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

impl Default for StatId {
    fn default() -> Self {
        Self::new()
    }
}

/// A progression track. Invariant: `current_level` is always the curve
/// level for `total_xp`; direct edits that would break this are rejected
/// before any write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stat {
    pub id: StatId,
    pub user_id: super::user::UserId,

    /// Category name, unique per owner (e.g. "Physical Fitness").
    pub name: String,

    pub current_level: u32,

    /// Cumulative XP. Monotonically non-decreasing except for negative
    /// grants, which floor at zero.
    pub total_xp: u64,

    /// Human-readable title for the current level, filled in by the
    /// content collaborator after a level-up. Best-effort.
    pub level_title: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
