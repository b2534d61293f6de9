//! Stat-award resolution for completed tasks.
//!
//! Given a task about to be marked complete, decide which stats get XP and
//! how much. Pure function over already-fetched rows: the caller resolves
//! the focus→stat mapping and the ad-hoc definition before calling in.

use crate::model::stat::StatId;
use crate::model::task::{TaskSource, TaskStatus};

/// Everything award resolution needs, assembled by the caller. Dangling
/// legacy/focus references are dropped during assembly (best-effort union),
/// so every id here is presumed live.
#[derive(Debug, Clone)]
pub struct AwardInput {
    pub status: TaskStatus,
    pub source: TaskSource,

    /// Applied uniformly to every resolved stat — there are no per-stat
    /// differential amounts within one completion.
    pub estimated_xp: i64,

    /// Modern multi-stat link.
    pub linked_stat_ids: Vec<StatId>,

    /// Legacy single stat link.
    pub legacy_stat_id: Option<StatId>,

    /// The stat behind the task's focus-of-the-day, if any.
    pub focus_stat_id: Option<StatId>,

    /// The ad-hoc definition's (stat, xp) pair, if the task instantiates
    /// one. Authoritative: overrides every other source.
    pub adhoc: Option<AdhocAward>,
}

/// An ad-hoc definition's award, resolved from its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdhocAward {
    pub stat_id: StatId,
    pub xp: i64,
}

/// One resolved award: this stat gets this much XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatAward {
    pub stat_id: StatId,
    pub xp: i64,
}

/// Resolve the final, deduplicated award set for a task.
///
/// Precedence:
/// 1. Anything not completed awards nothing — XP is gated strictly on
///    completion.
/// 2. Todo-sourced tasks award nothing, independent of the write-time
///    forcing of their XP/stat fields.
/// 3. An ad-hoc definition's (stat, xp) pair wins outright.
/// 4. Otherwise: union of linked list, legacy field, and focus stat,
///    deduplicated by stat id (first occurrence wins), each receiving the
///    task's single estimated XP.
pub fn resolve_awards(input: &AwardInput) -> Vec<StatAward> {
    if input.status != TaskStatus::Completed {
        return Vec::new();
    }
    if !input.source.awards_xp() {
        return Vec::new();
    }

    if let Some(adhoc) = input.adhoc {
        return vec![StatAward {
            stat_id: adhoc.stat_id,
            xp: adhoc.xp,
        }];
    }

    let mut stat_ids: Vec<StatId> = Vec::new();
    let candidates = input
        .linked_stat_ids
        .iter()
        .copied()
        .chain(input.legacy_stat_id)
        .chain(input.focus_stat_id);
    for id in candidates {
        // A stat referenced by two routes gets exactly one award.
        if !stat_ids.contains(&id) {
            stat_ids.push(id);
        }
    }

    stat_ids
        .into_iter()
        .map(|stat_id| StatAward {
            stat_id,
            xp: input.estimated_xp,
        })
        .collect()
}
