//! Progression engine: the level curve and XP arithmetic.
//!
//! Pure functions over small integers. No I/O, no clocks, deterministic —
//! callers persist the results and trigger any downstream labeling.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default cumulative thresholds, one per level starting at level 1.
/// The per-level cost grows by 100 every second level (300, 300, 400,
/// 400, 500, ...).
const DEFAULT_THRESHOLDS: [u64; 20] = [
    0, 300, 600, 1000, 1400, 1900, 2400, 3000, 3600, 4300, 5000, 5800, 6600, 7500, 8400, 9400,
    10400, 11500, 12600, 13800,
];

// ---------------------------------------------------------------------------
// Level curve
// ---------------------------------------------------------------------------

/// The XP-to-level threshold table.
///
/// `thresholds[L - 1]` is the cumulative XP required to have reached level
/// L. Level 1 requires 0. The table is data, not a formula: operators can
/// replace it wholesale via a TOML file. The last table entry is the level
/// cap — XP keeps accumulating past it, but the level does not.
#[derive(Debug, Clone)]
pub struct LevelCurve {
    thresholds: Vec<u64>,
}

/// TOML shape for curve overrides.
#[derive(Debug, Deserialize)]
struct CurveFile {
    thresholds: Vec<u64>,
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self {
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
        }
    }
}

impl LevelCurve {
    /// Build a curve from cumulative thresholds.
    ///
    /// The table must be nonempty, start at 0, and be strictly increasing.
    pub fn new(thresholds: Vec<u64>) -> Result<Self> {
        if thresholds.is_empty() {
            return Err(Error::Config("level curve has no thresholds".to_string()));
        }
        if thresholds[0] != 0 {
            return Err(Error::Config(format!(
                "level 1 threshold must be 0, got {}",
                thresholds[0]
            )));
        }
        for window in thresholds.windows(2) {
            if window[1] <= window[0] {
                return Err(Error::Config(format!(
                    "level curve thresholds must be strictly increasing ({} then {})",
                    window[0], window[1]
                )));
            }
        }
        Ok(Self { thresholds })
    }

    /// Parse a curve from a TOML document with a `thresholds` array.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: CurveFile = toml::from_str(s)
            .map_err(|e| Error::Config(format!("bad level curve file: {e}")))?;
        Self::new(file.thresholds)
    }

    /// Highest reachable level.
    pub fn max_level(&self) -> u32 {
        self.thresholds.len() as u32
    }

    /// Cumulative XP required to have reached `level`. None past the cap.
    pub fn threshold(&self, level: u32) -> Option<u64> {
        if level == 0 {
            return None;
        }
        self.thresholds.get(level as usize - 1).copied()
    }

    /// Cumulative XP required for the level after `level`. None at the cap.
    pub fn next_threshold(&self, level: u32) -> Option<u64> {
        self.threshold(level + 1)
    }

    /// The largest level whose threshold is within `total_xp`.
    pub fn level_for(&self, total_xp: u64) -> u32 {
        // partition_point: count of thresholds <= total_xp. Level 1's
        // threshold is 0, so the result is always >= 1.
        self.thresholds.partition_point(|&t| t <= total_xp) as u32
    }

    /// Apply an XP delta to a stat's progression.
    ///
    /// The new total floors at zero, the new level is recomputed from the
    /// new total, and one [`LevelEvent`] is reported per upward level
    /// crossed, ascending. A negative delta can lower the level;
    /// `levels_gained` saturates at 0 and no events are emitted for
    /// downward movement. Titles on events start empty — they are filled
    /// in later by the content collaborator, and failure to obtain one
    /// never fails the level-up itself.
    pub fn apply_xp(&self, current_total_xp: u64, current_level: u32, delta: i64) -> XpOutcome {
        let new_total_xp = if delta < 0 {
            current_total_xp.saturating_sub(delta.unsigned_abs())
        } else {
            current_total_xp.saturating_add(delta as u64)
        };

        let new_level = self.level_for(new_total_xp);
        let levels_gained = new_level.saturating_sub(current_level);

        XpOutcome {
            new_total_xp,
            new_level,
            leveled_up: levels_gained > 0,
            levels_gained,
            level_events: level_events(current_level, new_level),
        }
    }

    /// Resolve an explicit level-up request.
    ///
    /// Promotes the level to match `total_xp`, reporting every level
    /// crossed. Errors with [`Error::NotReadyForLevelUp`] when the total
    /// is below the next threshold — a distinct condition, not a silent
    /// no-op.
    pub fn resolve_level_up(
        &self,
        stat_name: &str,
        total_xp: u64,
        current_level: u32,
    ) -> Result<XpOutcome> {
        let target = self.level_for(total_xp);
        if target <= current_level {
            // At the table cap there is no next threshold to quote.
            let required = self.next_threshold(current_level).unwrap_or(u64::MAX);
            return Err(Error::NotReadyForLevelUp {
                stat: stat_name.to_string(),
                total_xp,
                required,
            });
        }

        Ok(XpOutcome {
            new_total_xp: total_xp,
            new_level: target,
            leveled_up: true,
            levels_gained: target - current_level,
            level_events: level_events(current_level, target),
        })
    }

    /// Check that a (total_xp, level) pair is consistent with the curve.
    ///
    /// Used by the direct set-progression edit: inconsistent pairs are
    /// rejected before any write, never silently corrected. A level may
    /// lag its total — that is the pending-level-up state the explicit
    /// level-up resolves — but may never exceed what the total has earned.
    pub fn validate(&self, total_xp: u64, level: u32) -> Result<()> {
        match self.threshold(level) {
            Some(required) if required <= total_xp => Ok(()),
            _ => Err(Error::InconsistentProgression { level, total_xp }),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What happened when XP was applied to a stat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpOutcome {
    pub new_total_xp: u64,
    pub new_level: u32,
    pub leveled_up: bool,
    pub levels_gained: u32,

    /// One entry per upward level crossed, in ascending order — a single
    /// grant can cross several thresholds at once and must report each.
    pub level_events: Vec<LevelEvent>,
}

/// One level transition within an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelEvent {
    /// The level reached.
    pub level: u32,

    /// Human-readable title, filled in by the content collaborator.
    pub title: Option<String>,
}

fn level_events(from_level: u32, to_level: u32) -> Vec<LevelEvent> {
    if to_level <= from_level {
        return Vec::new();
    }
    (from_level + 1..=to_level)
        .map(|level| LevelEvent { level, title: None })
        .collect()
}

// ---------------------------------------------------------------------------
// Connection leveling
// ---------------------------------------------------------------------------

/// Linear leveling rule for family/relationship entities: one level per
/// 100 connection XP. Kept apart from the curve — different entity kinds
/// level on different scales.
pub fn connection_level_for(connection_xp: u64) -> u32 {
    (connection_xp / 100 + 1) as u32
}
