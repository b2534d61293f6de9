//! Integration tests for the progression engine.

use arete::error::Error;
use arete::progression::{LevelCurve, connection_level_for};

fn curve() -> LevelCurve {
    LevelCurve::default()
}

// ---------------------------------------------------------------------------
// Curve shape
// ---------------------------------------------------------------------------

#[test]
fn default_curve_matches_known_thresholds() {
    let curve = curve();

    // Level 1 is free; 300 total reaches 2, 600 reaches 3, 1000 reaches 4.
    assert_eq!(curve.threshold(1), Some(0));
    assert_eq!(curve.threshold(2), Some(300));
    assert_eq!(curve.threshold(3), Some(600));
    assert_eq!(curve.threshold(4), Some(1000));
}

#[test]
fn level_for_picks_largest_reached_level() {
    let curve = curve();

    assert_eq!(curve.level_for(0), 1);
    assert_eq!(curve.level_for(299), 1);
    assert_eq!(curve.level_for(300), 2);
    assert_eq!(curve.level_for(599), 2);
    assert_eq!(curve.level_for(600), 3);
    assert_eq!(curve.level_for(1000), 4);
    assert_eq!(curve.level_for(1200), 4);
}

#[test]
fn level_caps_at_table_end() {
    let curve = curve();
    assert_eq!(curve.level_for(u64::MAX), curve.max_level());
    assert_eq!(curve.next_threshold(curve.max_level()), None);
}

#[test]
fn curve_rejects_bad_tables() {
    assert!(LevelCurve::new(vec![]).is_err());
    assert!(LevelCurve::new(vec![100, 300]).is_err());
    assert!(LevelCurve::new(vec![0, 300, 300]).is_err());
    assert!(LevelCurve::new(vec![0, 300, 200]).is_err());
    assert!(LevelCurve::new(vec![0, 300, 600]).is_ok());
}

#[test]
fn curve_loads_from_toml() {
    let curve = LevelCurve::from_toml_str("thresholds = [0, 100, 250]").unwrap();
    assert_eq!(curve.max_level(), 3);
    assert_eq!(curve.level_for(120), 2);

    assert!(LevelCurve::from_toml_str("thresholds = [5, 10]").is_err());
    assert!(LevelCurve::from_toml_str("not even toml [").is_err());
}

// ---------------------------------------------------------------------------
// apply_xp
// ---------------------------------------------------------------------------

#[test]
fn positive_delta_adds_to_total() {
    let curve = curve();
    let outcome = curve.apply_xp(100, 1, 50);

    assert_eq!(outcome.new_total_xp, 150);
    assert_eq!(outcome.new_level, 1);
    assert!(!outcome.leveled_up);
    assert_eq!(outcome.levels_gained, 0);
    assert!(outcome.level_events.is_empty());
}

#[test]
fn zero_delta_is_identity() {
    let curve = curve();
    let outcome = curve.apply_xp(250, 1, 0);

    assert_eq!(outcome.new_total_xp, 250);
    assert_eq!(outcome.new_level, 1);
    assert!(!outcome.leveled_up);
    assert_eq!(outcome.levels_gained, 0);
    assert!(outcome.level_events.is_empty());
}

#[test]
fn single_level_jump() {
    let curve = curve();
    let outcome = curve.apply_xp(0, 1, 400);

    assert_eq!(outcome.new_total_xp, 400);
    assert_eq!(outcome.new_level, 2);
    assert!(outcome.leveled_up);
    assert_eq!(outcome.levels_gained, 1);
    assert_eq!(outcome.level_events.len(), 1);
    assert_eq!(outcome.level_events[0].level, 2);
}

#[test]
fn multi_level_jump_reports_each_level_in_order() {
    let curve = curve();

    // 650 crosses the 300 and 600 thresholds in one grant.
    let outcome = curve.apply_xp(0, 1, 650);

    assert_eq!(outcome.new_total_xp, 650);
    assert_eq!(outcome.new_level, 3);
    assert_eq!(outcome.levels_gained, 2);
    assert_eq!(outcome.level_events.len(), 2);
    assert_eq!(outcome.level_events[0].level, 2);
    assert_eq!(outcome.level_events[1].level, 3);
    assert!(outcome.level_events.iter().all(|e| e.title.is_none()));
}

#[test]
fn negative_delta_floors_at_zero() {
    let curve = curve();
    let outcome = curve.apply_xp(100, 1, -500);

    assert_eq!(outcome.new_total_xp, 0);
    assert_eq!(outcome.new_level, 1);
    assert!(!outcome.leveled_up);
    assert_eq!(outcome.levels_gained, 0);
}

#[test]
fn negative_delta_can_lower_level_without_events() {
    let curve = curve();

    // 700 total is level 3; dropping to 200 lands back at level 1.
    let outcome = curve.apply_xp(700, 3, -500);

    assert_eq!(outcome.new_total_xp, 200);
    assert_eq!(outcome.new_level, 1);
    assert!(!outcome.leveled_up);
    assert_eq!(outcome.levels_gained, 0);
    assert!(outcome.level_events.is_empty());
}

#[test]
fn level_never_decreases_for_nonnegative_delta() {
    let curve = curve();
    for total in [0u64, 299, 300, 650, 1000, 5000] {
        for delta in [0i64, 1, 300, 650, 10_000] {
            let level = curve.level_for(total);
            let outcome = curve.apply_xp(total, level, delta);
            assert_eq!(outcome.new_total_xp, total + delta as u64);
            assert!(outcome.new_level >= level);
        }
    }
}

// ---------------------------------------------------------------------------
// Explicit level-up
// ---------------------------------------------------------------------------

#[test]
fn level_up_resolves_pending_levels() {
    let curve = curve();

    // The end-to-end fixture: totals {400, 700, 1200} at levels {1, 1, 2}
    // resolve to {2, 3, 4}.
    let a = curve.resolve_level_up("Craft", 400, 1).unwrap();
    assert_eq!(a.new_level, 2);
    assert_eq!(a.levels_gained, 1);

    let b = curve.resolve_level_up("Craft", 700, 1).unwrap();
    assert_eq!(b.new_level, 3);
    assert_eq!(b.levels_gained, 2);
    assert_eq!(b.level_events.len(), 2);

    let c = curve.resolve_level_up("Craft", 1200, 2).unwrap();
    assert_eq!(c.new_level, 4);
    assert_eq!(c.levels_gained, 2);
}

#[test]
fn level_up_rejects_not_ready_stat() {
    let curve = curve();

    let err = curve.resolve_level_up("Discipline", 299, 1).unwrap_err();
    match err {
        Error::NotReadyForLevelUp {
            stat,
            total_xp,
            required,
        } => {
            assert_eq!(stat, "Discipline");
            assert_eq!(total_xp, 299);
            assert_eq!(required, 300);
        }
        other => panic!("expected NotReadyForLevelUp, got {other:?}"),
    }
}

#[test]
fn second_level_up_without_new_xp_is_rejected() {
    let curve = curve();

    // Exactly at the level-2 threshold: first resolution promotes...
    let outcome = curve.resolve_level_up("Craft", 300, 1).unwrap();
    assert_eq!(outcome.new_level, 2);

    // ...the second attempt has nothing left to resolve.
    let err = curve.resolve_level_up("Craft", 300, 2).unwrap_err();
    assert!(matches!(err, Error::NotReadyForLevelUp { .. }));
}

// ---------------------------------------------------------------------------
// Progression edit validation
// ---------------------------------------------------------------------------

#[test]
fn validate_rejects_overclaimed_level() {
    let curve = curve();

    // Claiming level 5 with 100 total XP is inconsistent.
    let err = curve.validate(100, 5).unwrap_err();
    assert!(matches!(
        err,
        Error::InconsistentProgression {
            level: 5,
            total_xp: 100
        }
    ));

    assert!(curve.validate(0, 0).is_err());
    assert!(curve.validate(u64::MAX, curve.max_level() + 1).is_err());
}

#[test]
fn validate_allows_lagging_level() {
    let curve = curve();

    // A level below what the total has earned is the pending-level-up
    // state, not an inconsistency.
    assert!(curve.validate(400, 1).is_ok());
    assert!(curve.validate(400, 2).is_ok());
    assert!(curve.validate(0, 1).is_ok());
}

// ---------------------------------------------------------------------------
// Connection leveling
// ---------------------------------------------------------------------------

#[test]
fn connection_level_is_linear() {
    assert_eq!(connection_level_for(0), 1);
    assert_eq!(connection_level_for(99), 1);
    assert_eq!(connection_level_for(100), 2);
    assert_eq!(connection_level_for(250), 3);
    assert_eq!(connection_level_for(1000), 11);
}
