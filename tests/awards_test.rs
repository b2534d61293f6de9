//! Integration tests for stat-award resolution.

use arete::awards::{AdhocAward, AwardInput, resolve_awards};
use arete::model::stat::StatId;
use arete::model::task::{TaskSource, TaskStatus};

fn base_input() -> AwardInput {
    AwardInput {
        status: TaskStatus::Completed,
        source: TaskSource::Ai,
        estimated_xp: 50,
        linked_stat_ids: Vec::new(),
        legacy_stat_id: None,
        focus_stat_id: None,
        adhoc: None,
    }
}

// ---------------------------------------------------------------------------
// Gating
// ---------------------------------------------------------------------------

#[test]
fn non_completed_task_awards_nothing() {
    let stat = StatId::new();

    for status in [TaskStatus::Pending, TaskStatus::Skipped] {
        let input = AwardInput {
            status,
            linked_stat_ids: vec![stat],
            ..base_input()
        };
        assert!(resolve_awards(&input).is_empty(), "{status} should not award");
    }
}

#[test]
fn todo_task_awards_nothing_regardless_of_fields() {
    // Even if stat links and XP somehow survived to resolution, the
    // source alone excludes the task from the XP system.
    let input = AwardInput {
        source: TaskSource::Todo,
        estimated_xp: 500,
        linked_stat_ids: vec![StatId::new(), StatId::new()],
        legacy_stat_id: Some(StatId::new()),
        focus_stat_id: Some(StatId::new()),
        ..base_input()
    };

    assert!(resolve_awards(&input).is_empty());
}

// ---------------------------------------------------------------------------
// Ad-hoc authority
// ---------------------------------------------------------------------------

#[test]
fn adhoc_pair_overrides_all_other_sources() {
    let adhoc_stat = StatId::new();
    let input = AwardInput {
        estimated_xp: 50,
        linked_stat_ids: vec![StatId::new(), StatId::new()],
        legacy_stat_id: Some(StatId::new()),
        focus_stat_id: Some(StatId::new()),
        adhoc: Some(AdhocAward {
            stat_id: adhoc_stat,
            xp: 120,
        }),
        ..base_input()
    };

    let awards = resolve_awards(&input);
    assert_eq!(awards.len(), 1);
    assert_eq!(awards[0].stat_id, adhoc_stat);
    assert_eq!(awards[0].xp, 120);
}

// ---------------------------------------------------------------------------
// Union and dedup
// ---------------------------------------------------------------------------

#[test]
fn candidates_union_across_all_three_link_shapes() {
    let a = StatId::new();
    let b = StatId::new();
    let c = StatId::new();

    let input = AwardInput {
        linked_stat_ids: vec![a],
        legacy_stat_id: Some(b),
        focus_stat_id: Some(c),
        ..base_input()
    };

    let awards = resolve_awards(&input);
    assert_eq!(awards.len(), 3);
    let ids: Vec<_> = awards.iter().map(|aw| aw.stat_id).collect();
    assert_eq!(ids, vec![a, b, c]);
}

#[test]
fn stat_referenced_by_two_routes_gets_one_award() {
    let shared = StatId::new();

    let input = AwardInput {
        linked_stat_ids: vec![shared],
        legacy_stat_id: Some(shared),
        ..base_input()
    };

    let awards = resolve_awards(&input);
    assert_eq!(awards.len(), 1);
    assert_eq!(awards[0].stat_id, shared);
    assert_eq!(awards[0].xp, 50);
}

#[test]
fn focus_stat_already_linked_is_not_doubled() {
    let shared = StatId::new();
    let other = StatId::new();

    let input = AwardInput {
        linked_stat_ids: vec![shared, other],
        focus_stat_id: Some(shared),
        ..base_input()
    };

    let awards = resolve_awards(&input);
    assert_eq!(awards.len(), 2);
}

#[test]
fn every_resolved_stat_gets_the_same_amount() {
    let input = AwardInput {
        estimated_xp: 75,
        linked_stat_ids: vec![StatId::new(), StatId::new(), StatId::new()],
        ..base_input()
    };

    let awards = resolve_awards(&input);
    assert_eq!(awards.len(), 3);
    assert!(awards.iter().all(|a| a.xp == 75));
}

#[test]
fn no_links_resolves_to_no_awards() {
    let awards = resolve_awards(&base_input());
    assert!(awards.is_empty());
}

#[test]
fn negative_estimate_passes_through() {
    // Struggling content can emit negative awards; resolution does not
    // clamp — the progression engine floors totals at apply time.
    let stat = StatId::new();
    let input = AwardInput {
        estimated_xp: -25,
        linked_stat_ids: vec![stat],
        ..base_input()
    };

    let awards = resolve_awards(&input);
    assert_eq!(awards.len(), 1);
    assert_eq!(awards[0].xp, -25);
}
