use std::sync::Once;

use harvester_core::{
    update, AbandonKind, Confidence, Effect, FinishReason, HarvestState, ListingRow, Msg,
    PageTurn, Phase, Resolution, RowLayout, RowOutcome, RowSummary, ScanAttempt, Status,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(harvest_logging::initialize_for_tests);
}

fn row(index: usize, status: Status) -> ListingRow {
    ListingRow {
        index,
        cells: vec![format!("{}", index + 1), format!("Product {index}")],
        status,
        summary: RowSummary {
            product_name: format!("Product {index}"),
            ..RowSummary::default()
        },
        layout: RowLayout::Positional,
        action: None,
    }
}

fn persisted() -> RowOutcome {
    RowOutcome::Persisted {
        resolution: Resolution::DirectLink,
        confidence: Confidence::Normal,
    }
}

fn started(max_pages: usize) -> HarvestState {
    let (state, effects) = update(HarvestState::new(max_pages), Msg::Started);
    assert_eq!(
        effects,
        vec![Effect::ScanPage {
            page: 1,
            attempt: ScanAttempt::First
        }]
    );
    state
}

fn resolved_indices(effects: &[Effect]) -> Vec<usize> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::ResolveRow { row, .. } => Some(row.index),
            _ => None,
        })
        .collect()
}

#[test]
fn only_current_rows_are_resolved_one_at_a_time() {
    init_logging();
    let state = started(10);
    let rows = vec![
        row(0, Status::Current),
        row(1, Status::Historical),
        row(2, Status::Current),
    ];

    let (state, effects) = update(state, Msg::PageScanned { rows });
    assert_eq!(resolved_indices(&effects), vec![0]);
    assert_eq!(state.phase(), Phase::Resolving);
    assert_eq!(state.pending_rows(), 1);

    let (state, effects) = update(
        state,
        Msg::RowFinished {
            row_index: 0,
            outcome: persisted(),
        },
    );
    assert_eq!(resolved_indices(&effects), vec![2]);

    let (state, effects) = update(
        state,
        Msg::RowFinished {
            row_index: 2,
            outcome: RowOutcome::Abandoned {
                kind: AbandonKind::SessionTimeout,
                message: "detail view never opened".into(),
            },
        },
    );
    assert_eq!(effects, vec![Effect::Paginate { page: 1 }]);

    let summary = state.summary();
    assert_eq!(summary.rows_seen, 3);
    assert_eq!(summary.current, 2);
    assert_eq!(summary.historical, 1);
    assert_eq!(summary.persisted, 1);
    assert_eq!(summary.abandoned, 1);
}

#[test]
fn page_without_qualifying_rows_paginates_immediately() {
    let state = started(10);
    let rows = vec![row(0, Status::Revoked), row(1, Status::Unknown)];
    let (state, effects) = update(state, Msg::PageScanned { rows });
    assert_eq!(effects, vec![Effect::Paginate { page: 1 }]);
    assert_eq!(state.summary().revoked, 1);
    assert_eq!(state.summary().unknown, 1);
}

#[test]
fn advancing_scans_the_next_page_until_terminal() {
    let state = started(10);
    let (state, _) = update(state, Msg::PageScanned { rows: vec![row(0, Status::Historical)] });
    let (state, effects) = update(state, Msg::PageTurned(PageTurn::Advanced));
    assert_eq!(
        effects,
        vec![Effect::ScanPage {
            page: 2,
            attempt: ScanAttempt::First
        }]
    );
    assert_eq!(state.page(), 2);

    let (state, _) = update(state, Msg::PageScanned { rows: vec![row(0, Status::Historical)] });
    let (state, effects) = update(state, Msg::PageTurned(PageTurn::Terminal));
    assert_eq!(
        effects,
        vec![Effect::Finish {
            reason: FinishReason::Exhausted
        }]
    );
    assert!(state.is_finished());
    assert_eq!(state.summary().pages_scanned, 2);
    assert_eq!(state.summary().finish, Some(FinishReason::Exhausted));
}

#[test]
fn empty_page_is_rescanned_once_then_finishes() {
    let state = started(10);
    let (state, effects) = update(state, Msg::PageScanned { rows: Vec::new() });
    assert_eq!(
        effects,
        vec![Effect::ScanPage {
            page: 1,
            attempt: ScanAttempt::Retry
        }]
    );

    let (state, effects) = update(state, Msg::PageScanned { rows: Vec::new() });
    assert_eq!(
        effects,
        vec![Effect::Finish {
            reason: FinishReason::EmptyPage
        }]
    );
    assert_eq!(state.summary().pages_scanned, 0);
}

#[test]
fn retry_that_finds_rows_resumes_normally() {
    let state = started(10);
    let (state, _) = update(state, Msg::PageScanned { rows: Vec::new() });
    let (state, effects) = update(state, Msg::PageScanned { rows: vec![row(0, Status::Current)] });
    assert_eq!(resolved_indices(&effects), vec![0]);
    assert_eq!(state.summary().pages_scanned, 1);
}

#[test]
fn page_cap_stops_a_pager_that_never_reports_disabled() {
    let mut state = started(3);
    for _ in 0..3 {
        let (next, _) = update(state, Msg::PageScanned { rows: vec![row(0, Status::Unknown)] });
        let (next, effects) = update(next, Msg::PageTurned(PageTurn::Advanced));
        state = next;
        if state.is_finished() {
            assert_eq!(
                effects,
                vec![Effect::Finish {
                    reason: FinishReason::PageCap
                }]
            );
        }
    }
    assert!(state.is_finished());
    assert_eq!(state.page(), 3);
    assert_eq!(state.summary().pages_scanned, 3);
}

#[test]
fn pagination_failure_finishes_the_run() {
    let state = started(10);
    let (state, _) = update(state, Msg::PageScanned { rows: vec![row(0, Status::Unknown)] });
    let (state, effects) = update(
        state,
        Msg::PageTurned(PageTurn::Failed {
            reason: "listing unchanged".into(),
        }),
    );
    assert_eq!(
        effects,
        vec![Effect::Finish {
            reason: FinishReason::PaginationFailed
        }]
    );
    assert!(state.is_finished());
}

#[test]
fn stale_row_completion_is_ignored() {
    let state = started(10);
    let (state, _) = update(
        state,
        Msg::PageScanned {
            rows: vec![row(0, Status::Current), row(1, Status::Current)],
        },
    );
    let (state, effects) = update(
        state,
        Msg::RowFinished {
            row_index: 1,
            outcome: persisted(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.in_flight(), Some(0));
    assert_eq!(state.summary().persisted, 0);
}

#[test]
fn low_confidence_and_unresolved_outcomes_are_tallied() {
    let state = started(10);
    let (state, _) = update(state, Msg::PageScanned { rows: vec![row(0, Status::Current)] });
    let (state, _) = update(
        state,
        Msg::RowFinished {
            row_index: 0,
            outcome: RowOutcome::Persisted {
                resolution: Resolution::Unresolved,
                confidence: Confidence::Low,
            },
        },
    );
    let summary = state.summary();
    assert_eq!(summary.persisted, 1);
    assert_eq!(summary.low_confidence, 1);
    assert_eq!(summary.unresolved_references, 1);
}
