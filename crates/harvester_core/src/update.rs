use crate::{Effect, FinishReason, HarvestState, Msg, PageTurn, Phase, ScanAttempt};

/// Pure update function: applies a message to state and returns any effects.
///
/// At most one effect is returned per message, which keeps the run strictly
/// sequential: one page scan, one row, or one page turn at a time.
pub fn update(mut state: HarvestState, msg: Msg) -> (HarvestState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started => {
            if state.phase() != Phase::Idle {
                return (state, Vec::new());
            }
            state.set_page(1);
            state.set_phase(Phase::Scanning);
            vec![Effect::ScanPage {
                page: 1,
                attempt: ScanAttempt::First,
            }]
        }
        Msg::PageScanned { rows } => {
            if state.phase() != Phase::Scanning {
                return (state, Vec::new());
            }
            if rows.is_empty() {
                if state.retried_empty() {
                    return finish(state, FinishReason::EmptyPage);
                }
                state.set_retried_empty(true);
                let page = state.page();
                return (
                    state,
                    vec![Effect::ScanPage {
                        page,
                        attempt: ScanAttempt::Retry,
                    }],
                );
            }

            state.set_retried_empty(false);
            state.summary_mut().pages_scanned += 1;
            for row in &rows {
                state.summary_mut().count_status(row.status);
            }
            state.queue_rows(rows.into_iter().filter(|row| row.status.is_qualifying()));
            return next_row_or_paginate(state);
        }
        Msg::RowFinished { row_index, outcome } => {
            if state.phase() != Phase::Resolving || state.in_flight() != Some(row_index) {
                return (state, Vec::new());
            }
            state.summary_mut().count_outcome(&outcome);
            state.clear_in_flight();
            return next_row_or_paginate(state);
        }
        Msg::PageTurned(turn) => {
            if state.phase() != Phase::Paginating {
                return (state, Vec::new());
            }
            match turn {
                PageTurn::Advanced => {
                    if state.page() >= state.max_pages() {
                        return finish(state, FinishReason::PageCap);
                    }
                    let page = state.page() + 1;
                    state.set_page(page);
                    state.set_phase(Phase::Scanning);
                    vec![Effect::ScanPage {
                        page,
                        attempt: ScanAttempt::First,
                    }]
                }
                PageTurn::Terminal => return finish(state, FinishReason::Exhausted),
                PageTurn::Failed { .. } => return finish(state, FinishReason::PaginationFailed),
            }
        }
    };

    (state, effects)
}

fn next_row_or_paginate(mut state: HarvestState) -> (HarvestState, Vec<Effect>) {
    let page = state.page();
    match state.next_row() {
        Some(row) => {
            state.set_phase(Phase::Resolving);
            (state, vec![Effect::ResolveRow { page, row }])
        }
        None => {
            state.set_phase(Phase::Paginating);
            (state, vec![Effect::Paginate { page }])
        }
    }
}

fn finish(mut state: HarvestState, reason: FinishReason) -> (HarvestState, Vec<Effect>) {
    state.set_phase(Phase::Finished);
    state.summary_mut().finish = Some(reason);
    (state, vec![Effect::Finish { reason }])
}
