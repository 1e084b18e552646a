use std::collections::VecDeque;

use crate::{ListingRow, RunSummary};

/// Where the run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Scanning,
    Resolving,
    Paginating,
    Finished,
}

/// Pages scanned before the run stops regardless of what the pager reports.
pub const DEFAULT_MAX_PAGES: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestState {
    phase: Phase,
    page: usize,
    max_pages: usize,
    retried_empty: bool,
    pending: VecDeque<ListingRow>,
    in_flight: Option<usize>,
    summary: RunSummary,
}

impl Default for HarvestState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAGES)
    }
}

impl HarvestState {
    pub fn new(max_pages: usize) -> Self {
        Self {
            phase: Phase::Idle,
            page: 0,
            max_pages: max_pages.max(1),
            retried_empty: false,
            pending: VecDeque::new(),
            in_flight: None,
            summary: RunSummary::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// 1-based page index; 0 before the run starts.
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn pending_rows(&self) -> usize {
        self.pending.len()
    }

    pub fn in_flight(&self) -> Option<usize> {
        self.in_flight
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub(crate) fn max_pages(&self) -> usize {
        self.max_pages
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    pub(crate) fn retried_empty(&self) -> bool {
        self.retried_empty
    }

    pub(crate) fn set_retried_empty(&mut self, retried: bool) {
        self.retried_empty = retried;
    }

    pub(crate) fn queue_rows(&mut self, rows: impl IntoIterator<Item = ListingRow>) {
        self.pending.extend(rows);
    }

    pub(crate) fn next_row(&mut self) -> Option<ListingRow> {
        let row = self.pending.pop_front();
        self.in_flight = row.as_ref().map(|r| r.index);
        row
    }

    pub(crate) fn clear_in_flight(&mut self) {
        self.in_flight = None;
    }

    pub(crate) fn summary_mut(&mut self) -> &mut RunSummary {
        &mut self.summary
    }
}
