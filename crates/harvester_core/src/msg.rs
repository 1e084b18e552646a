use crate::{Confidence, ListingRow, Resolution};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The listing view is ready and the run may begin.
    Started,
    /// Data rows found on the current page, in document order.
    PageScanned { rows: Vec<ListingRow> },
    /// A qualifying row finished processing.
    RowFinished {
        row_index: usize,
        outcome: RowOutcome,
    },
    /// Result of trying to move to the next page.
    PageTurned(PageTurn),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Persisted {
        resolution: Resolution,
        confidence: Confidence,
    },
    Abandoned {
        kind: AbandonKind,
        message: String,
    },
}

/// Why a row produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbandonKind {
    /// The row, or the control it needed, was not on the page.
    MissingControl,
    /// The browser reported an error while the session was being opened.
    Driver,
    NavigationTimeout,
    SessionTimeout,
    Extraction,
    /// The record could not be written to the sink.
    Persist,
}

impl AbandonKind {
    pub fn label(self) -> &'static str {
        match self {
            AbandonKind::MissingControl => "missing-control",
            AbandonKind::Driver => "driver",
            AbandonKind::NavigationTimeout => "navigation-timeout",
            AbandonKind::SessionTimeout => "session-timeout",
            AbandonKind::Extraction => "extraction",
            AbandonKind::Persist => "persist",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageTurn {
    Advanced,
    /// No next control, or the control is disabled.
    Terminal,
    Failed { reason: String },
}
