use std::fmt;
use std::time::Duration;

use harvester_core::{AbandonKind, LogicalField, PageTurn, Resolution, RunSummary, Status};
use thiserror::Error;

use crate::driver::ViewId;
use crate::persist::PersistError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct DriverError {
    pub kind: DriverFailure,
    pub message: String,
}

impl DriverError {
    pub fn new(kind: DriverFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverFailure {
    /// The view was closed or never existed.
    ViewClosed,
    /// The element path matched nothing in the live view.
    ElementMissing,
    Navigation,
    Timeout,
    Protocol,
}

impl fmt::Display for DriverFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverFailure::ViewClosed => write!(f, "view closed"),
            DriverFailure::ElementMissing => write!(f, "element missing"),
            DriverFailure::Navigation => write!(f, "navigation error"),
            DriverFailure::Timeout => write!(f, "driver timeout"),
            DriverFailure::Protocol => write!(f, "protocol error"),
        }
    }
}

/// Failures inside a single row or page. None of these abort a run.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("view did not settle within {0:?}")]
    NavigationTimeout(Duration),
    #[error("no correlated session appeared within {0:?}")]
    SessionCorrelationTimeout(Duration),
    #[error("element not found: {what}")]
    ElementNotFound { what: String },
    #[error("no value extracted for {field}")]
    ExtractionFailure { field: LogicalField },
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl HarvestError {
    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        HarvestError::ElementNotFound { what: what.into() }
    }

    pub fn abandon_kind(&self) -> AbandonKind {
        match self {
            HarvestError::NavigationTimeout(_) => AbandonKind::NavigationTimeout,
            HarvestError::SessionCorrelationTimeout(_) => AbandonKind::SessionTimeout,
            HarvestError::ElementNotFound { .. } => AbandonKind::MissingControl,
            HarvestError::ExtractionFailure { .. } => AbandonKind::Extraction,
            HarvestError::Driver(DriverError {
                kind: DriverFailure::ElementMissing,
                ..
            }) => AbandonKind::MissingControl,
            HarvestError::Driver(_) => AbandonKind::Driver,
            HarvestError::Persist(_) => AbandonKind::Persist,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestEvent {
    FilterApplied {
        view: ViewId,
        switched: bool,
    },
    PageScanned {
        page: usize,
        rows: usize,
        qualifying: usize,
    },
    RowSkipped {
        page: usize,
        row: usize,
        status: Status,
    },
    RowResolving {
        page: usize,
        row: usize,
    },
    RowPersisted {
        page: usize,
        row: usize,
        resolution: Resolution,
    },
    RowAbandoned {
        page: usize,
        row: usize,
        kind: AbandonKind,
        message: String,
    },
    PageTurned {
        page: usize,
        turn: PageTurn,
    },
    Finished(RunSummary),
}
