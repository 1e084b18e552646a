use crate::{Confidence, FinishReason, Resolution, RowOutcome, Status};

/// Running totals for one harvest run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub pages_scanned: usize,
    pub rows_seen: usize,
    pub current: usize,
    pub historical: usize,
    pub revoked: usize,
    pub unknown: usize,
    pub persisted: usize,
    pub abandoned: usize,
    pub low_confidence: usize,
    pub unresolved_references: usize,
    pub finish: Option<FinishReason>,
}

impl RunSummary {
    pub(crate) fn count_status(&mut self, status: Status) {
        self.rows_seen += 1;
        match status {
            Status::Current => self.current += 1,
            Status::Historical => self.historical += 1,
            Status::Revoked => self.revoked += 1,
            Status::Unknown => self.unknown += 1,
        }
    }

    pub(crate) fn count_outcome(&mut self, outcome: &RowOutcome) {
        match outcome {
            RowOutcome::Persisted {
                resolution,
                confidence,
            } => {
                self.persisted += 1;
                if *confidence == Confidence::Low {
                    self.low_confidence += 1;
                }
                if *resolution == Resolution::Unresolved {
                    self.unresolved_references += 1;
                }
            }
            RowOutcome::Abandoned { .. } => self.abandoned += 1,
        }
    }
}
