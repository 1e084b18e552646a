use harvest_logging::{harvest_info, harvest_warn};
use harvester_core::PageTurn;
use harvester_engine::{HarvestEvent, ProgressSink};

/// Turns progress events into log lines for a headless run.
#[derive(Debug, Default)]
pub struct LoggingProgressSink;

pub fn describe(event: &HarvestEvent) -> String {
    match event {
        HarvestEvent::FilterApplied { view, switched } => {
            if *switched {
                format!("filter applied, listing moved to {view}")
            } else {
                format!("filter applied in {view}")
            }
        }
        HarvestEvent::PageScanned {
            page,
            rows,
            qualifying,
        } => format!("page {page}: {rows} rows, {qualifying} current"),
        HarvestEvent::RowSkipped { page, row, status } => {
            format!("page {page} row {row}: skipped ({})", status.label())
        }
        HarvestEvent::RowResolving { page, row } => format!("page {page} row {row}: resolving"),
        HarvestEvent::RowPersisted {
            page,
            row,
            resolution,
        } => format!("page {page} row {row}: saved ({resolution:?})"),
        HarvestEvent::RowAbandoned {
            page,
            row,
            kind,
            message,
        } => format!("page {page} row {row}: abandoned ({}): {message}", kind.label()),
        HarvestEvent::PageTurned { page, turn } => match turn {
            PageTurn::Advanced => format!("page {page}: moved to next page"),
            PageTurn::Terminal => format!("page {page}: last page"),
            PageTurn::Failed { reason } => format!("page {page}: could not turn: {reason}"),
        },
        HarvestEvent::Finished(summary) => format!(
            "finished: {} pages, {} rows, {} saved, {} abandoned, {} unresolved standards",
            summary.pages_scanned,
            summary.rows_seen,
            summary.persisted,
            summary.abandoned,
            summary.unresolved_references
        ),
    }
}

impl ProgressSink for LoggingProgressSink {
    fn emit(&self, event: HarvestEvent) {
        match &event {
            HarvestEvent::RowAbandoned { .. }
            | HarvestEvent::PageTurned {
                turn: PageTurn::Failed { .. },
                ..
            } => harvest_warn!("{}", describe(&event)),
            _ => harvest_info!("{}", describe(&event)),
        }
    }
}
