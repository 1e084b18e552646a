use std::collections::VecDeque;
use std::sync::Arc;

use harvest_logging::{harvest_debug, harvest_error, harvest_info, harvest_warn};
use harvester_core::{
    update, Effect, HarvestState, ListingRow, Msg, RowOutcome, RunSummary, ScanAttempt, Status,
};

use crate::detail::DetailResolver;
use crate::diagnostics::DiagnosticsCollector;
use crate::driver::{ViewDriver, ViewId};
use crate::extract::StrategyChain;
use crate::markup;
use crate::paginate::PaginationDriver;
use crate::progress::{NullProgressSink, ProgressSink};
use crate::scan::ListingScanner;
use crate::session::{race_new_view, Correlation, SessionLedger};
use crate::settings::HarvestSettings;
use crate::sink::RecordSink;
use crate::{HarvestError, HarvestEvent};

/// Drives a harvest run over one listing view.
///
/// The run loop feeds the results of each effect back into
/// [`harvester_core::update`] and executes whatever it asks for next.
pub struct NavigationController<S: RecordSink> {
    driver: Arc<dyn ViewDriver>,
    active: ViewId,
    settings: HarvestSettings,
    sink: S,
    diagnostics: DiagnosticsCollector,
    chain: StrategyChain,
    ledger: SessionLedger,
    progress: Arc<dyn ProgressSink>,
}

impl<S: RecordSink> NavigationController<S> {
    pub fn new(
        driver: Arc<dyn ViewDriver>,
        listing: ViewId,
        settings: HarvestSettings,
        sink: S,
        diagnostics: DiagnosticsCollector,
    ) -> Self {
        Self {
            driver,
            active: listing,
            settings,
            sink,
            diagnostics,
            chain: StrategyChain::default(),
            ledger: SessionLedger::new(),
            progress: Arc::new(NullProgressSink),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_strategies(mut self, chain: StrategyChain) -> Self {
        self.chain = chain;
        self
    }

    /// The view the listing currently lives in.
    pub fn active_view(&self) -> ViewId {
        self.active
    }

    pub fn ledger(&self) -> &SessionLedger {
        &self.ledger
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Clicks the first element whose own text contains `text` and returns
    /// the view that now holds the listing.
    ///
    /// When the click opens a new view, that view becomes the active listing.
    /// Neither a missing control nor a driver failure is fatal: the run
    /// continues unfiltered on the current view.
    pub async fn apply_filter(&mut self, text: &str) -> ViewId {
        match self.try_filter(text).await {
            Ok(switched) => {
                tokio::time::sleep(self.settings.settle_delay).await;
                self.progress.emit(HarvestEvent::FilterApplied {
                    view: self.active,
                    switched,
                });
            }
            Err(err) => {
                harvest_warn!("filter {text:?} not applied: {err}; continuing unfiltered");
                self.diagnostics
                    .capture(
                        self.driver.as_ref(),
                        self.active,
                        0,
                        None,
                        &format!("filter {text:?} not applied: {err}"),
                    )
                    .await;
            }
        }
        self.active
    }

    async fn try_filter(&mut self, text: &str) -> Result<bool, HarvestError> {
        let driver = self.driver.as_ref();
        let html = driver.markup(self.active).await?;
        let target = {
            let doc = markup::parse(&html);
            let found = markup::all_elements(&doc)
                .filter(|el| matches!(el.value().name(), "a" | "span" | "div"))
                .find(|el| markup::own_text(*el).contains(text) && !markup::is_hidden(*el))
                .map(markup::element_path);
            found
        };
        let path = target.ok_or_else(|| HarvestError::not_found(format!("filter control {text:?}")))?;

        let before = driver.views().await?;
        driver.click(self.active, &path).await?;
        match race_new_view(
            driver,
            &before,
            self.settings.filter_timeout,
            &self.settings.backoff,
        )
        .await
        {
            Correlation::CorrelatedSession(view) => {
                if let Err(err) = driver.bring_to_front(view).await {
                    harvest_debug!("could not focus {view}: {err}");
                }
                harvest_info!("filter {text:?} opened {view}; following it");
                self.active = view;
                Ok(true)
            }
            Correlation::NoNewSession => {
                harvest_info!("filter {text:?} applied in place");
                Ok(false)
            }
        }
    }

    /// Runs until the pager is exhausted, a page stays empty, the page cap
    /// is hit or pagination fails.
    pub async fn run(&mut self) -> RunSummary {
        let mut state = HarvestState::new(self.settings.max_pages);
        let mut inbox = VecDeque::from([Msg::Started]);

        while let Some(msg) = inbox.pop_front() {
            let (next, effects) = update(state, msg);
            state = next;
            for effect in effects {
                match effect {
                    Effect::ScanPage { page, attempt } => {
                        harvest_logging::set_page(page);
                        if attempt == ScanAttempt::Retry {
                            harvest_info!("page came back empty; scanning once more");
                            tokio::time::sleep(self.settings.settle_delay).await;
                        }
                        let rows = self.scan_page(page).await;
                        inbox.push_back(Msg::PageScanned { rows });
                    }
                    Effect::ResolveRow { page, row } => {
                        harvest_logging::set_row(row.index);
                        let outcome = self.process_row(page, &row).await;
                        harvest_logging::clear_row();
                        inbox.push_back(Msg::RowFinished {
                            row_index: row.index,
                            outcome,
                        });
                    }
                    Effect::Paginate { page } => {
                        let turn = PaginationDriver::new(self.driver.as_ref(), &self.settings)
                            .advance(self.active)
                            .await;
                        self.progress.emit(HarvestEvent::PageTurned {
                            page,
                            turn: turn.clone(),
                        });
                        inbox.push_back(Msg::PageTurned(turn));
                    }
                    Effect::Finish { reason } => {
                        harvest_info!("run finished: {reason:?}");
                    }
                }
            }
        }

        let summary = state.summary().clone();
        if !self.ledger.balanced() {
            harvest_error!(
                "session ledger unbalanced: {} opened, {} closed, {} failed to close",
                self.ledger.opened(),
                self.ledger.closed(),
                self.ledger.close_failures()
            );
        }
        self.progress.emit(HarvestEvent::Finished(summary.clone()));
        harvest_logging::reset_cursor();
        summary
    }

    async fn scan_page(&self, page: usize) -> Vec<ListingRow> {
        let scanner = ListingScanner::new(self.driver.as_ref(), &self.settings);
        let rows = match scanner.scan(self.active).await {
            Ok(rows) => rows,
            Err(err) => {
                harvest_warn!("scanning failed: {err}");
                Vec::new()
            }
        };

        let qualifying = rows.iter().filter(|r| r.status.is_qualifying()).count();
        harvest_info!("{} rows, {qualifying} current", rows.len());
        self.progress.emit(HarvestEvent::PageScanned {
            page,
            rows: rows.len(),
            qualifying,
        });
        for row in rows.iter().filter(|r| r.status != Status::Current) {
            harvest_debug!("skipping row {} ({})", row.index, row.status.label());
            self.progress.emit(HarvestEvent::RowSkipped {
                page,
                row: row.index,
                status: row.status,
            });
        }
        rows
    }

    async fn process_row(&mut self, page: usize, row: &ListingRow) -> RowOutcome {
        self.progress.emit(HarvestEvent::RowResolving {
            page,
            row: row.index,
        });

        let resolver = DetailResolver::new(
            self.driver.as_ref(),
            &self.settings,
            &self.chain,
            &self.diagnostics,
            &self.ledger,
        );
        let resolved = match resolver.resolve(self.active, page, row).await {
            Ok(resolved) => resolved,
            Err(err) => {
                harvest_warn!("abandoning row: {err}");
                self.diagnostics
                    .capture(self.driver.as_ref(), self.active, page, Some(row.index), &err.to_string())
                    .await;
                return self.abandon(page, row, err);
            }
        };

        if let Err(err) = self.sink.append(&resolved.record) {
            let err = HarvestError::from(err);
            harvest_error!("record not persisted: {err}");
            return self.abandon(page, row, err);
        }

        let resolution = resolved.record.standard_reference.resolution();
        harvest_info!(
            "persisted {:?} ({})",
            resolved.record.product_name,
            resolved.record.standard_reference.resolution_label()
        );
        self.progress.emit(HarvestEvent::RowPersisted {
            page,
            row: row.index,
            resolution,
        });
        RowOutcome::Persisted {
            resolution,
            confidence: resolved.confidence,
        }
    }

    fn abandon(&self, page: usize, row: &ListingRow, err: HarvestError) -> RowOutcome {
        let kind = err.abandon_kind();
        let message = err.to_string();
        self.progress.emit(HarvestEvent::RowAbandoned {
            page,
            row: row.index,
            kind,
            message: message.clone(),
        });
        RowOutcome::Abandoned { kind, message }
    }
}
