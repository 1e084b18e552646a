use harvest_logging::{harvest_debug, harvest_warn};
use harvester_core::{Confidence, HarvestRecord, ListingRow, LogicalField};

use crate::diagnostics::DiagnosticsCollector;
use crate::document::DocumentFetcher;
use crate::driver::{ViewDriver, ViewId};
use crate::extract::StrategyChain;
use crate::markup;
use crate::session::{close_session, race_new_view, Session, SessionLedger};
use crate::settings::HarvestSettings;
use crate::wait::poll_until;
use crate::HarvestError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRow {
    pub record: HarvestRecord,
    pub confidence: Confidence,
}

/// True when any readiness label shows up in the snapshot.
pub fn shows_any_label<'l>(html: &str, labels: impl IntoIterator<Item = &'l str>) -> bool {
    let doc = markup::parse(html);
    let labels: Vec<&str> = labels.into_iter().collect();
    let shown = markup::all_elements(&doc).any(|el| {
        let text = markup::own_text(el);
        !text.is_empty() && labels.iter().any(|label| markup::label_matches(&text, label))
    });
    shown
}

/// Narrows an overlay session to the first visible overlay container, so the
/// listing underneath does not leak into extraction.
pub fn session_markup(html: &str, session: &Session, settings: &HarvestSettings) -> String {
    if !matches!(session, Session::Overlay { .. }) {
        return html.to_string();
    }
    let doc = markup::parse(html);
    settings
        .overlay_selectors
        .iter()
        .find_map(|css| {
            markup::select_all(&doc, css)
                .into_iter()
                .find(|el| !markup::is_hidden(*el))
                .map(|el| el.html())
        })
        .unwrap_or_else(|| html.to_string())
}

/// Opens a row's detail session, reads it and always closes it again.
pub struct DetailResolver<'a> {
    driver: &'a dyn ViewDriver,
    settings: &'a HarvestSettings,
    chain: &'a StrategyChain,
    diagnostics: &'a DiagnosticsCollector,
    ledger: &'a SessionLedger,
}

impl<'a> DetailResolver<'a> {
    pub fn new(
        driver: &'a dyn ViewDriver,
        settings: &'a HarvestSettings,
        chain: &'a StrategyChain,
        diagnostics: &'a DiagnosticsCollector,
        ledger: &'a SessionLedger,
    ) -> Self {
        Self {
            driver,
            settings,
            chain,
            diagnostics,
            ledger,
        }
    }

    /// Fails only when no session could be opened; anything that goes wrong
    /// inside an open session degrades the record instead.
    pub async fn resolve(
        &self,
        listing: ViewId,
        page: usize,
        row: &ListingRow,
    ) -> Result<ResolvedRow, HarvestError> {
        let action = row
            .action
            .as_ref()
            .ok_or_else(|| HarvestError::not_found("detail action control"))?;

        let before = self.driver.views().await?;
        let origin_url = self.driver.url(listing).await?;
        self.driver.click(listing, action).await?;

        let correlation = race_new_view(
            self.driver,
            &before,
            self.settings.detail_timeout,
            &self.settings.backoff,
        )
        .await;
        let session = Session::from_race(self.driver, listing, &origin_url, correlation).await;
        if let Session::NewView { view, .. } = &session {
            if let Err(err) = self.driver.bring_to_front(*view).await {
                harvest_debug!("could not focus {view}: {err}");
            }
        }
        self.ledger.record_open();
        harvest_debug!("detail opened as {} session on {}", session.kind(), session.view());

        let read = self.read_session(&session, page, row).await;
        // Close failures are logged by close_session and do not void the read.
        let _ = close_session(self.driver, &session, self.settings, self.ledger).await;
        read
    }

    async fn read_session(
        &self,
        session: &Session,
        page: usize,
        row: &ListingRow,
    ) -> Result<ResolvedRow, HarvestError> {
        let driver = self.driver;
        let settings = self.settings;
        let view = session.view();

        let ready = poll_until(settings.readiness_timeout, &settings.backoff, || async move {
            let html = driver.markup(view).await.ok()?;
            let scoped = session_markup(&html, session, settings);
            shows_any_label(&scoped, settings.synonyms.readiness_labels()).then_some(())
        })
        .await
        .is_some();

        let confidence = if ready {
            Confidence::Normal
        } else {
            harvest_warn!(
                "{}; extracting with low confidence",
                HarvestError::NavigationTimeout(settings.readiness_timeout)
            );
            Confidence::Low
        };

        tokio::time::sleep(settings.settle_delay).await;
        let html = driver.markup(view).await?;
        let scoped = session_markup(&html, session, settings);
        let document = self
            .chain
            .extract_document(&scoped, &settings.synonyms, confidence);

        if document
            .value(LogicalField::ProductName)
            .map_or(true, str::is_empty)
        {
            let failure = HarvestError::ExtractionFailure {
                field: LogicalField::ProductName,
            };
            harvest_warn!("{failure}");
            self.diagnostics
                .capture(driver, view, page, Some(row.index), &failure.to_string())
                .await;
        }

        let reference = DocumentFetcher::new(driver, settings, self.diagnostics, self.ledger)
            .fetch(view, page, row.index)
            .await;

        Ok(ResolvedRow {
            record: HarvestRecord::from_parts(row, &document, reference),
            confidence,
        })
    }
}
