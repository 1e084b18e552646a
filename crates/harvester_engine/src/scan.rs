//! Reading the listing page into classified rows.

use harvest_logging::{harvest_debug, harvest_warn};
use harvester_core::{ListingRow, RowLayout, RowSummary};
use scraper::ElementRef;

use crate::driver::{ViewDriver, ViewId};
use crate::markup;
use crate::settings::HarvestSettings;
use crate::wait::poll_until;
use crate::HarvestError;

/// Parses a listing snapshot into its data rows, in document order.
///
/// A data row is a `tr` carrying the detail marker. Rows that wrap another
/// table row are layout containers and are skipped.
pub fn parse_listing(html: &str, settings: &HarvestSettings) -> Vec<ListingRow> {
    let doc = markup::parse(html);
    markup::innermost_rows(&doc)
        .into_iter()
        .filter(|tr| markup::element_text(*tr).contains(&settings.detail_marker))
        .enumerate()
        .map(|(index, tr)| read_row(index, tr, settings))
        .collect()
}

fn read_row(index: usize, tr: ElementRef, settings: &HarvestSettings) -> ListingRow {
    let cells: Vec<String> = markup::row_cells(tr)
        .into_iter()
        .map(markup::element_text)
        .collect();

    let action = tr
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| markup::own_text(*el).contains(&settings.detail_marker))
        .map(markup::element_path);

    let (summary, layout, status_source) = if cells.len() >= settings.expected_cells {
        let cols = settings.columns;
        let cell = |i: usize| cells.get(i).cloned().unwrap_or_default();
        let summary = RowSummary {
            product_name: cell(cols.product_name),
            enterprise_name: cell(cols.enterprise_name),
            registration_number: cell(cols.registration_number),
            status_text: cell(cols.status),
        };
        let status_source = summary.status_text.clone();
        (summary, RowLayout::Positional, status_source)
    } else {
        harvest_warn!(
            "row {index} has {} cells, expected {}; classifying on full row text",
            cells.len(),
            settings.expected_cells
        );
        (RowSummary::default(), RowLayout::FullText, cells.join(" "))
    };

    let status = settings.status_markers.classify(&status_source);
    harvest_debug!("row {index} classified {}", status.label());

    ListingRow {
        index,
        cells,
        status,
        summary,
        layout,
        action,
    }
}

/// Reads the rows of the active listing view.
pub struct ListingScanner<'a> {
    driver: &'a dyn ViewDriver,
    settings: &'a HarvestSettings,
}

impl<'a> ListingScanner<'a> {
    pub fn new(driver: &'a dyn ViewDriver, settings: &'a HarvestSettings) -> Self {
        Self { driver, settings }
    }

    /// Waits for data rows to render, then parses them.
    ///
    /// A listing that never shows rows within the bound yields an empty list;
    /// deciding what that means is left to the caller.
    pub async fn scan(&self, view: ViewId) -> Result<Vec<ListingRow>, HarvestError> {
        let settings = self.settings;
        let driver = self.driver;
        let rows = poll_until(settings.listing_timeout, &settings.backoff, || async move {
            let html = driver.markup(view).await.ok()?;
            let rows = parse_listing(&html, settings);
            (!rows.is_empty()).then_some(rows)
        })
        .await;

        match rows {
            Some(rows) => Ok(rows),
            None => {
                harvest_warn!(
                    "{}",
                    HarvestError::NavigationTimeout(settings.listing_timeout)
                );
                let html = driver.markup(view).await?;
                Ok(parse_listing(&html, settings))
            }
        }
    }
}
