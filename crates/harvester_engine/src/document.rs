//! Resolving the "executed standard" reference of a detail view.

use harvest_logging::{harvest_debug, harvest_info, harvest_warn};
use harvester_core::{resolve_link, ElementPath, StandardReference, UnresolvedCause};
use scraper::{ElementRef, Html};

use crate::diagnostics::DiagnosticsCollector;
use crate::driver::{ViewDriver, ViewId};
use crate::markup;
use crate::session::{close_session, race_new_view, Session, SessionLedger};
use crate::settings::HarvestSettings;
use crate::wait::poll_until;
use crate::HarvestError;

/// What the detail view offers for the standard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StandardRow {
    Absent,
    /// The label is there but neither a value nor a control is.
    Bare,
    /// A value but nothing to click.
    Inline { value: String },
    Control {
        path: ElementPath,
        value: String,
        href: Option<String>,
    },
}

/// Finds the standard row by its label synonyms, in priority order.
pub fn locate_standard_row(html: &str, settings: &HarvestSettings) -> StandardRow {
    let doc = markup::parse(html);
    for label in settings.synonyms.standard.iter().filter(|l| !l.trim().is_empty()) {
        if let Some((container, value_el)) = find_labelled(&doc, label) {
            return describe_row(container, value_el, settings);
        }
    }
    StandardRow::Absent
}

/// The row holding `label` and the element holding its value, if any.
fn find_labelled<'a>(doc: &'a Html, label: &str) -> Option<(ElementRef<'a>, Option<ElementRef<'a>>)> {
    let by_row = markup::innermost_rows(doc).into_iter().find_map(|tr| {
        let cells = markup::row_cells(tr);
        let at = cells
            .iter()
            .position(|cell| markup::label_matches(&markup::element_text(*cell), label))?;
        Some((tr, cells.get(at + 1).copied()))
    });
    if by_row.is_some() {
        return by_row;
    }

    markup::all_elements(doc)
        .find(|el| markup::label_matches(&markup::own_text(*el), label))
        .map(|el| {
            let value = el.next_siblings().find_map(ElementRef::wrap);
            let container = el.parent().and_then(ElementRef::wrap).unwrap_or(el);
            (container, value)
        })
}

fn describe_row(
    container: ElementRef,
    value_el: Option<ElementRef>,
    settings: &HarvestSettings,
) -> StandardRow {
    let scope = value_el.unwrap_or(container);
    let control = scope
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| {
            markup::own_text(*el).contains(&settings.view_marker) && !markup::is_hidden(*el)
        })
        .or_else(|| {
            markup::select_within(scope, "a")
                .into_iter()
                .find(|el| !markup::is_hidden(*el))
        })
        .or_else(|| (scope.value().name() == "a" && !markup::is_hidden(scope)).then_some(scope));

    let raw_value = value_el.map(markup::element_text).unwrap_or_default();
    match control {
        Some(el) => {
            let control_text = markup::element_text(el);
            let value = markup::normalize_text(&raw_value.replace(&control_text, ""));
            let href = enclosing_anchor(el).and_then(markup::navigable_href);
            StandardRow::Control {
                path: markup::element_path(el),
                value,
                href,
            }
        }
        None if raw_value.is_empty() => StandardRow::Bare,
        None => StandardRow::Inline { value: raw_value },
    }
}

fn enclosing_anchor(element: ElementRef) -> Option<ElementRef> {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .find(|el| el.value().name() == "a")
}

/// Readable text of a document view: the first content selector with text.
pub fn read_inline_text(html: &str, settings: &HarvestSettings) -> String {
    let doc = markup::parse(html);
    settings
        .content_selectors
        .iter()
        .find_map(|css| {
            markup::select_all(&doc, css)
                .into_iter()
                .map(markup::element_text)
                .find(|text| !text.is_empty())
        })
        .unwrap_or_default()
}

/// Link and text shown by a document overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayContent {
    pub link: Option<String>,
    pub text: String,
}

/// Visible overlays in the snapshot that carry a link or text.
pub fn read_overlays(html: &str, settings: &HarvestSettings) -> Vec<OverlayContent> {
    let doc = markup::parse(html);
    let mut found = Vec::new();
    for css in &settings.overlay_selectors {
        for el in markup::select_all(&doc, css) {
            if markup::is_hidden(el) {
                continue;
            }
            let embedded = markup::select_within(el, "iframe, embed, object")
                .into_iter()
                .find_map(|frame| {
                    let attrs = frame.value();
                    attrs
                        .attr("src")
                        .or_else(|| attrs.attr("data"))
                        .map(str::trim)
                        .filter(|src| !src.is_empty() && *src != "about:blank")
                        .map(str::to_string)
                });
            let link = embedded.or_else(|| {
                markup::select_within(el, "a")
                    .into_iter()
                    .find_map(markup::navigable_href)
            });
            let content = OverlayContent {
                link,
                text: markup::element_text(el),
            };
            if (content.link.is_some() || !content.text.is_empty()) && !found.contains(&content) {
                found.push(content);
            }
        }
    }
    found
}

/// Picks the reference from what a document view showed.
///
/// Long inline text is the document itself and keeps the link alongside;
/// otherwise the link decides.
pub fn build_reference(
    inline_text: &str,
    link: Option<&str>,
    settings: &HarvestSettings,
) -> StandardReference {
    let resolved = link.map(|url| resolve_link(url, &settings.pointer_param));
    if inline_text.chars().count() >= settings.min_inline_chars {
        return StandardReference::InlineText {
            text: inline_text.to_string(),
            link: resolved.map(|r| r.value().to_string()),
        };
    }
    match resolved {
        Some(reference) => reference,
        None if !inline_text.is_empty() => StandardReference::InlineText {
            text: inline_text.to_string(),
            link: None,
        },
        None => StandardReference::failed("document view showed neither link nor text"),
    }
}

fn is_blank_url(url: &str) -> bool {
    let url = url.trim();
    url.is_empty() || url == "about:blank"
}

pub struct DocumentFetcher<'a> {
    driver: &'a dyn ViewDriver,
    settings: &'a HarvestSettings,
    diagnostics: &'a DiagnosticsCollector,
    ledger: &'a SessionLedger,
}

impl<'a> DocumentFetcher<'a> {
    pub fn new(
        driver: &'a dyn ViewDriver,
        settings: &'a HarvestSettings,
        diagnostics: &'a DiagnosticsCollector,
        ledger: &'a SessionLedger,
    ) -> Self {
        Self {
            driver,
            settings,
            diagnostics,
            ledger,
        }
    }

    /// Never fails: every problem becomes an unresolved reference.
    pub async fn fetch(&self, view: ViewId, page: usize, row: usize) -> StandardReference {
        match self.try_fetch(view, page, row).await {
            Ok(reference) => {
                harvest_debug!("standard reference resolved as {}", reference.resolution_label());
                reference
            }
            Err(err) => {
                harvest_warn!("standard reference failed: {err}");
                StandardReference::failed(err.to_string())
            }
        }
    }

    async fn try_fetch(
        &self,
        view: ViewId,
        page: usize,
        row: usize,
    ) -> Result<StandardReference, HarvestError> {
        let html = self.driver.markup(view).await?;
        let (path, value, href) = match locate_standard_row(&html, self.settings) {
            StandardRow::Absent => {
                harvest_info!("detail view has no standard row");
                if self.settings.capture_missing_reference {
                    self.diagnostics
                        .capture(self.driver, view, page, Some(row), "standard row absent")
                        .await;
                }
                return Ok(StandardReference::unresolved(UnresolvedCause::Absent));
            }
            StandardRow::Inline { value } => {
                return Ok(StandardReference::InlineText { text: value, link: None });
            }
            StandardRow::Bare => {
                return Ok(StandardReference::unresolved(UnresolvedCause::NoControl));
            }
            StandardRow::Control { path, value, href } => (path, value, href),
        };

        let before_views = self.driver.views().await?;
        let origin_url = self.driver.url(view).await?;
        let overlays_before = read_overlays(&html, self.settings);

        self.driver.click(view, &path).await?;
        let correlation = race_new_view(
            self.driver,
            &before_views,
            self.settings.document_timeout,
            &self.settings.backoff,
        )
        .await;
        let session = Session::from_race(self.driver, view, &origin_url, correlation).await;
        harvest_debug!("standard control opened {} session on {}", session.kind(), session.view());

        match session {
            Session::Overlay { view } => {
                self.read_overlay(view, &overlays_before, href.as_deref(), &value)
                    .await
            }
            session => {
                self.ledger.record_open();
                let read = self.read_document_view(session.view()).await;
                let _ = close_session(self.driver, &session, self.settings, self.ledger).await;
                read
            }
        }
    }

    async fn read_document_view(&self, view: ViewId) -> Result<StandardReference, HarvestError> {
        let driver = self.driver;
        let url = poll_until(
            self.settings.document_timeout,
            &self.settings.backoff,
            || async move {
                driver
                    .url(view)
                    .await
                    .ok()
                    .filter(|url| !is_blank_url(url))
            },
        )
        .await
        .ok_or(HarvestError::NavigationTimeout(self.settings.document_timeout))?;

        tokio::time::sleep(self.settings.settle_delay).await;
        let html = driver.markup(view).await?;
        let text = read_inline_text(&html, self.settings);
        Ok(build_reference(&text, Some(&url), self.settings))
    }

    async fn read_overlay(
        &self,
        view: ViewId,
        before: &[OverlayContent],
        href: Option<&str>,
        row_value: &str,
    ) -> Result<StandardReference, HarvestError> {
        let driver = self.driver;
        let settings = self.settings;
        let content = poll_until(settings.overlay_timeout, &settings.backoff, || async move {
            let html = driver.markup(view).await.ok()?;
            read_overlays(&html, settings)
                .into_iter()
                .find(|content| !before.contains(content))
        })
        .await;

        let Some(content) = content else {
            // Nothing opened; a plain link on the control still points somewhere.
            if let Some(href) = href {
                return Ok(resolve_link(href, &settings.pointer_param));
            }
            if !row_value.is_empty() {
                return Ok(StandardReference::InlineText {
                    text: row_value.to_string(),
                    link: None,
                });
            }
            return Err(HarvestError::SessionCorrelationTimeout(settings.overlay_timeout));
        };

        self.ledger.record_open();
        tokio::time::sleep(settings.settle_delay).await;
        let reference = build_reference(&content.text, content.link.as_deref(), settings);
        let session = Session::Overlay { view };
        let _ = close_session(driver, &session, settings, self.ledger).await;
        Ok(reference)
    }
}
