use harvest_logging::{harvest_debug, harvest_info, harvest_warn};
use harvester_core::{ElementPath, PageTurn};
use scraper::{ElementRef, Html};

use crate::driver::{ViewDriver, ViewId};
use crate::markup;
use crate::settings::HarvestSettings;
use crate::wait::poll_until;

/// State of the listing's "next page" control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextControl {
    Enabled(ElementPath),
    Disabled,
    Missing,
}

/// Finds the next-page control in priority order: explicit selectors, then
/// control text, then an arrow icon button, then the numbered pager.
pub fn locate_next(html: &str, settings: &HarvestSettings) -> NextControl {
    let doc = markup::parse(html);
    let candidate = by_selector(&doc, settings)
        .or_else(|| by_text(&doc, settings))
        .or_else(|| by_arrow_icon(&doc));

    if let Some(el) = candidate {
        return if markup::is_disabled(el) {
            NextControl::Disabled
        } else {
            NextControl::Enabled(markup::element_path(el))
        };
    }

    match by_numbered_pager(&doc) {
        Some(el) => NextControl::Enabled(markup::element_path(el)),
        None => NextControl::Missing,
    }
}

fn by_selector<'a>(doc: &'a Html, settings: &HarvestSettings) -> Option<ElementRef<'a>> {
    settings.next_selectors.iter().find_map(|css| {
        markup::select_all(doc, css)
            .into_iter()
            .find(|el| !markup::is_hidden(*el))
    })
}

fn by_text<'a>(doc: &'a Html, settings: &HarvestSettings) -> Option<ElementRef<'a>> {
    settings.next_texts.iter().find_map(|wanted| {
        markup::all_elements(doc).find(|el| {
            matches!(el.value().name(), "a" | "button" | "li" | "span")
                && markup::own_text(*el) == *wanted
                && !markup::is_hidden(*el)
        })
    })
}

fn by_arrow_icon(doc: &Html) -> Option<ElementRef<'_>> {
    markup::select_all(doc, "i.el-icon-arrow-right")
        .into_iter()
        .find_map(|icon| {
            icon.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == "button")
        })
}

/// `ul.el-pager` with active item N: the item labelled N + 1.
fn by_numbered_pager(doc: &Html) -> Option<ElementRef<'_>> {
    let active = markup::select_all(doc, "ul.el-pager li.active").into_iter().next()?;
    let current: usize = markup::element_text(active).parse().ok()?;
    let pager = active.parent().and_then(ElementRef::wrap)?;
    let wanted = (current + 1).to_string();
    markup::child_elements(pager).find(|li| markup::element_text(*li) == wanted)
}

/// Advances the listing one page and reports how that went.
pub struct PaginationDriver<'a> {
    driver: &'a dyn ViewDriver,
    settings: &'a HarvestSettings,
}

impl<'a> PaginationDriver<'a> {
    pub fn new(driver: &'a dyn ViewDriver, settings: &'a HarvestSettings) -> Self {
        Self { driver, settings }
    }

    pub async fn advance(&self, view: ViewId) -> PageTurn {
        let before = match self.driver.markup(view).await {
            Ok(html) => html,
            Err(err) => return PageTurn::Failed { reason: err.to_string() },
        };

        let path = match locate_next(&before, self.settings) {
            NextControl::Enabled(path) => path,
            NextControl::Disabled => {
                harvest_info!("next control disabled; last page reached");
                return PageTurn::Terminal;
            }
            NextControl::Missing => {
                harvest_info!("no next control; last page reached");
                return PageTurn::Terminal;
            }
        };

        harvest_debug!("clicking next control {path}");
        if let Err(err) = self.driver.click(view, &path).await {
            return PageTurn::Failed { reason: err.to_string() };
        }

        let driver = self.driver;
        let before = before.as_str();
        let changed = poll_until(
            self.settings.page_change_timeout,
            &self.settings.backoff,
            || async move {
                let now = driver.markup(view).await.ok()?;
                (now != before).then_some(())
            },
        )
        .await;

        match changed {
            Some(()) => {
                tokio::time::sleep(self.settings.settle_delay).await;
                PageTurn::Advanced
            }
            None => {
                harvest_warn!(
                    "listing unchanged {:?} after next click",
                    self.settings.page_change_timeout
                );
                PageTurn::Failed {
                    reason: "listing did not change".to_string(),
                }
            }
        }
    }
}
