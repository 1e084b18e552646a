//! Correlated sessions: detecting them, tracking them, closing them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use harvest_logging::{harvest_debug, harvest_warn};

use crate::driver::{ViewDriver, ViewId};
use crate::markup;
use crate::settings::HarvestSettings;
use crate::wait::{poll_until, Backoff};
use crate::HarvestError;

/// Result of racing for a new browsing context after a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correlation {
    CorrelatedSession(ViewId),
    NoNewSession,
}

/// Waits up to `bound` for a view that was not in `before`.
///
/// When several appear, the most recently created one wins.
pub async fn race_new_view(
    driver: &dyn ViewDriver,
    before: &[ViewId],
    bound: Duration,
    backoff: &Backoff,
) -> Correlation {
    let found = poll_until(bound, backoff, || async move {
        match driver.views().await {
            Ok(views) => views.into_iter().filter(|v| !before.contains(v)).last(),
            Err(err) => {
                harvest_debug!("view enumeration failed during race: {err}");
                None
            }
        }
    })
    .await;

    match found {
        Some(view) => Correlation::CorrelatedSession(view),
        None => Correlation::NoNewSession,
    }
}

/// An open correlated session and how to undo it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    NewView { view: ViewId, parent: ViewId },
    InPlace { view: ViewId, origin_url: String },
    Overlay { view: ViewId },
}

impl Session {
    /// Interprets a race outcome. Without a new view, a changed URL means the
    /// trigger navigated in place; an unchanged one means an overlay.
    pub async fn from_race(
        driver: &dyn ViewDriver,
        parent: ViewId,
        origin_url: &str,
        correlation: Correlation,
    ) -> Self {
        match correlation {
            Correlation::CorrelatedSession(view) => Session::NewView { view, parent },
            Correlation::NoNewSession => match driver.url(parent).await {
                Ok(url) if url != origin_url => Session::InPlace {
                    view: parent,
                    origin_url: origin_url.to_string(),
                },
                _ => Session::Overlay { view: parent },
            },
        }
    }

    /// The view holding the session's content.
    pub fn view(&self) -> ViewId {
        match self {
            Session::NewView { view, .. }
            | Session::InPlace { view, .. }
            | Session::Overlay { view } => *view,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Session::NewView { .. } => "new-view",
            Session::InPlace { .. } => "in-place",
            Session::Overlay { .. } => "overlay",
        }
    }
}

/// Counts opened and closed sessions across a run.
#[derive(Debug, Default)]
pub struct SessionLedger {
    opened: AtomicUsize,
    closed: AtomicUsize,
    close_failures: AtomicUsize,
}

impl SessionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_open(&self) {
        self.opened.fetch_add(1, Ordering::SeqCst);
    }

    /// Only a close the driver confirmed counts as closed.
    pub fn record_close(&self, ok: bool) {
        if ok {
            self.closed.fetch_add(1, Ordering::SeqCst);
        } else {
            self.close_failures.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn close_failures(&self) -> usize {
        self.close_failures.load(Ordering::SeqCst)
    }

    /// Every opened session was closed and no close attempt failed.
    pub fn balanced(&self) -> bool {
        self.opened() == self.closed() && self.close_failures() == 0
    }
}

/// Undoes a session and records the attempt in `ledger`.
pub async fn close_session(
    driver: &dyn ViewDriver,
    session: &Session,
    settings: &HarvestSettings,
    ledger: &SessionLedger,
) -> Result<(), HarvestError> {
    let result = match session {
        Session::NewView { view, parent } => {
            let closed = driver.close(*view).await.map_err(HarvestError::from);
            if let Err(err) = driver.bring_to_front(*parent).await {
                harvest_debug!("could not refocus {parent}: {err}");
            }
            closed
        }
        Session::InPlace { view, origin_url } => {
            revert_navigation(driver, *view, origin_url, settings).await
        }
        Session::Overlay { view } => dismiss_overlay(driver, *view, settings).await,
    };

    if let Err(err) = &result {
        harvest_warn!("closing {} session on {} failed: {err}", session.kind(), session.view());
    }
    ledger.record_close(result.is_ok());
    result
}

async fn revert_navigation(
    driver: &dyn ViewDriver,
    view: ViewId,
    origin_url: &str,
    settings: &HarvestSettings,
) -> Result<(), HarvestError> {
    driver.go_back(view).await?;
    let returned = poll_until(settings.page_change_timeout, &settings.backoff, || async move {
        match driver.url(view).await {
            Ok(url) if url == origin_url => Some(()),
            _ => None,
        }
    })
    .await;
    returned.ok_or(HarvestError::NavigationTimeout(settings.page_change_timeout))
}

/// Clicks the close control of the topmost overlay.
///
/// Stacked overlays are attached after the ones they cover, so the topmost
/// one owns the last visible close control in document order.
pub async fn dismiss_overlay(
    driver: &dyn ViewDriver,
    view: ViewId,
    settings: &HarvestSettings,
) -> Result<(), HarvestError> {
    let html = driver.markup(view).await?;
    let target = {
        let doc = markup::parse(&html);
        let closers: Vec<_> = settings
            .close_selectors
            .iter()
            .filter_map(|css| markup::selector(css))
            .collect();
        markup::all_elements(&doc)
            .filter(|el| closers.iter().any(|sel| sel.matches(el)) && !markup::is_hidden(*el))
            .last()
            .map(markup::element_path)
    };
    match target {
        Some(path) => {
            driver.click(view, &path).await?;
            Ok(())
        }
        None => Err(HarvestError::not_found("overlay close control")),
    }
}
