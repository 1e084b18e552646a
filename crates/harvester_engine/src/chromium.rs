//! [`ViewDriver`] over a Chromium instance controlled through DevTools.

use std::sync::Mutex;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::target::TargetId;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures_util::StreamExt;
use harvest_logging::{harvest_debug, harvest_warn};
use harvester_core::ElementPath;

use crate::driver::{ViewDriver, ViewId};
use crate::{DriverError, DriverFailure};

fn protocol(err: CdpError) -> DriverError {
    DriverError::new(DriverFailure::Protocol, err.to_string())
}

/// Pages are numbered in the order they were first seen, so a view id is
/// never reused within one browser session.
pub struct ChromiumDriver {
    browser: Browser,
    seen: Mutex<Vec<TargetId>>,
}

impl ChromiumDriver {
    /// Starts Chromium, opens `start_url` and returns the driver together
    /// with the view holding that page.
    pub async fn launch(headless: bool, start_url: &str) -> Result<(Self, ViewId), DriverError> {
        let mut builder = BrowserConfig::builder();
        if !headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|msg| DriverError::new(DriverFailure::Protocol, msg))?;
        let (browser, mut handler) = Browser::launch(config).await.map_err(protocol)?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    harvest_warn!("browser handler stopped: {err}");
                    break;
                }
            }
        });

        let page = browser.new_page(start_url).await.map_err(protocol)?;
        let driver = Self {
            browser,
            seen: Mutex::new(Vec::new()),
        };
        let view = driver.register(page.target_id())?;
        harvest_debug!("opened {start_url} as {view}");
        Ok((driver, view))
    }

    fn register(&self, target: &TargetId) -> Result<ViewId, DriverError> {
        let mut seen = self
            .seen
            .lock()
            .map_err(|_| DriverError::new(DriverFailure::Protocol, "view table poisoned"))?;
        let index = match seen.iter().position(|t| t == target) {
            Some(index) => index,
            None => {
                seen.push(target.clone());
                seen.len() - 1
            }
        };
        Ok(ViewId(index as u64 + 1))
    }

    fn target(&self, view: ViewId) -> Result<TargetId, DriverError> {
        let seen = self
            .seen
            .lock()
            .map_err(|_| DriverError::new(DriverFailure::Protocol, "view table poisoned"))?;
        let index = (view.0 as usize).checked_sub(1);
        index
            .and_then(|i| seen.get(i).cloned())
            .ok_or_else(|| DriverError::new(DriverFailure::ViewClosed, view.to_string()))
    }

    async fn page(&self, view: ViewId) -> Result<Page, DriverError> {
        let target = self.target(view)?;
        let pages = self.browser.pages().await.map_err(protocol)?;
        pages
            .into_iter()
            .find(|page| *page.target_id() == target)
            .ok_or_else(|| DriverError::new(DriverFailure::ViewClosed, view.to_string()))
    }
}

#[async_trait::async_trait]
impl ViewDriver for ChromiumDriver {
    async fn views(&self) -> Result<Vec<ViewId>, DriverError> {
        let pages = self.browser.pages().await.map_err(protocol)?;
        let mut views = pages
            .iter()
            .map(|page| self.register(page.target_id()))
            .collect::<Result<Vec<_>, _>>()?;
        views.sort();
        Ok(views)
    }

    async fn markup(&self, view: ViewId) -> Result<String, DriverError> {
        self.page(view).await?.content().await.map_err(protocol)
    }

    async fn url(&self, view: ViewId) -> Result<String, DriverError> {
        let url = self.page(view).await?.url().await.map_err(protocol)?;
        Ok(url.unwrap_or_default())
    }

    async fn click(&self, view: ViewId, target: &ElementPath) -> Result<(), DriverError> {
        let page = self.page(view).await?;
        let element = page
            .find_element(target.to_css())
            .await
            .map_err(|err| DriverError::new(DriverFailure::ElementMissing, err.to_string()))?;
        element.scroll_into_view().await.map_err(protocol)?;
        element.click().await.map_err(protocol)?;
        Ok(())
    }

    async fn go_back(&self, view: ViewId) -> Result<(), DriverError> {
        self.page(view)
            .await?
            .evaluate("history.back()")
            .await
            .map_err(|err| DriverError::new(DriverFailure::Navigation, err.to_string()))?;
        Ok(())
    }

    async fn screenshot(&self, view: ViewId) -> Result<Vec<u8>, DriverError> {
        let params = ScreenshotParams::builder().full_page(true).build();
        self.page(view)
            .await?
            .screenshot(params)
            .await
            .map_err(protocol)
    }

    async fn close(&self, view: ViewId) -> Result<(), DriverError> {
        self.page(view).await?.close().await.map_err(protocol)
    }

    async fn bring_to_front(&self, view: ViewId) -> Result<(), DriverError> {
        self.page(view)
            .await?
            .bring_to_front()
            .await
            .map_err(protocol)?;
        Ok(())
    }
}
