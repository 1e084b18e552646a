//! In-memory `ViewDriver` that replays scripted reactions to clicks.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use harvester_core::ElementPath;
use harvester_engine::markup;
use harvester_engine::{Backoff, DriverError, DriverFailure, HarvestSettings, ViewDriver, ViewId};
use scraper::ElementRef;

#[derive(Debug, Clone)]
pub struct Page {
    pub url: String,
    pub markup: String,
}

impl Page {
    pub fn new(url: &str, markup: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            markup: markup.into(),
        }
    }
}

/// What happens when an element carrying a `data-key` is clicked.
#[derive(Debug, Clone)]
pub enum Reaction {
    OpenView(Page),
    Navigate(Page),
    SetMarkup(String),
    /// The click itself errors, as when another element intercepts it.
    Fail(String),
    Nothing,
}

#[derive(Default)]
struct Inner {
    views: BTreeMap<u64, Vec<Page>>,
    next_id: u64,
    reactions: HashMap<String, Reaction>,
    clicks: Vec<String>,
    opened: usize,
    closed: usize,
}

impl Inner {
    fn current(&self, view: ViewId) -> Result<&Page, DriverError> {
        self.views
            .get(&view.0)
            .and_then(|history| history.last())
            .ok_or_else(|| DriverError::new(DriverFailure::ViewClosed, view.to_string()))
    }

    fn open(&mut self, page: Page) -> ViewId {
        self.next_id += 1;
        self.views.insert(self.next_id, vec![page]);
        ViewId(self.next_id)
    }
}

pub struct ScriptedDriver {
    inner: Mutex<Inner>,
}

impl ScriptedDriver {
    pub fn new(start: Page) -> (Arc<Self>, ViewId) {
        let mut inner = Inner::default();
        let view = inner.open(start);
        (
            Arc::new(Self {
                inner: Mutex::new(inner),
            }),
            view,
        )
    }

    pub fn on(&self, key: &str, reaction: Reaction) {
        self.inner
            .lock()
            .unwrap()
            .reactions
            .insert(key.to_string(), reaction);
    }

    /// Keys of clicked elements, in order; unkeyed clicks show as "".
    pub fn clicks(&self) -> Vec<String> {
        self.inner.lock().unwrap().clicks.clone()
    }

    pub fn open_views(&self) -> Vec<ViewId> {
        self.inner
            .lock()
            .unwrap()
            .views
            .keys()
            .map(|id| ViewId(*id))
            .collect()
    }

    /// Views opened by clicks (the starting view is not counted).
    pub fn opened(&self) -> usize {
        self.inner.lock().unwrap().opened
    }

    pub fn closed(&self) -> usize {
        self.inner.lock().unwrap().closed
    }

    pub fn current_url(&self, view: ViewId) -> String {
        self.inner.lock().unwrap().current(view).unwrap().url.clone()
    }

    pub fn open_extra_view(&self, page: Page) -> ViewId {
        let mut inner = self.inner.lock().unwrap();
        inner.opened += 1;
        inner.open(page)
    }
}

fn clicked_key(html: &str, target: &ElementPath) -> Option<Option<String>> {
    let doc = markup::parse(html);
    let element = markup::find_by_path(&doc, target)?;
    let key = std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .find_map(|el| el.value().attr("data-key").map(str::to_string));
    Some(key)
}

#[async_trait::async_trait]
impl ViewDriver for ScriptedDriver {
    async fn views(&self) -> Result<Vec<ViewId>, DriverError> {
        Ok(self.open_views())
    }

    async fn markup(&self, view: ViewId) -> Result<String, DriverError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.current(view)?.markup.clone())
    }

    async fn url(&self, view: ViewId) -> Result<String, DriverError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.current(view)?.url.clone())
    }

    async fn click(&self, view: ViewId, target: &ElementPath) -> Result<(), DriverError> {
        let mut inner = self.inner.lock().unwrap();
        let html = inner.current(view)?.markup.clone();
        let key = clicked_key(&html, target)
            .ok_or_else(|| DriverError::new(DriverFailure::ElementMissing, target.to_string()))?;
        let key = key.unwrap_or_default();
        inner.clicks.push(key.clone());

        let reaction = inner.reactions.get(&key).cloned().unwrap_or(Reaction::Nothing);
        match reaction {
            Reaction::OpenView(page) => {
                inner.opened += 1;
                inner.open(page);
            }
            Reaction::Navigate(page) => {
                if let Some(history) = inner.views.get_mut(&view.0) {
                    history.push(page);
                }
            }
            Reaction::SetMarkup(markup) => {
                if let Some(page) = inner.views.get_mut(&view.0).and_then(|h| h.last_mut()) {
                    page.markup = markup;
                }
            }
            Reaction::Fail(message) => {
                return Err(DriverError::new(DriverFailure::Timeout, message));
            }
            Reaction::Nothing => {}
        }
        Ok(())
    }

    async fn go_back(&self, view: ViewId) -> Result<(), DriverError> {
        let mut inner = self.inner.lock().unwrap();
        let history = inner
            .views
            .get_mut(&view.0)
            .ok_or_else(|| DriverError::new(DriverFailure::ViewClosed, view.to_string()))?;
        if history.len() < 2 {
            return Err(DriverError::new(DriverFailure::Navigation, "no history"));
        }
        history.pop();
        Ok(())
    }

    async fn screenshot(&self, view: ViewId) -> Result<Vec<u8>, DriverError> {
        let inner = self.inner.lock().unwrap();
        inner.current(view)?;
        Ok(b"\x89PNG\r\n\x1a\nscripted".to_vec())
    }

    async fn close(&self, view: ViewId) -> Result<(), DriverError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .views
            .remove(&view.0)
            .ok_or_else(|| DriverError::new(DriverFailure::ViewClosed, view.to_string()))?;
        inner.closed += 1;
        Ok(())
    }
}

/// Bounds short enough that a test never waits long on a race it loses.
pub fn fast_settings() -> HarvestSettings {
    let short = Duration::from_millis(60);
    HarvestSettings {
        filter_timeout: short,
        detail_timeout: short,
        document_timeout: short,
        readiness_timeout: short,
        listing_timeout: short,
        overlay_timeout: short,
        page_change_timeout: short,
        settle_delay: Duration::from_millis(1),
        backoff: Backoff {
            initial: Duration::from_millis(1),
            max: Duration::from_millis(10),
            factor: 2,
        },
        ..HarvestSettings::default()
    }
}

pub const LISTING_URL: &str = "https://registry.example/hzp/list";
pub const DOC_URL: &str = "https://registry.example/viewer?other=1&url=%2Fdocs%2Fx.pdf&x=2";

pub struct Row<'a> {
    pub product: &'a str,
    pub enterprise: &'a str,
    pub registration: &'a str,
    pub status: &'a str,
    pub key: &'a str,
}

pub fn row<'a>(product: &'a str, status: &'a str, key: &'a str) -> Row<'a> {
    Row {
        product,
        enterprise: "Acme Cosmetics Co.",
        registration: "REG-0001",
        status,
        key,
    }
}

pub enum Pager<'a> {
    Next(&'a str),
    Disabled,
    None,
}

pub fn listing(rows: &[Row], pager: Pager) -> String {
    let body: String = rows
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><a href="javascript:void(0)" data-key="{}">详情</a></td></tr>"#,
                i + 1,
                r.product,
                r.enterprise,
                r.registration,
                r.status,
                r.key
            )
        })
        .collect();
    let pager = match pager {
        Pager::Next(key) => format!(r#"<button class="btn-next" data-key="{key}">下一页</button>"#),
        Pager::Disabled => r#"<button class="btn-next" disabled="disabled">下一页</button>"#.to_string(),
        Pager::None => String::new(),
    };
    format!(
        r#"<html><head><title>list</title></head><body>
<table class="listing">
<tr><th>序号</th><th>产品名称</th><th>注册人</th><th>注册证号</th><th>状态</th><th>操作</th></tr>
{body}
</table>
<div class="pager">{pager}</div>
</body></html>"#
    )
}

/// Detail table; `standard` is the inner HTML of the standard row's value
/// cell, or `None` to leave the row out entirely.
pub fn detail(product: &str, standard: Option<&str>) -> String {
    let standard_row = standard
        .map(|cell| format!("<tr><td>产品执行的标准</td><td>{cell}</td></tr>"))
        .unwrap_or_default();
    format!(
        r#"<html><body><table class="detail">
<tr><td>产品名称中文</td><td>{product}</td></tr>
<tr><td>注册人中文名称</td><td>Detail Enterprise Ltd.</td></tr>
<tr><td>注册证号</td><td>国妆特字G2023001</td></tr>
<tr><td>批件批准日期</td><td>2023-01-01</td></tr>
<tr><td>批件有效期</td><td>2028-01-01</td></tr>
{standard_row}
</table></body></html>"#
    )
}

pub fn view_control(key: &str) -> String {
    format!(r#"<a href="javascript:void(0)" data-key="{key}">查看</a>"#)
}

pub fn document_page() -> Page {
    Page::new(DOC_URL, "<html><body><embed src=\"/docs/x.pdf\"></body></html>")
}
