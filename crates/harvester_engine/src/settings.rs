use std::time::Duration;

use harvester_core::{FieldSynonyms, StatusMarkers, DEFAULT_MAX_PAGES};

use crate::wait::Backoff;

/// Cell positions of the row-level fields in a positional listing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingColumns {
    pub product_name: usize,
    pub enterprise_name: usize,
    pub registration_number: usize,
    pub status: usize,
}

impl Default for ListingColumns {
    fn default() -> Self {
        Self {
            product_name: 1,
            enterprise_name: 2,
            registration_number: 3,
            status: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HarvestSettings {
    /// Bound for the race after the initial filter click.
    pub filter_timeout: Duration,
    /// Bound for the race after a row's detail click.
    pub detail_timeout: Duration,
    /// Bound for the race after a standard-row control click.
    pub document_timeout: Duration,
    pub readiness_timeout: Duration,
    pub listing_timeout: Duration,
    pub overlay_timeout: Duration,
    pub page_change_timeout: Duration,
    /// Short pause after a view reports ready, for late scripts.
    pub settle_delay: Duration,
    pub backoff: Backoff,
    pub max_pages: usize,

    pub status_markers: StatusMarkers,
    pub synonyms: FieldSynonyms,
    /// Text of the control that opens a row's detail view.
    pub detail_marker: String,
    /// Text of the control that opens a standard document.
    pub view_marker: String,
    pub expected_cells: usize,
    pub columns: ListingColumns,
    /// Query key whose value carries the real document target.
    pub pointer_param: String,
    /// Shortest inline text accepted as the document itself.
    pub min_inline_chars: usize,

    pub next_selectors: Vec<String>,
    pub next_texts: Vec<String>,
    pub overlay_selectors: Vec<String>,
    pub close_selectors: Vec<String>,
    /// Where readable text lives in a freshly opened document view.
    pub content_selectors: Vec<String>,
    pub capture_missing_reference: bool,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            filter_timeout: Duration::from_secs(8),
            detail_timeout: Duration::from_secs(5),
            document_timeout: Duration::from_secs(5),
            readiness_timeout: Duration::from_secs(10),
            listing_timeout: Duration::from_secs(10),
            overlay_timeout: Duration::from_secs(5),
            page_change_timeout: Duration::from_secs(10),
            settle_delay: Duration::from_millis(500),
            backoff: Backoff::default(),
            max_pages: DEFAULT_MAX_PAGES,

            status_markers: StatusMarkers::default(),
            synonyms: FieldSynonyms::default(),
            detail_marker: "详情".to_string(),
            view_marker: "查看".to_string(),
            expected_cells: 5,
            columns: ListingColumns::default(),
            pointer_param: "url".to_string(),
            min_inline_chars: 200,

            next_selectors: owned(&["button.btn-next", "li.next", "a.next"]),
            next_texts: owned(&["下一页", "Next"]),
            overlay_selectors: owned(&[
                ".el-dialog__body",
                ".modal-body",
                "[role=dialog]",
                ".layui-layer-content",
            ]),
            close_selectors: owned(&[
                ".el-dialog__headerbtn",
                ".modal .close",
                ".layui-layer-close",
                "button.close",
            ]),
            content_selectors: owned(&["pre", "article", ".content", "#content", "body"]),
            capture_missing_reference: true,
        }
    }
}
