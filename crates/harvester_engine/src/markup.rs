//! Helpers over parsed markup snapshots.
//!
//! Parsed documents are not `Send`; callers parse, extract owned values and
//! drop the document before the next `.await`.

use ego_tree::NodeRef;
use harvester_core::{ElementPath, PathStep};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

pub fn parse(markup: &str) -> Html {
    Html::parse_document(markup)
}

/// Collapses whitespace runs to single spaces and trims.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// All descendant text of an element, normalized.
pub fn element_text(element: ElementRef) -> String {
    normalize_text(&element.text().collect::<String>())
}

/// Text of the element's direct text children only.
pub fn own_text(element: ElementRef) -> String {
    let raw: String = element
        .children()
        .filter_map(|child| child.value().as_text().map(|text| &**text))
        .collect();
    normalize_text(&raw)
}

pub fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

pub fn select_all<'a>(doc: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match selector(css) {
        Some(sel) => doc.select(&sel).collect(),
        None => Vec::new(),
    }
}

/// Descendants of `element` matching `css`, excluding the element itself.
pub fn select_within<'a>(element: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match selector(css) {
        Some(sel) => element.select(&sel).collect(),
        None => Vec::new(),
    }
}

/// Table rows that do not wrap another table row; outer rows of nested
/// layout tables are skipped.
pub fn innermost_rows(doc: &Html) -> Vec<ElementRef<'_>> {
    select_all(doc, "tr")
        .into_iter()
        .filter(|tr| select_within(*tr, "tr").is_empty())
        .collect()
}

/// Element children of `element` (text and comments skipped).
pub fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap)
}

/// Direct `td`/`th` children of a table row.
pub fn row_cells<'a>(row: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    child_elements(row)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
        .collect()
}

/// Every element of the document, in document order.
pub fn all_elements<'a>(doc: &'a Html) -> impl Iterator<Item = ElementRef<'a>> {
    doc.root_element().descendants().filter_map(ElementRef::wrap)
}

pub fn element_path(element: ElementRef) -> ElementPath {
    let mut steps = Vec::new();
    let mut current = Some(element);
    while let Some(node) = current {
        let nth = node
            .prev_siblings()
            .filter(|sibling| sibling.value().is_element())
            .count()
            + 1;
        steps.push(PathStep {
            tag: node.value().name().to_string(),
            nth,
        });
        current = node.parent().and_then(ElementRef::wrap);
    }
    steps.reverse();
    ElementPath::new(steps)
}

pub fn find_by_path<'a>(doc: &'a Html, path: &ElementPath) -> Option<ElementRef<'a>> {
    if path.is_empty() {
        return None;
    }
    let sel = selector(&path.to_css())?;
    doc.select(&sel).next()
}

fn label_key(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, ':' | '：' | '*'))
        .collect()
}

/// True when `text` mentions `label`, ignoring whitespace and colons.
pub fn label_matches(text: &str, label: &str) -> bool {
    let label = label_key(label);
    !label.is_empty() && label_key(text).contains(&label)
}

/// Inline `display: none`, `hidden` or `aria-hidden` on the element or any ancestor.
pub fn is_hidden(element: ElementRef) -> bool {
    let mut current: Option<NodeRef<Node>> = Some(*element);
    while let Some(node) = current {
        if let Some(el) = ElementRef::wrap(node) {
            let attrs = el.value();
            let style_hidden = attrs
                .attr("style")
                .map(|style| {
                    style
                        .chars()
                        .filter(|c| !c.is_whitespace())
                        .collect::<String>()
                        .contains("display:none")
                })
                .unwrap_or(false);
            if style_hidden
                || attrs.attr("hidden").is_some()
                || attrs.attr("aria-hidden") == Some("true")
            {
                return true;
            }
        }
        current = node.parent();
    }
    false
}

/// `disabled` attribute, a class mentioning "disabled", or `aria-disabled`,
/// on the element itself or its parent.
pub fn is_disabled(element: ElementRef) -> bool {
    let flagged = |el: ElementRef| {
        let attrs = el.value();
        attrs.attr("disabled").is_some()
            || attrs.attr("aria-disabled") == Some("true")
            || attrs
                .attr("class")
                .map(|class| class.contains("disabled"))
                .unwrap_or(false)
    };
    flagged(element) || element.parent().and_then(ElementRef::wrap).is_some_and(flagged)
}

/// `href` of an anchor when it points somewhere real.
pub fn navigable_href(element: ElementRef) -> Option<String> {
    let href = element.value().attr("href")?.trim();
    let lower = href.to_ascii_lowercase();
    if href.is_empty() || lower.starts_with('#') || lower.starts_with("javascript:") {
        return None;
    }
    Some(href.to_string())
}
