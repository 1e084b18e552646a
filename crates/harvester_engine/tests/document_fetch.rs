mod support;

use harvester_core::{StandardReference, UnresolvedCause};
use harvester_engine::{
    build_reference, locate_standard_row, DiagnosticsCollector, DocumentFetcher, HarvestSettings,
    SessionLedger, StandardRow,
};
use pretty_assertions::assert_eq;
use support::{
    detail, document_page, fast_settings, view_control, Page, Reaction, ScriptedDriver,
};

const DETAIL_URL: &str = "https://registry.example/hzp/detail?id=1";

#[test]
fn standard_row_shapes() {
    let settings = HarvestSettings::default();

    assert_eq!(
        locate_standard_row(&detail("ABC", None), &settings),
        StandardRow::Absent
    );
    assert_eq!(
        locate_standard_row(&detail("ABC", Some("")), &settings),
        StandardRow::Bare
    );
    assert_eq!(
        locate_standard_row(&detail("ABC", Some("Q/ABC 0001-2023")), &settings),
        StandardRow::Inline {
            value: "Q/ABC 0001-2023".to_string()
        }
    );

    let StandardRow::Control { value, href, .. } = locate_standard_row(
        &detail("ABC", Some(r#"<a href="/view?url=%2Fdocs%2Fy.pdf">查看</a>"#)),
        &settings,
    ) else {
        panic!("expected a control");
    };
    assert_eq!(value, "");
    assert_eq!(href.as_deref(), Some("/view?url=%2Fdocs%2Fy.pdf"));
}

#[test]
fn hidden_controls_are_passed_over() {
    let settings = HarvestSettings::default();
    let cell = concat!(
        r#"<a style="display: none" href="/view?url=%2Fdocs%2Fstale.pdf">查看</a>"#,
        r#"<a href="/view?url=%2Fdocs%2Flive.pdf">查看</a>"#,
    );

    let StandardRow::Control { href, .. } =
        locate_standard_row(&detail("ABC", Some(cell)), &settings)
    else {
        panic!("expected a control");
    };
    assert_eq!(href.as_deref(), Some("/view?url=%2Fdocs%2Flive.pdf"));
}

#[test]
fn hidden_lone_anchor_is_not_a_control() {
    let settings = HarvestSettings::default();
    let cell = r#"Q/ABC 0001-2023 <a hidden href="/view?url=%2Fdocs%2Fx.pdf">下载</a>"#;

    assert!(!matches!(
        locate_standard_row(&detail("ABC", Some(cell)), &settings),
        StandardRow::Control { .. }
    ));
}

#[test]
fn long_inline_text_wins_and_keeps_the_link() {
    let settings = HarvestSettings {
        min_inline_chars: 10,
        ..HarvestSettings::default()
    };

    let reference = build_reference(
        "1. Scope. This standard specifies...",
        Some("https://x/view?url=%2Fdocs%2Fx.pdf"),
        &settings,
    );

    assert_eq!(
        reference,
        StandardReference::InlineText {
            text: "1. Scope. This standard specifies...".to_string(),
            link: Some("/docs/x.pdf".to_string()),
        }
    );
}

#[test]
fn short_text_defers_to_the_link() {
    let settings = HarvestSettings::default();
    let reference = build_reference("PDF", Some("https://x/files/doc.pdf"), &settings);
    assert_eq!(
        reference,
        StandardReference::DirectLink {
            url: "https://x/files/doc.pdf".to_string()
        }
    );
}

#[tokio::test]
async fn control_opening_a_new_view_resolves_the_redirect_target() {
    let (driver, view) = ScriptedDriver::new(Page::new(
        DETAIL_URL,
        detail("ABC", Some(view_control("doc").as_str())),
    ));
    driver.on("doc", Reaction::OpenView(document_page()));
    let settings = fast_settings();
    let diagnostics = DiagnosticsCollector::disabled();
    let ledger = SessionLedger::new();

    let reference = DocumentFetcher::new(driver.as_ref(), &settings, &diagnostics, &ledger)
        .fetch(view, 1, 0)
        .await;

    assert_eq!(
        reference,
        StandardReference::DecodedRedirectParam {
            target: "/docs/x.pdf".to_string(),
            url: support::DOC_URL.to_string(),
        }
    );
    assert_eq!(driver.open_views(), vec![view]);
    assert_eq!((ledger.opened(), ledger.closed()), (1, 1));
}

#[tokio::test]
async fn control_opening_an_overlay_reads_the_embedded_document() {
    let before = detail("ABC", Some(view_control("doc").as_str()));
    let with_overlay = before.replace(
        "</body>",
        r#"<div class="el-dialog"><button class="el-dialog__headerbtn" data-key="close">×</button>
           <div class="el-dialog__body"><iframe src="/pdfjs/web/viewer.html?url=%2Fdocs%2Fz.pdf"></iframe></div></div></body>"#,
    );
    let (driver, view) = ScriptedDriver::new(Page::new(DETAIL_URL, before.clone()));
    driver.on("doc", Reaction::SetMarkup(with_overlay));
    driver.on("close", Reaction::SetMarkup(before));
    let settings = fast_settings();
    let diagnostics = DiagnosticsCollector::disabled();
    let ledger = SessionLedger::new();

    let reference = DocumentFetcher::new(driver.as_ref(), &settings, &diagnostics, &ledger)
        .fetch(view, 1, 0)
        .await;

    assert_eq!(reference.value(), "/docs/z.pdf");
    assert_eq!(driver.clicks(), vec!["doc", "close"]);
    assert_eq!(ledger.close_failures(), 0);
    assert!(ledger.balanced());
}

#[tokio::test]
async fn an_overlay_that_cannot_be_dismissed_unbalances_the_ledger() {
    let before = detail("ABC", Some(view_control("doc").as_str()));
    let stuck = before.replace(
        "</body>",
        r#"<div class="el-dialog"><div class="el-dialog__body"><iframe src="/docs/z.pdf"></iframe></div></div></body>"#,
    );
    let (driver, view) = ScriptedDriver::new(Page::new(DETAIL_URL, before));
    driver.on("doc", Reaction::SetMarkup(stuck));
    let settings = fast_settings();
    let diagnostics = DiagnosticsCollector::disabled();
    let ledger = SessionLedger::new();

    let reference = DocumentFetcher::new(driver.as_ref(), &settings, &diagnostics, &ledger)
        .fetch(view, 1, 0)
        .await;

    assert_eq!(reference.value(), "/docs/z.pdf");
    assert_eq!(ledger.opened(), 1);
    assert_eq!(ledger.closed(), 0);
    assert_eq!(ledger.close_failures(), 1);
    assert!(!ledger.balanced());
}

#[tokio::test]
async fn missing_row_or_control_is_unresolved() {
    let settings = fast_settings();
    let diagnostics = DiagnosticsCollector::disabled();
    let ledger = SessionLedger::new();

    let (driver, view) = ScriptedDriver::new(Page::new(DETAIL_URL, detail("ABC", None)));
    let absent = DocumentFetcher::new(driver.as_ref(), &settings, &diagnostics, &ledger)
        .fetch(view, 1, 0)
        .await;
    assert_eq!(absent, StandardReference::unresolved(UnresolvedCause::Absent));

    let (driver, view) = ScriptedDriver::new(Page::new(DETAIL_URL, detail("ABC", Some(""))));
    let bare = DocumentFetcher::new(driver.as_ref(), &settings, &diagnostics, &ledger)
        .fetch(view, 1, 0)
        .await;
    assert_eq!(bare, StandardReference::unresolved(UnresolvedCause::NoControl));
    assert!(driver.clicks().is_empty());
}

#[tokio::test]
async fn a_control_that_does_nothing_degrades_to_failed() {
    let (driver, view) = ScriptedDriver::new(Page::new(
        DETAIL_URL,
        detail("ABC", Some(view_control("dead").as_str())),
    ));
    let settings = fast_settings();
    let diagnostics = DiagnosticsCollector::disabled();
    let ledger = SessionLedger::new();

    let reference = DocumentFetcher::new(driver.as_ref(), &settings, &diagnostics, &ledger)
        .fetch(view, 1, 0)
        .await;

    assert!(matches!(
        reference,
        StandardReference::Unresolved {
            cause: UnresolvedCause::Failed(_)
        }
    ));
    assert_eq!(reference.resolution_label(), "unresolved:failed");
    assert_eq!((ledger.opened(), ledger.closed()), (0, 0));
}
