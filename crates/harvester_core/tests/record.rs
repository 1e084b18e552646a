use harvester_core::{
    Confidence, DetailDocument, ExtractedField, HarvestRecord, ListingRow, LogicalField,
    RowLayout, RowSummary, StandardReference, Status, UnresolvedCause, RECORD_HEADER,
};
use pretty_assertions::assert_eq;

fn listing_row(layout: RowLayout) -> ListingRow {
    ListingRow {
        index: 0,
        cells: vec![],
        status: Status::Current,
        summary: RowSummary {
            product_name: "List Name".into(),
            enterprise_name: "List Co".into(),
            registration_number: "REG-1".into(),
            status_text: "当前批件".into(),
        },
        layout,
        action: None,
    }
}

fn field(label: &str, value: &str) -> ExtractedField {
    ExtractedField {
        label: label.into(),
        value: value.into(),
        strategy: "table-row",
    }
}

#[test]
fn detail_values_win_and_listing_fills_gaps() {
    let mut doc = DetailDocument::new(Confidence::Normal);
    doc.insert(LogicalField::ProductName, field("产品名称中文", "ABC Cream"));
    doc.insert(LogicalField::ValidUntil, field("批件有效期", "2029-01-01"));

    let record = HarvestRecord::from_parts(
        &listing_row(RowLayout::Positional),
        &doc,
        StandardReference::DirectLink {
            url: "https://host/x.pdf".into(),
        },
    );

    assert_eq!(record.product_name, "ABC Cream");
    assert_eq!(record.enterprise_name, "List Co");
    assert_eq!(record.registration_number, "REG-1");
    assert_eq!(record.approval_date, None);
    assert_eq!(record.valid_until.as_deref(), Some("2029-01-01"));
    assert_eq!(
        record.to_row(),
        [
            "ABC Cream".to_string(),
            "List Co".into(),
            "REG-1".into(),
            "当前批件".into(),
            "".into(),
            "2029-01-01".into(),
            "https://host/x.pdf".into(),
            "direct-link".into(),
        ]
    );
    assert_eq!(record.to_row().len(), RECORD_HEADER.len());
}

#[test]
fn full_text_rows_persist_the_status_label() {
    let doc = DetailDocument::new(Confidence::Low);
    let record = HarvestRecord::from_parts(
        &listing_row(RowLayout::FullText),
        &doc,
        StandardReference::unresolved(UnresolvedCause::Absent),
    );
    let row = record.to_row();
    assert_eq!(row[3], "current");
    assert_eq!(row[6], "");
    assert_eq!(row[7], "unresolved:absent");
}

#[test]
fn document_exposes_matched_labels() {
    let mut doc = DetailDocument::new(Confidence::Normal);
    doc.insert(LogicalField::RegistrationNumber, field("注册证号", "国妆特字G2020"));
    doc.insert(LogicalField::ProductName, field("产品名称", "Lotion"));
    let labels: Vec<_> = doc.labels().collect();
    assert_eq!(labels, vec![("产品名称", "Lotion"), ("注册证号", "国妆特字G2020")]);
    assert_eq!(doc.len(), 2);
    assert_eq!(doc.confidence(), Confidence::Normal);
}
