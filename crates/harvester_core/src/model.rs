use std::collections::BTreeMap;
use std::fmt;

use crate::labels::LogicalField;
use crate::reference::StandardReference;
use crate::status::Status;

/// One step of a structural element path: tag name plus 1-based position
/// among element siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathStep {
    pub tag: String,
    pub nth: usize,
}

/// Structural address of an element, rendered as a chain of
/// `tag:nth-child(n)` selectors that any CSS engine understands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementPath {
    steps: Vec<PathStep>,
}

impl ElementPath {
    pub fn new(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The root step is rendered bare since the document root is unique.
    pub fn to_css(&self) -> String {
        self.steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                if i == 0 {
                    step.tag.clone()
                } else {
                    format!("{}:nth-child({})", step.tag, step.nth)
                }
            })
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

/// How the row-level fields were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLayout {
    /// Cells matched the expected column count and were read by index.
    Positional,
    /// Cell structure was unexpected; only the concatenated row text is known.
    FullText,
}

/// Coarse fields readable straight off the listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowSummary {
    pub product_name: String,
    pub enterprise_name: String,
    pub registration_number: String,
    pub status_text: String,
}

/// A data row of the current listing page. Rebuilt on every scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    pub index: usize,
    pub cells: Vec<String>,
    pub status: Status,
    pub summary: RowSummary,
    pub layout: RowLayout,
    /// The control that opens the row's detail view.
    pub action: Option<ElementPath>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Confidence {
    #[default]
    Normal,
    /// The readiness signal never showed up; values may be incomplete.
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedField {
    /// The synonym that matched.
    pub label: String,
    pub value: String,
    /// Name of the strategy that produced the value.
    pub strategy: &'static str,
}

/// Label/value pairs read from one detail session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetailDocument {
    fields: BTreeMap<LogicalField, ExtractedField>,
    confidence: Confidence,
}

impl DetailDocument {
    pub fn new(confidence: Confidence) -> Self {
        Self {
            fields: BTreeMap::new(),
            confidence,
        }
    }

    pub fn insert(&mut self, field: LogicalField, extracted: ExtractedField) {
        self.fields.insert(field, extracted);
    }

    pub fn get(&self, field: LogicalField) -> Option<&ExtractedField> {
        self.fields.get(&field)
    }

    pub fn value(&self, field: LogicalField) -> Option<&str> {
        self.fields.get(&field).map(|f| f.value.as_str())
    }

    /// Matched label to value, in field order.
    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .values()
            .map(|f| (f.label.as_str(), f.value.as_str()))
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Column order of the output table.
pub const RECORD_HEADER: [&str; 8] = [
    "productName",
    "enterpriseName",
    "registrationNumber",
    "status",
    "approvalDate",
    "validUntil",
    "standardReference",
    "standardResolution",
];

/// A persisted row. Never updated once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestRecord {
    pub product_name: String,
    pub enterprise_name: String,
    pub registration_number: String,
    pub status: Status,
    pub status_text: String,
    pub approval_date: Option<String>,
    pub valid_until: Option<String>,
    pub standard_reference: StandardReference,
}

impl HarvestRecord {
    /// Merges listing and detail values; the detail view wins when it has one.
    pub fn from_parts(
        row: &ListingRow,
        document: &DetailDocument,
        standard_reference: StandardReference,
    ) -> Self {
        let pick = |field: LogicalField, fallback: &str| {
            document
                .value(field)
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback)
                .to_string()
        };
        let optional = |field: LogicalField| {
            document
                .value(field)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let status_text = match row.layout {
            RowLayout::Positional => row.summary.status_text.clone(),
            RowLayout::FullText => String::new(),
        };

        Self {
            product_name: pick(LogicalField::ProductName, &row.summary.product_name),
            enterprise_name: pick(LogicalField::EnterpriseName, &row.summary.enterprise_name),
            registration_number: pick(
                LogicalField::RegistrationNumber,
                &row.summary.registration_number,
            ),
            status: row.status,
            status_text,
            approval_date: optional(LogicalField::ApprovalDate),
            valid_until: optional(LogicalField::ValidUntil),
            standard_reference,
        }
    }

    /// Cells in `RECORD_HEADER` order.
    pub fn to_row(&self) -> [String; 8] {
        let status = if self.status_text.trim().is_empty() {
            self.status.label().to_string()
        } else {
            self.status_text.clone()
        };
        [
            self.product_name.clone(),
            self.enterprise_name.clone(),
            self.registration_number.clone(),
            status,
            self.approval_date.clone().unwrap_or_default(),
            self.valid_until.clone().unwrap_or_default(),
            self.standard_reference.value().to_string(),
            self.standard_reference.resolution_label(),
        ]
    }
}
