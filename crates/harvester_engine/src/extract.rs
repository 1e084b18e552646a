use harvest_logging::harvest_debug;
use harvester_core::{Confidence, DetailDocument, ExtractedField, FieldSynonyms, LogicalField};
use scraper::{ElementRef, Html};

use crate::markup;

/// One way of finding the value that belongs to a label.
pub trait FieldStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Value for `label`, or `None` when this strategy cannot see one.
    fn find(&self, doc: &Html, label: &str) -> Option<String>;
}

/// Label and value as neighbouring cells of one table row.
#[derive(Debug, Default)]
pub struct TableRowStrategy;

impl FieldStrategy for TableRowStrategy {
    fn name(&self) -> &'static str {
        "table-row"
    }

    fn find(&self, doc: &Html, label: &str) -> Option<String> {
        markup::innermost_rows(doc).into_iter().find_map(|tr| {
            let cells = markup::row_cells(tr);
            let at = cells
                .iter()
                .position(|cell| markup::label_matches(&markup::element_text(*cell), label))?;
            cells
                .get(at + 1)
                .map(|cell| markup::element_text(*cell))
                .filter(|value| !value.is_empty())
        })
    }
}

/// Label in any element, value in that element's next element sibling.
#[derive(Debug, Default)]
pub struct SiblingElementStrategy;

impl FieldStrategy for SiblingElementStrategy {
    fn name(&self) -> &'static str {
        "sibling-element"
    }

    fn find(&self, doc: &Html, label: &str) -> Option<String> {
        markup::all_elements(doc)
            .filter(|el| markup::label_matches(&markup::own_text(*el), label))
            .find_map(|el| {
                el.next_siblings()
                    .find_map(ElementRef::wrap)
                    .map(markup::element_text)
                    .filter(|value| !value.is_empty())
            })
    }
}

/// Ordered strategies. A field nobody can resolve stays absent.
pub struct StrategyChain {
    strategies: Vec<Box<dyn FieldStrategy>>,
}

impl Default for StrategyChain {
    fn default() -> Self {
        Self::new(vec![
            Box::new(TableRowStrategy),
            Box::new(SiblingElementStrategy),
        ])
    }
}

impl StrategyChain {
    pub fn new(strategies: Vec<Box<dyn FieldStrategy>>) -> Self {
        Self { strategies }
    }

    /// Tries every synonym with the first strategy before falling back to
    /// the next one.
    pub fn resolve(&self, doc: &Html, synonyms: &[String]) -> Option<ExtractedField> {
        for strategy in &self.strategies {
            for label in synonyms.iter().filter(|l| !l.trim().is_empty()) {
                if let Some(value) = strategy.find(doc, label) {
                    return Some(ExtractedField {
                        label: label.clone(),
                        value,
                        strategy: strategy.name(),
                    });
                }
            }
        }
        None
    }

    pub fn extract_document(
        &self,
        html: &str,
        synonyms: &FieldSynonyms,
        confidence: Confidence,
    ) -> DetailDocument {
        let doc = markup::parse(html);
        let mut document = DetailDocument::new(confidence);
        for field in LogicalField::ALL {
            match self.resolve(&doc, synonyms.for_field(field)) {
                Some(extracted) => {
                    harvest_debug!(
                        "{field} = {:?} via {} ({})",
                        extracted.value,
                        extracted.strategy,
                        extracted.label
                    );
                    document.insert(field, extracted);
                }
                None => harvest_debug!("{field} not found"),
            }
        }
        document
    }
}
