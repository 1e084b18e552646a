//! Harvester core: data model, row classification and the pure harvest state machine.
mod effect;
mod labels;
mod model;
mod msg;
mod reference;
mod state;
mod status;
mod summary;
mod update;

pub use effect::{Effect, FinishReason, ScanAttempt};
pub use labels::{FieldSynonyms, LogicalField};
pub use model::{
    Confidence, DetailDocument, ElementPath, ExtractedField, HarvestRecord, ListingRow,
    PathStep, RowLayout, RowSummary, RECORD_HEADER,
};
pub use msg::{AbandonKind, Msg, PageTurn, RowOutcome};
pub use reference::{resolve_link, Resolution, StandardReference, UnresolvedCause};
pub use state::{HarvestState, Phase, DEFAULT_MAX_PAGES};
pub use status::{Status, StatusMarkers};
pub use summary::RunSummary;
pub use update::update;
