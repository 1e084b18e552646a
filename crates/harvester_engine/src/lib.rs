//! Harvester engine: view driving, extraction, sessions and persistence.
#[cfg(feature = "chromium")]
mod chromium;
mod controller;
mod detail;
mod diagnostics;
mod document;
mod driver;
mod extract;
pub mod markup;
mod paginate;
mod persist;
mod progress;
mod scan;
mod session;
mod settings;
mod sink;
mod types;
mod wait;

#[cfg(feature = "chromium")]
pub use chromium::ChromiumDriver;
pub use controller::NavigationController;
pub use detail::{session_markup, shows_any_label, DetailResolver, ResolvedRow};
pub use diagnostics::{artifact_stem, utc_clock, CaptureArtifacts, Clock, DiagnosticsCollector};
pub use document::{
    build_reference, locate_standard_row, read_inline_text, read_overlays, DocumentFetcher,
    OverlayContent, StandardRow,
};
pub use driver::{ViewDriver, ViewId};
pub use extract::{FieldStrategy, SiblingElementStrategy, StrategyChain, TableRowStrategy};
pub use paginate::{locate_next, NextControl, PaginationDriver};
pub use persist::{ensure_output_dir, parent_dir, AtomicFileWriter, PersistError};
pub use progress::{ChannelProgressSink, NullProgressSink, ProgressSink};
pub use scan::{parse_listing, ListingScanner};
pub use session::{
    close_session, dismiss_overlay, race_new_view, Correlation, Session, SessionLedger,
};
pub use settings::{HarvestSettings, ListingColumns};
pub use sink::{CsvRecordSink, RecordSink};
pub use types::{DriverError, DriverFailure, HarvestError, HarvestEvent};
pub use wait::{poll_until, Backoff};
