//! Entry-point support for the harvester binary: configuration, logging
//! and the run wiring.

pub mod config;
pub mod logging;
pub mod progress;
#[cfg(feature = "chromium")]
pub mod run;

pub use config::{load_config, save_template_if_missing, AppConfig, TimeoutsMs, CONFIG_FILENAME};
pub use progress::LoggingProgressSink;
