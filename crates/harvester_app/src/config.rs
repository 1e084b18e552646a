use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use harvest_logging::{harvest_error, harvest_info, harvest_warn};
use harvester_core::{FieldSynonyms, StatusMarkers};
use harvester_engine::{parent_dir, AtomicFileWriter, Backoff, HarvestSettings, PersistError};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILENAME: &str = "harvester.ron";

const DEFAULT_START_URL: &str =
    "https://www.nmpa.gov.cn/datasearch/home-index.html?itemId=ff8080818046502f0180f934f6873f78#category=hzp";

/// Bounds and poll intervals, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsMs {
    pub filter: u64,
    pub detail: u64,
    pub document: u64,
    pub readiness: u64,
    pub listing: u64,
    pub overlay: u64,
    pub page_change: u64,
    pub settle: u64,
    pub poll_initial: u64,
    pub poll_max: u64,
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Default for TimeoutsMs {
    fn default() -> Self {
        let s = HarvestSettings::default();
        Self {
            filter: millis(s.filter_timeout),
            detail: millis(s.detail_timeout),
            document: millis(s.document_timeout),
            readiness: millis(s.readiness_timeout),
            listing: millis(s.listing_timeout),
            overlay: millis(s.overlay_timeout),
            page_change: millis(s.page_change_timeout),
            settle: millis(s.settle_delay),
            poll_initial: millis(s.backoff.initial),
            poll_max: millis(s.backoff.max),
        }
    }
}

/// User-editable run configuration, read from `harvester.ron`.
///
/// Every field is optional in the file; missing ones take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub start_url: String,
    /// Region filter clicked before harvesting; `None` harvests unfiltered.
    pub filter_text: Option<String>,
    pub output_csv: PathBuf,
    /// Where failure screenshots go; `None` disables capture.
    pub diagnostics_dir: Option<PathBuf>,
    pub headless: bool,
    pub max_pages: usize,
    pub timeouts: TimeoutsMs,
    pub status_markers: StatusMarkers,
    pub synonyms: FieldSynonyms,
    pub pointer_param: String,
    pub min_inline_chars: usize,
    pub capture_missing_reference: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let s = HarvestSettings::default();
        Self {
            start_url: DEFAULT_START_URL.to_string(),
            filter_text: Some("广东".to_string()),
            output_csv: PathBuf::from("harvest.csv"),
            diagnostics_dir: Some(PathBuf::from("debug_screenshots")),
            headless: false,
            max_pages: s.max_pages,
            timeouts: TimeoutsMs::default(),
            status_markers: s.status_markers,
            synonyms: s.synonyms,
            pointer_param: s.pointer_param,
            min_inline_chars: s.min_inline_chars,
            capture_missing_reference: s.capture_missing_reference,
        }
    }
}

impl AppConfig {
    /// Builds engine settings; anything the file does not cover keeps the
    /// engine default.
    pub fn to_settings(&self) -> HarvestSettings {
        let t = &self.timeouts;
        let ms = Duration::from_millis;
        HarvestSettings {
            filter_timeout: ms(t.filter),
            detail_timeout: ms(t.detail),
            document_timeout: ms(t.document),
            readiness_timeout: ms(t.readiness),
            listing_timeout: ms(t.listing),
            overlay_timeout: ms(t.overlay),
            page_change_timeout: ms(t.page_change),
            settle_delay: ms(t.settle),
            backoff: Backoff {
                initial: ms(t.poll_initial.max(1)),
                max: ms(t.poll_max.max(t.poll_initial).max(1)),
                ..Backoff::default()
            },
            max_pages: self.max_pages.max(1),
            status_markers: self.status_markers.clone(),
            synonyms: self.synonyms.clone(),
            pointer_param: self.pointer_param.clone(),
            min_inline_chars: self.min_inline_chars,
            capture_missing_reference: self.capture_missing_reference,
            ..HarvestSettings::default()
        }
    }
}

/// Reads the config at `path`, falling back to defaults when it is missing
/// or unparsable.
pub fn load_config(path: &Path) -> AppConfig {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            harvest_info!("No config at {:?}; using defaults", path);
            return AppConfig::default();
        }
        Err(err) => {
            harvest_warn!("Failed to read config from {:?}: {}", path, err);
            return AppConfig::default();
        }
    };

    match ron::from_str(&content) {
        Ok(config) => {
            harvest_info!("Loaded config from {:?}", path);
            config
        }
        Err(err) => {
            harvest_warn!("Failed to parse config from {:?}: {}", path, err);
            AppConfig::default()
        }
    }
}

/// Writes a template with every default spelled out, unless
/// a file already exists. Returns whether a template was written.
pub fn save_template_if_missing(path: &Path) -> Result<bool, PersistError> {
    if path.exists() {
        return Ok(false);
    }

    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&AppConfig::default(), pretty) {
        Ok(text) => text,
        Err(err) => {
            harvest_error!("Failed to serialize config template: {}", err);
            return Ok(false);
        }
    };

    let dir = parent_dir(path);
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| CONFIG_FILENAME.to_string());

    AtomicFileWriter::new(dir).write(&filename, content)?;
    harvest_info!("Wrote config template to {:?}", path);
    Ok(true)
}
