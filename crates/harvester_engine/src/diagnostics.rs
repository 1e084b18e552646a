//! Point-in-time snapshots of a view taken when something went wrong.

use std::path::PathBuf;
use std::sync::Arc;

use harvest_logging::{harvest_info, harvest_warn};

use crate::driver::{ViewDriver, ViewId};
use crate::persist::{AtomicFileWriter, PersistError};

/// Produces the timestamp part of artifact names.
pub type Clock = Arc<dyn Fn() -> String + Send + Sync>;

pub fn utc_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ").to_string())
}

/// Base name shared by the artifacts of one capture.
pub fn artifact_stem(page: usize, row: Option<usize>, timestamp: &str) -> String {
    match row {
        Some(row) => format!("page{page:03}_row{row:03}_{timestamp}"),
        None => format!("page{page:03}_view_{timestamp}"),
    }
}

/// Files written by one capture. Missing parts failed individually.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureArtifacts {
    pub screenshot: Option<PathBuf>,
    pub markup: Option<PathBuf>,
    pub sidecar: Option<PathBuf>,
}

pub struct DiagnosticsCollector {
    writer: Option<AtomicFileWriter>,
    clock: Clock,
}

impl DiagnosticsCollector {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_clock(dir, utc_clock())
    }

    pub fn with_clock(dir: impl Into<PathBuf>, clock: Clock) -> Self {
        Self {
            writer: Some(AtomicFileWriter::new(dir.into())),
            clock,
        }
    }

    /// A collector that never writes anything.
    pub fn disabled() -> Self {
        Self {
            writer: None,
            clock: utc_clock(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Best effort: every failure is logged and swallowed.
    pub async fn capture(
        &self,
        driver: &dyn ViewDriver,
        view: ViewId,
        page: usize,
        row: Option<usize>,
        reason: &str,
    ) -> Option<CaptureArtifacts> {
        let writer = self.writer.as_ref()?;
        let timestamp = (self.clock)();
        let stem = artifact_stem(page, row, &timestamp);
        let mut artifacts = CaptureArtifacts::default();

        match driver.screenshot(view).await {
            Ok(png) => artifacts.screenshot = write_logged(writer, &format!("{stem}.png"), png),
            Err(err) => harvest_warn!("screenshot for {stem} failed: {err}"),
        }

        match driver.markup(view).await {
            Ok(html) => artifacts.markup = write_logged(writer, &format!("{stem}.html"), html),
            Err(err) => harvest_warn!("markup for {stem} failed: {err}"),
        }

        let url = driver.url(view).await.unwrap_or_default();
        let sidecar = serde_json::json!({
            "page": page,
            "row": row,
            "timestamp": timestamp,
            "reason": reason,
            "url": url,
            "view": view.0,
        });
        let sidecar_name = format!("{stem}.json");
        artifacts.sidecar = logged(writer, &sidecar_name, writer.write_json(&sidecar_name, &sidecar));

        harvest_info!("captured diagnostics {stem}: {reason}");
        Some(artifacts)
    }
}

fn write_logged(writer: &AtomicFileWriter, filename: &str, content: impl AsRef<[u8]>) -> Option<PathBuf> {
    logged(writer, filename, writer.write(filename, content))
}

fn logged(
    writer: &AtomicFileWriter,
    filename: &str,
    written: Result<PathBuf, PersistError>,
) -> Option<PathBuf> {
    match written {
        Ok(path) => Some(path),
        Err(err) => {
            harvest_warn!("writing {} to {} failed: {err}", filename, writer.dir().display());
            None
        }
    }
}
