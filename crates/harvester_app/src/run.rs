use std::sync::Arc;

use anyhow::Context;
use harvest_logging::harvest_info;
use harvester_core::RunSummary;
use harvester_engine::{ChromiumDriver, CsvRecordSink, DiagnosticsCollector, NavigationController};

use crate::config::AppConfig;
use crate::progress::LoggingProgressSink;

/// Launches Chromium on the configured start page and harvests until the
/// listing is exhausted or the page cap is reached.
pub async fn run(config: &AppConfig) -> anyhow::Result<RunSummary> {
    let settings = config.to_settings();
    let sink = CsvRecordSink::open(&config.output_csv)
        .with_context(|| format!("opening output {:?}", config.output_csv))?;
    let diagnostics = match &config.diagnostics_dir {
        Some(dir) => DiagnosticsCollector::new(dir.clone()),
        None => DiagnosticsCollector::disabled(),
    };

    let (driver, view) = ChromiumDriver::launch(config.headless, &config.start_url)
        .await
        .context("launching chromium")?;
    let driver = Arc::new(driver);

    let mut controller = NavigationController::new(driver, view, settings, sink, diagnostics)
        .with_progress(Arc::new(LoggingProgressSink));

    if let Some(filter) = config.filter_text.as_deref().filter(|f| !f.trim().is_empty()) {
        controller.apply_filter(filter).await;
    }

    let summary = controller.run().await;
    harvest_info!(
        "Wrote {} records to {:?}",
        controller.sink().appended(),
        controller.sink().path()
    );
    Ok(summary)
}
