#[cfg(feature = "chromium")]
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    use std::path::Path;

    use harvester_app::logging::{self, LogDestination, LOG_FILENAME};
    use harvester_app::{load_config, save_template_if_missing, CONFIG_FILENAME};
    use log::LevelFilter;

    logging::initialize(LogDestination::Both, LevelFilter::Info, Path::new(LOG_FILENAME));

    let config_path = Path::new(CONFIG_FILENAME);
    if let Err(err) = save_template_if_missing(config_path) {
        log::warn!("Could not write config template: {err}");
    }
    let config = load_config(config_path);

    let summary = harvester_app::run::run(&config).await?;
    log::info!(
        "Done: {} saved, {} abandoned, finish {:?}",
        summary.persisted,
        summary.abandoned,
        summary.finish
    );
    Ok(())
}

#[cfg(not(feature = "chromium"))]
fn main() {
    eprintln!("harvester_app was built without a browser; rebuild with `--features chromium`.");
}
