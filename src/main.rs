use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use reconciler::api::client::QbitClient;
use reconciler::api::TorrentApi;
use reconciler::core::config::{Config, LoggingConfig};
use reconciler::core::tracing_init::init_tracing;
use reconciler::reconcile::pass::{PassPhase, Reconciler};

fn main() {
    // Logging comes up before the rest of the config so config errors are visible
    init_tracing(&LoggingConfig::from_env());

    // Every failure is reported and the process still exits 0
    if let Err(e) = run() {
        error!(error = %format!("{:#}", e), "Reconciliation did not run");
    }
}

fn run() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration from the environment")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    runtime.block_on(async_main(config))
}

async fn async_main(config: Config) -> Result<()> {
    info!(
        base_url = %config.client.base_url(),
        user = %config.client.username,
        request_timeout_seconds = config.client.request_timeout,
        "Torrent reconciliation starting"
    );

    let client = QbitClient::new(&config.client).context("Failed to create qBittorrent client")?;
    let api: Arc<dyn TorrentApi> = Arc::new(client);

    let report = Reconciler::new(api).run_pass().await;

    if report.phase == PassPhase::Done {
        info!(
            torrents = report.torrents,
            selected = report.selected(),
            failed_units = report.failed_units(),
            "Reconciliation pass finished"
        );
    } else {
        warn!(
            phase = ?report.phase,
            error = report.error.as_deref().unwrap_or_default(),
            "Reconciliation pass aborted"
        );
    }

    match serde_json::to_string(&report) {
        Ok(json) => debug!(report = %json, "Pass report"),
        Err(e) => warn!(error = %e, "Failed to serialize pass report"),
    }

    Ok(())
}
