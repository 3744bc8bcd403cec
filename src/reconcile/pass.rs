use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::api::TorrentApi;
use crate::models::torrent::Snapshot;
use crate::reconcile::classifier::Classifier;
use crate::reconcile::remediation::{run_unit, UnitReport};

/// Where a pass currently is, or where it stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassPhase {
    Idle,
    Authenticating,
    SnapshotFetched,
    Dispatching,
    Done,
    /// Login or fetch failed, nothing was dispatched
    Aborted,
}

/// Summary of one reconciliation pass
#[derive(Clone, Debug, Serialize)]
pub struct PassReport {
    pub phase: PassPhase,
    pub torrents: usize,
    /// One entry per classifier, in `Classifier::ALL` order
    pub units: Vec<UnitReport>,
    /// Units whose task panicked before reporting
    pub panicked: usize,
    pub error: Option<String>,
}

impl PassReport {
    fn new() -> Self {
        Self {
            phase: PassPhase::Idle,
            torrents: 0,
            units: Vec::new(),
            panicked: 0,
            error: None,
        }
    }

    fn advance(&mut self, phase: PassPhase) {
        debug!(from = ?self.phase, to = ?phase, "Pass phase transition");
        self.phase = phase;
    }

    pub fn failed_units(&self) -> usize {
        self.units.iter().filter(|u| u.is_failed()).count() + self.panicked
    }

    pub fn selected(&self) -> usize {
        self.units.iter().map(|u| u.selected).sum()
    }
}

/// Drives one pass against a torrent client.
///
/// The snapshot is fetched once and shared read-only by every unit.
pub struct Reconciler {
    api: Arc<dyn TorrentApi>,
}

impl Reconciler {
    pub fn new(api: Arc<dyn TorrentApi>) -> Self {
        Self { api }
    }

    /// Run one pass to completion.
    ///
    /// Never returns early while a unit still has commands in flight.
    pub async fn run_pass(&self) -> PassReport {
        let mut report = PassReport::new();

        report.advance(PassPhase::Authenticating);
        if let Err(e) = self.api.login().await {
            error!(error = %e, "Unable to login, aborting pass");
            report.error = Some(e.to_string());
            report.advance(PassPhase::Aborted);
            return report;
        }

        let snapshot = match self.api.fetch_all().await {
            Ok(torrents) => Snapshot::new(torrents),
            Err(e) => {
                error!(error = %e, "Unable to fetch torrents, aborting pass");
                report.error = Some(e.to_string());
                report.advance(PassPhase::Aborted);
                return report;
            }
        };
        report.torrents = snapshot.len();
        report.advance(PassPhase::SnapshotFetched);

        info!(torrents = snapshot.len(), "Snapshot fetched");

        report.advance(PassPhase::Dispatching);
        let mut units = JoinSet::new();

        for classifier in Classifier::ALL {
            let api = Arc::clone(&self.api);
            let snapshot = snapshot.clone();

            units.spawn(async move {
                let selection = classifier.classify(&snapshot);
                run_unit(&*api, classifier, &selection).await
            });
        }

        while let Some(joined) = units.join_next().await {
            match joined {
                Ok(unit) => report.units.push(unit),
                Err(e) => {
                    error!(error = %e, "Remediation unit did not finish");
                    report.panicked += 1;
                }
            }
        }

        report.units.sort_by_key(|u| u.classifier);
        report.advance(PassPhase::Done);
        report
    }
}
