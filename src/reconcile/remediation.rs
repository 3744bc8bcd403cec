use serde::Serialize;
use std::fmt;
use tracing::{error, info};

use crate::api::TorrentApi;
use crate::core::error::ClientError;
use crate::reconcile::classifier::Classifier;

/// A bulk command issued against a batch of hashes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Resume,
    ForceStart,
    Recheck,
    AutoManagement,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Resume => "resume",
            Command::ForceStart => "set_force_start",
            Command::Recheck => "recheck",
            Command::AutoManagement => "set_auto_management",
        }
    }

    async fn issue(&self, api: &dyn TorrentApi, hashes: &[String]) -> Result<(), ClientError> {
        match self {
            Command::Resume => api.resume(hashes).await,
            Command::ForceStart => api.set_force_start(hashes, true).await,
            Command::Recheck => api.recheck(hashes).await,
            Command::AutoManagement => api.set_auto_management(hashes, true).await,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Classifier {
    /// Commands issued for this classifier's selection, in order
    pub fn commands(&self) -> &'static [Command] {
        match self {
            Classifier::Stalled => &[Command::ForceStart, Command::Recheck],
            Classifier::ForcedUpDown => &[Command::Resume],
            Classifier::Errored => &[Command::Resume, Command::ForceStart],
            Classifier::AutoManagement => &[Command::AutoManagement],
            Classifier::Checking => &[Command::Resume, Command::ForceStart],
            Classifier::Moving => &[Command::Resume, Command::ForceStart],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnitOutcome {
    /// Nothing selected, no request sent
    Skipped,
    Completed,
    Failed { command: Command, error: String },
}

/// Result of one remediation unit
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UnitReport {
    pub classifier: Classifier,
    pub selected: usize,
    pub issued: Vec<Command>,
    pub outcome: UnitOutcome,
}

impl UnitReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, UnitOutcome::Failed { .. })
    }
}

/// Apply a classifier's commands to its selection.
///
/// Commands run strictly in order and each one carries the whole batch.
/// The first failure stops this unit only.
pub async fn run_unit(
    api: &dyn TorrentApi,
    classifier: Classifier,
    selection: &[String],
) -> UnitReport {
    let mut report = UnitReport {
        classifier,
        selected: selection.len(),
        issued: Vec::new(),
        outcome: UnitOutcome::Skipped,
    };

    if selection.is_empty() {
        return report;
    }

    for command in classifier.commands() {
        report.issued.push(*command);

        if let Err(e) = command.issue(api, selection).await {
            error!(
                classifier = classifier.name(),
                command = command.name(),
                torrents = selection.len(),
                error = %e,
                "Remediation command failed, skipping remaining commands"
            );
            report.outcome = UnitOutcome::Failed {
                command: *command,
                error: e.to_string(),
            };
            return report;
        }
    }

    info!(
        classifier = classifier.name(),
        torrents = selection.len(),
        commands = report.issued.len(),
        "Remediation applied"
    );
    report.outcome = UnitOutcome::Completed;
    report
}
