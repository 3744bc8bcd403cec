use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::info;

use crate::models::torrent::{Snapshot, Torrent, TorrentState};

/// Remaining fraction at or below which a stalled download is force-restarted
pub const STALLED_REMAINING_RATIO: f64 = 0.1;

/// One unhealthy condition a torrent can be in.
///
/// Each state-based classifier matches a set of `TorrentState` values that
/// no other classifier matches, so their selections never overlap.
/// `AutoManagement` keys on the management flag alone and may share a
/// torrent with one state-based classifier; its command only toggles that
/// flag, so the units still run side by side without coordination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classifier {
    Stalled,
    ForcedUpDown,
    Errored,
    AutoManagement,
    Checking,
    Moving,
}

/// Hashes selected by one classifier, in snapshot order
pub type Selection = Vec<String>;

impl Classifier {
    pub const ALL: [Classifier; 6] = [
        Classifier::Stalled,
        Classifier::ForcedUpDown,
        Classifier::Errored,
        Classifier::AutoManagement,
        Classifier::Checking,
        Classifier::Moving,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Classifier::Stalled => "stalled",
            Classifier::ForcedUpDown => "forced_up_down",
            Classifier::Errored => "errored",
            Classifier::AutoManagement => "auto_management",
            Classifier::Checking => "checking",
            Classifier::Moving => "moving",
        }
    }

    /// Whether selection depends on the torrent's state
    pub fn is_state_based(&self) -> bool {
        !matches!(self, Classifier::AutoManagement)
    }

    /// Whether this classifier selects `torrent`
    pub fn selects(&self, torrent: &Torrent) -> bool {
        match self {
            Classifier::Stalled => is_stalled(torrent),
            Classifier::ForcedUpDown => matches!(
                torrent.state,
                TorrentState::ForcedDownloading | TorrentState::ForcedUploading
            ),
            Classifier::Errored => torrent.state == TorrentState::Error,
            Classifier::AutoManagement => !torrent.auto_managed,
            Classifier::Checking => matches!(
                torrent.state,
                TorrentState::CheckingUp | TorrentState::CheckingDown
            ),
            Classifier::Moving => torrent.state == TorrentState::Moving,
        }
    }

    /// Select the hashes of every matching torrent in the snapshot
    pub fn classify(&self, snapshot: &Snapshot) -> Selection {
        let mut seen = HashSet::new();
        let mut selection = Vec::new();

        for torrent in snapshot.iter() {
            if !self.selects(torrent) || !seen.insert(torrent.hash.as_str()) {
                continue;
            }

            info!(
                classifier = self.name(),
                hash = %torrent.hash,
                name = %torrent.name,
                "Torrent needs remediation"
            );
            selection.push(torrent.hash.clone());
        }

        selection
    }
}

impl fmt::Display for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn is_stalled(torrent: &Torrent) -> bool {
    if torrent.state != TorrentState::StalledDownloading {
        return false;
    }

    // Unresolved metadata is never eligible
    match torrent.remaining_ratio() {
        Some(ratio) => ratio <= STALLED_REMAINING_RATIO,
        None => false,
    }
}
