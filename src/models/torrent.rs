use serde::{Deserialize, Deserializer};
use std::ops::Deref;
use std::sync::Arc;

/// State of a torrent as reported by qBittorrent.
///
/// Only a handful of these drive classification. The remaining variants
/// exist so that a real snapshot deserializes without loss.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum TorrentState {
    #[serde(rename = "downloading")]
    Downloading,
    #[serde(rename = "stalledDL")]
    StalledDownloading,
    #[serde(rename = "forcedDL")]
    ForcedDownloading,
    #[serde(rename = "uploading")]
    Uploading,
    #[serde(rename = "stalledUP")]
    StalledUploading,
    #[serde(rename = "forcedUP")]
    ForcedUploading,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "missingFiles")]
    MissingFiles,
    #[serde(rename = "checkingUP")]
    CheckingUp,
    #[serde(rename = "checkingDL")]
    CheckingDown,
    #[serde(rename = "checkingResumeData")]
    CheckingResumeData,
    #[serde(rename = "moving")]
    Moving,
    #[serde(rename = "pausedUP", alias = "stoppedUP")]
    PausedUp,
    #[serde(rename = "pausedDL", alias = "stoppedDL")]
    PausedDown,
    #[serde(rename = "queuedUP")]
    QueuedUp,
    #[serde(rename = "queuedDL")]
    QueuedDown,
    #[serde(rename = "metaDL", alias = "forcedMetaDL")]
    MetaDl,
    #[serde(rename = "allocating")]
    Allocating,
    #[serde(other)]
    Unknown,
}

/// Server-side list filter. Narrows a fetch, never a torrent's own state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TorrentFilter {
    All,
    Downloading,
    Uploading,
    Inactive,
    StalledDownloading,
    Errored,
}

impl TorrentFilter {
    pub fn as_query(&self) -> &'static str {
        match self {
            TorrentFilter::All => "all",
            TorrentFilter::Downloading => "downloading",
            TorrentFilter::Uploading => "uploading",
            TorrentFilter::Inactive => "inactive",
            TorrentFilter::StalledDownloading => "stalled_downloading",
            TorrentFilter::Errored => "errored",
        }
    }
}

/// One managed download, keyed by its info hash
#[derive(Clone, Debug, Deserialize)]
pub struct Torrent {
    /// Hex-encoded info hash, stable for the torrent's lifetime
    pub hash: String,
    /// Display label
    #[serde(default)]
    pub name: String,
    pub state: TorrentState,
    /// Total bytes selected for download, 0 while metadata is unresolved
    #[serde(default, deserialize_with = "non_negative")]
    pub total_size: u64,
    /// Bytes still missing
    #[serde(default, deserialize_with = "non_negative")]
    pub amount_left: u64,
    /// Automatic torrent management (storage paths handled by the client)
    #[serde(rename = "auto_tmm", default)]
    pub auto_managed: bool,
}

// qBittorrent reports -1 for sizes it does not know yet
fn non_negative<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = i64::deserialize(deserializer)?;
    Ok(value.max(0) as u64)
}

impl Torrent {
    pub fn new(
        hash: impl Into<String>,
        name: impl Into<String>,
        state: TorrentState,
        total_size: u64,
        amount_left: u64,
        auto_managed: bool,
    ) -> Self {
        Self {
            hash: hash.into(),
            name: name.into(),
            state,
            total_size,
            amount_left,
            auto_managed,
        }
    }

    /// Fraction of the payload still missing, or `None` when the size is unknown
    pub fn remaining_ratio(&self) -> Option<f64> {
        if self.total_size == 0 {
            return None;
        }

        Some(self.amount_left as f64 / self.total_size as f64)
    }

    /// A v1 (SHA-1) or v2 (SHA-256) info hash in hex
    pub fn has_valid_hash(&self) -> bool {
        match hex::decode(&self.hash) {
            Ok(bytes) => bytes.len() == 20 || bytes.len() == 32,
            Err(_) => false,
        }
    }
}

/// Immutable point-in-time list of torrents shared by every remediation unit
#[derive(Clone, Debug)]
pub struct Snapshot {
    torrents: Arc<[Torrent]>,
}

impl Snapshot {
    pub fn new(torrents: Vec<Torrent>) -> Self {
        Self {
            torrents: torrents.into(),
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Deref for Snapshot {
    type Target = [Torrent];

    fn deref(&self) -> &Self::Target {
        &self.torrents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const V1_HASH: &str = "8c212779b4abde7c6bc608063a0d008b7e40ce32";

    #[test]
    fn test_deserialize_torrent_info() {
        let json = r#"{
            "hash": "8c212779b4abde7c6bc608063a0d008b7e40ce32",
            "name": "debian-12.iso",
            "state": "stalledDL",
            "total_size": 1000,
            "amount_left": 50,
            "auto_tmm": false,
            "ratio": 0.0
        }"#;

        let torrent: Torrent = serde_json::from_str(json).unwrap();
        assert_eq!(torrent.hash, V1_HASH);
        assert_eq!(torrent.name, "debian-12.iso");
        assert_eq!(torrent.state, TorrentState::StalledDownloading);
        assert_eq!(torrent.total_size, 1000);
        assert_eq!(torrent.amount_left, 50);
        assert!(!torrent.auto_managed);
    }

    #[test]
    fn test_deserialize_state_strings() {
        let cases = [
            ("\"forcedDL\"", TorrentState::ForcedDownloading),
            ("\"forcedUP\"", TorrentState::ForcedUploading),
            ("\"error\"", TorrentState::Error),
            ("\"checkingUP\"", TorrentState::CheckingUp),
            ("\"checkingDL\"", TorrentState::CheckingDown),
            ("\"moving\"", TorrentState::Moving),
            ("\"stoppedDL\"", TorrentState::PausedDown),
        ];

        for (raw, expected) in cases {
            let state: TorrentState = serde_json::from_str(raw).unwrap();
            assert_eq!(state, expected, "state {}", raw);
        }
    }

    #[test]
    fn test_unknown_state_does_not_fail() {
        let state: TorrentState = serde_json::from_str("\"somethingNew\"").unwrap();
        assert_eq!(state, TorrentState::Unknown);
    }

    #[test]
    fn test_negative_size_means_unresolved() {
        let json = r#"{"hash": "ab", "state": "metaDL", "total_size": -1, "amount_left": -1}"#;
        let torrent: Torrent = serde_json::from_str(json).unwrap();
        assert_eq!(torrent.total_size, 0);
        assert_eq!(torrent.remaining_ratio(), None);
    }

    #[test]
    fn test_remaining_ratio() {
        let torrent = Torrent::new(V1_HASH, "a", TorrentState::StalledDownloading, 1000, 50, true);
        assert_eq!(torrent.remaining_ratio(), Some(0.05));
    }

    #[test]
    fn test_hash_validation() {
        let v1 = Torrent::new(V1_HASH, "v1", TorrentState::Downloading, 1, 1, true);
        let v2 = Torrent::new("ab".repeat(32), "v2", TorrentState::Downloading, 1, 1, true);
        let short = Torrent::new("a1", "short", TorrentState::Downloading, 1, 1, true);
        let garbage = Torrent::new("z".repeat(40), "garbage", TorrentState::Downloading, 1, 1, true);

        assert!(v1.has_valid_hash());
        assert!(v2.has_valid_hash());
        assert!(!short.has_valid_hash());
        assert!(!garbage.has_valid_hash());
    }

    #[test]
    fn test_filter_query_values() {
        assert_eq!(TorrentFilter::All.as_query(), "all");
        assert_eq!(TorrentFilter::Inactive.as_query(), "inactive");
        assert_eq!(TorrentFilter::StalledDownloading.as_query(), "stalled_downloading");
    }

    #[test]
    fn test_snapshot_is_shared_not_copied() {
        let snapshot = Snapshot::new(vec![Torrent::new(V1_HASH, "a", TorrentState::Error, 0, 0, true)]);
        let other = snapshot.clone();
        assert!(std::ptr::eq(snapshot.as_ptr(), other.as_ptr()));
        assert_eq!(other.len(), 1);
    }
}
