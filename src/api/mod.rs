pub mod client;

use async_trait::async_trait;

use crate::core::error::ClientError;
use crate::models::torrent::{Torrent, TorrentFilter};

/// Operations the reconciler needs from a torrent client.
///
/// Every bulk command takes the whole batch of hashes in one call.
#[async_trait]
pub trait TorrentApi: Send + Sync {
    async fn login(&self) -> Result<(), ClientError>;

    async fn fetch_filtered(&self, filter: TorrentFilter) -> Result<Vec<Torrent>, ClientError>;

    async fn fetch_all(&self) -> Result<Vec<Torrent>, ClientError> {
        self.fetch_filtered(TorrentFilter::All).await
    }

    async fn resume(&self, hashes: &[String]) -> Result<(), ClientError>;

    async fn set_force_start(&self, hashes: &[String], enabled: bool) -> Result<(), ClientError>;

    async fn recheck(&self, hashes: &[String]) -> Result<(), ClientError>;

    async fn set_auto_management(&self, hashes: &[String], enabled: bool) -> Result<(), ClientError>;
}
