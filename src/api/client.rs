use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

use crate::api::TorrentApi;
use crate::core::config::ClientConfig;
use crate::core::error::ClientError;
use crate::models::torrent::{Torrent, TorrentFilter};

/// Client for the qBittorrent Web API (v2).
///
/// The session cookie handed out by `login` is kept in the client's cookie
/// store and sent with every later request. qBittorrent 5 renamed
/// `torrents/resume` to `torrents/start`; `resume` falls back to the new
/// endpoint when the old one is missing.
pub struct QbitClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl QbitClient {
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .cookie_store(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v2/{}", self.base_url, path)
    }

    /// Issue one bulk command against `torrents/<path>`
    async fn post_command(
        &self,
        path: &str,
        hashes: &[String],
        extra: Option<(&str, bool)>,
    ) -> Result<(), ClientError> {
        let status = self.send_command(path, hashes, extra).await?;
        if !status.is_success() {
            return Err(ClientError::command(path, format!("HTTP {}", status)));
        }

        Ok(())
    }

    async fn send_command(
        &self,
        path: &str,
        hashes: &[String],
        extra: Option<(&str, bool)>,
    ) -> Result<StatusCode, ClientError> {
        let joined = hashes.join("|");
        let mut form: Vec<(&str, String)> = vec![("hashes", joined)];
        if let Some((key, value)) = extra {
            form.push((key, value.to_string()));
        }

        debug!(command = path, hashes = hashes.len(), "Sending bulk command");

        let response = self
            .client
            .post(self.url(&format!("torrents/{}", path)))
            .form(&form)
            .send()
            .await
            .map_err(|e| ClientError::command(path, e))?;

        Ok(response.status())
    }
}

#[async_trait]
impl TorrentApi for QbitClient {
    async fn login(&self) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.url("auth/login"))
            .header(reqwest::header::REFERER, &self.base_url)
            .form(&[("username", &self.username), ("password", &self.password)])
            .send()
            .await
            .map_err(|e| ClientError::Authentication(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Err(ClientError::Authentication(
                "client refused login, too many failed attempts".to_string(),
            ));
        }

        if !status.is_success() {
            return Err(ClientError::Authentication(format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Authentication(e.to_string()))?;

        if body.trim() != "Ok." {
            return Err(ClientError::Authentication("invalid username or password".to_string()));
        }

        debug!(base_url = %self.base_url, "Logged in");
        Ok(())
    }

    async fn fetch_filtered(&self, filter: TorrentFilter) -> Result<Vec<Torrent>, ClientError> {
        let response = self
            .client
            .get(self.url("torrents/info"))
            .query(&[("filter", filter.as_query())])
            .send()
            .await
            .map_err(|e| ClientError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Fetch(format!("HTTP {}", status)));
        }

        let torrents = response
            .json::<Vec<Torrent>>()
            .await
            .map_err(|e| ClientError::Fetch(format!("invalid torrent list: {}", e)))?;

        let (valid, invalid): (Vec<Torrent>, Vec<Torrent>) =
            torrents.into_iter().partition(Torrent::has_valid_hash);

        for torrent in &invalid {
            warn!(
                hash = %torrent.hash,
                name = %torrent.name,
                "Invalid info hash, skipping torrent"
            );
        }

        Ok(valid)
    }

    async fn resume(&self, hashes: &[String]) -> Result<(), ClientError> {
        let status = self.send_command("resume", hashes, None).await?;
        if status == StatusCode::NOT_FOUND {
            debug!("torrents/resume not found, using torrents/start");
            return self.post_command("start", hashes, None).await;
        }

        if !status.is_success() {
            return Err(ClientError::command("resume", format!("HTTP {}", status)));
        }

        Ok(())
    }

    async fn set_force_start(&self, hashes: &[String], enabled: bool) -> Result<(), ClientError> {
        self.post_command("setForceStart", hashes, Some(("value", enabled))).await
    }

    async fn recheck(&self, hashes: &[String]) -> Result<(), ClientError> {
        self.post_command("recheck", hashes, None).await
    }

    async fn set_auto_management(&self, hashes: &[String], enabled: bool) -> Result<(), ClientError> {
        self.post_command("setAutoManagement", hashes, Some(("enable", enabled))).await
    }
}
