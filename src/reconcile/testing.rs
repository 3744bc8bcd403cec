// In-memory torrent client used by the dispatcher and pass tests

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use crate::api::TorrentApi;
use crate::core::error::ClientError;
use crate::models::torrent::{Torrent, TorrentFilter};
use crate::reconcile::remediation::Command;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Login,
    Fetch(TorrentFilter),
    Resume(Vec<String>),
    SetForceStart(Vec<String>, bool),
    Recheck(Vec<String>),
    SetAutoManagement(Vec<String>, bool),
}

pub struct MockApi {
    torrents: Vec<Torrent>,
    calls: Mutex<Vec<Call>>,
    failing: HashSet<Command>,
    fail_login: bool,
    fail_fetch: bool,
}

impl MockApi {
    pub fn new(torrents: Vec<Torrent>) -> Self {
        Self {
            torrents,
            calls: Mutex::new(Vec::new()),
            failing: HashSet::new(),
            fail_login: false,
            fail_fetch: false,
        }
    }

    pub fn failing_on(mut self, command: Command) -> Self {
        self.failing.insert(command);
        self
    }

    pub fn failing_login(mut self) -> Self {
        self.fail_login = true;
        self
    }

    pub fn failing_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Remediation calls only, sorted so concurrent interleavings compare equal
    pub fn commands_sorted(&self) -> Vec<Call> {
        let mut calls: Vec<Call> = self
            .calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::Login | Call::Fetch(_)))
            .collect();
        calls.sort_by_key(|c| format!("{:?}", c));
        calls
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn outcome(&self, command: Command) -> Result<(), ClientError> {
        if self.failing.contains(&command) {
            return Err(ClientError::command(command.name(), "HTTP 500 Internal Server Error"));
        }
        Ok(())
    }
}

#[async_trait]
impl TorrentApi for MockApi {
    async fn login(&self) -> Result<(), ClientError> {
        self.record(Call::Login);
        if self.fail_login {
            return Err(ClientError::Authentication("invalid username or password".to_string()));
        }
        Ok(())
    }

    async fn fetch_filtered(&self, filter: TorrentFilter) -> Result<Vec<Torrent>, ClientError> {
        self.record(Call::Fetch(filter));
        if self.fail_fetch {
            return Err(ClientError::Fetch("HTTP 503 Service Unavailable".to_string()));
        }
        Ok(self.torrents.clone())
    }

    async fn resume(&self, hashes: &[String]) -> Result<(), ClientError> {
        self.record(Call::Resume(hashes.to_vec()));
        self.outcome(Command::Resume)
    }

    async fn set_force_start(&self, hashes: &[String], enabled: bool) -> Result<(), ClientError> {
        self.record(Call::SetForceStart(hashes.to_vec(), enabled));
        self.outcome(Command::ForceStart)
    }

    async fn recheck(&self, hashes: &[String]) -> Result<(), ClientError> {
        self.record(Call::Recheck(hashes.to_vec()));
        self.outcome(Command::Recheck)
    }

    async fn set_auto_management(&self, hashes: &[String], enabled: bool) -> Result<(), ClientError> {
        self.record(Call::SetAutoManagement(hashes.to_vec(), enabled));
        self.outcome(Command::AutoManagement)
    }
}
