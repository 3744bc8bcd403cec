// Errors raised while talking to the torrent client

use thiserror::Error;

/// Failures from the torrent client API.
///
/// `Authentication` and `Fetch` abort the whole pass. `Command` only stops
/// the remediation unit that issued it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Failed to fetch torrents: {0}")]
    Fetch(String),

    #[error("Command {command} failed: {reason}")]
    Command { command: String, reason: String },
}

impl ClientError {
    pub fn command(command: impl Into<String>, reason: impl ToString) -> Self {
        ClientError::Command {
            command: command.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error ends the pass rather than a single unit
    pub fn is_fatal(&self) -> bool {
        matches!(self, ClientError::Authentication(_) | ClientError::Fetch(_))
    }
}
