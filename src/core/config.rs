use anyhow::{bail, Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub client: ClientConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Per-request timeout in seconds
    pub request_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Levels accepted for `log_level`
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

// Default value functions
fn default_scheme() -> String {
    "http".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "console".to_string()
}

impl ClientConfig {
    /// Base URL of the qBittorrent Web UI, without a trailing slash
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            level: lookup("log_level").unwrap_or_else(default_log_level),
            format: lookup("log_format").unwrap_or_else(default_log_format),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("host").context("Missing required variable 'host'")?;

        let port = lookup("port").context("Missing required variable 'port'")?;
        let port = port
            .trim()
            .parse::<u16>()
            .context(format!("Invalid port '{}'", port))?;

        let request_timeout = match lookup("request_timeout") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .context(format!("Invalid request_timeout '{}'", raw))?,
            None => default_request_timeout(),
        };

        let config = Config {
            client: ClientConfig {
                scheme: lookup("scheme").unwrap_or_else(default_scheme),
                host,
                port,
                username: lookup("user").unwrap_or_default(),
                password: lookup("password").unwrap_or_default(),
                request_timeout,
            },
            logging: LoggingConfig::from_lookup(&lookup),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.client.host.trim().is_empty() {
            bail!("host must not be empty");
        }

        if self.client.port == 0 {
            bail!("port must be greater than 0");
        }

        let valid_schemes = ["http", "https"];
        if !valid_schemes.contains(&self.client.scheme.as_str()) {
            bail!(
                "Invalid scheme '{}'. Must be one of: http, https",
                self.client.scheme
            );
        }

        if self.client.request_timeout == 0 {
            bail!("request_timeout must be greater than 0");
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        Ok(())
    }
}
