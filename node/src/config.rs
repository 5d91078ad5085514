//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{LogFormat, NodeError};

/// Configuration for one party's node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Well-known name of the party this node acts for.
    #[serde(default = "default_party_name")]
    pub party_name: String,

    /// How long a flow waits for a counterparty's answer.
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,

    /// Notices kept in the inbox before the oldest is dropped.
    #[serde(default = "default_inbox_capacity")]
    pub inbox_capacity: usize,

    /// Whether to enable the HTTP server.
    #[serde(default = "default_true")]
    pub enable_rpc: bool,

    /// HTTP port (if enabled).
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to expose the Prometheus `/metrics` endpoint.
    #[serde(default)]
    pub enable_metrics: bool,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_party_name() -> String {
    "Doctor D1".to_string()
}

fn default_session_timeout_ms() -> u64 {
    30_000
}

fn default_inbox_capacity() -> usize {
    256
}

fn default_true() -> bool {
    true
}

fn default_rpc_port() -> u16 {
    10050
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Reject values no node can run with.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.party_name.trim().is_empty() {
            return Err(NodeError::Config("party_name must not be empty".into()));
        }
        if self.session_timeout_ms == 0 {
            return Err(NodeError::Config("session_timeout_ms must be positive".into()));
        }
        self.log_format()?;
        Ok(())
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            party_name: default_party_name(),
            session_timeout_ms: default_session_timeout_ms(),
            inbox_capacity: default_inbox_capacity(),
            enable_rpc: default_true(),
            rpc_port: default_rpc_port(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: false,
        }
    }
}
