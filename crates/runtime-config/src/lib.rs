//! Shared CLI/server configuration types.
//!
//! Both `trialdesk` and `trialdesk-server` read `trialdesk.toml` using these
//! types. Every field has a default, so an empty or partial file is valid and
//! a missing file behaves like an empty one.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use trialdesk_core::{Identity, Role};

/// Canonical config file name used by cli/server.
pub const CONFIG_FILE_NAME: &str = "trialdesk.toml";

/// Top-level configuration (persisted as `trialdesk.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TrialdeskConfig {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub query: QuerySettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

impl TrialdeskConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiSettings {
    /// Artificial delay applied to every mock API call.
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
        }
    }
}

impl ApiSettings {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuerySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// `0` keeps cached data fresh until it is invalidated.
    #[serde(default)]
    pub stale_time_secs: u64,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            stale_time_secs: 0,
        }
    }
}

impl QuerySettings {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn stale_time(&self) -> Option<Duration> {
        (self.stale_time_secs > 0).then(|| Duration::from_secs(self.stale_time_secs))
    }
}

/// Identity logged in when a session starts.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SessionSettings {
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub number: u32,
}

impl SessionSettings {
    pub fn identity(&self) -> Identity {
        Identity {
            role: self.role,
            number: self.number,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StorageSettings {
    /// Directory for the local store; empty means the platform data dir.
    #[serde(default)]
    pub dir: String,
}

impl StorageSettings {
    pub fn dir(&self) -> Option<PathBuf> {
        let dir = self.dir.trim();
        (!dir.is_empty()).then(|| PathBuf::from(dir))
    }
}

fn default_latency_ms() -> u64 {
    800
}
fn default_max_retries() -> usize {
    1
}
fn default_retry_delay_ms() -> u64 {
    1000
}
fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = TrialdeskConfig::from_toml_str("").expect("parse toml");
        assert_eq!(cfg, TrialdeskConfig::default());
        assert_eq!(cfg.api.latency(), Duration::from_millis(800));
        assert_eq!(cfg.query.max_retries, 1);
        assert_eq!(cfg.query.retry_delay(), Duration::from_secs(1));
        assert_eq!(cfg.query.stale_time(), None);
        assert_eq!(cfg.session.identity(), Identity::site(0));
        assert_eq!(cfg.server.bind, "127.0.0.1:3000");
        assert_eq!(cfg.storage.dir(), None);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = TrialdeskConfig::from_toml_str(
            r#"
[api]
latency_ms = 0

[session]
role = "sponsor"
number = 2

[query]
stale_time_secs = 30
"#,
        )
        .expect("parse toml");

        assert_eq!(cfg.api.latency(), Duration::ZERO);
        assert_eq!(cfg.session.identity(), Identity::sponsor(2));
        assert_eq!(cfg.query.stale_time(), Some(Duration::from_secs(30)));
        assert_eq!(cfg.query.retry_delay_ms, 1000);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = TrialdeskConfig::from_toml_str("[session]\nrole = \"monitor\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn storage_dir_is_trimmed() {
        let cfg = TrialdeskConfig::from_toml_str("[storage]\ndir = \"  /tmp/td  \"\n")
            .expect("parse toml");
        assert_eq!(cfg.storage.dir(), Some(PathBuf::from("/tmp/td")));
    }

    #[test]
    fn serialized_config_parses_back() {
        let mut cfg = TrialdeskConfig::default();
        cfg.session.role = Role::Sponsor;
        cfg.server.bind = "0.0.0.0:8080".into();
        let encoded = cfg.to_toml_string().expect("serialize config");
        assert!(encoded.contains("[session]"));
        assert_eq!(TrialdeskConfig::from_toml_str(&encoded).unwrap(), cfg);
    }
}
