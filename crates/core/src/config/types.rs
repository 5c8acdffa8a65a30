use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use crate::upload::DuplicatePolicy;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub mirror: MirrorConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// How long SQLite waits on a locked database before reporting busy.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl DatabaseConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("shiptrack.db")
}

fn default_busy_timeout_ms() -> u64 {
    2000
}

/// Scan workflow configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowConfig {
    /// Attempts per operation when the store reports a transient failure.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay between attempts, multiplied by the attempt number.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    50
}

/// Upload configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Policy used when an upload request does not name one.
    #[serde(default)]
    pub default_policy: DuplicatePolicy,
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            default_policy: DuplicatePolicy::default(),
            max_rows: default_max_rows(),
        }
    }
}

fn default_max_rows() -> usize {
    5000
}

/// Spreadsheet mirror configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MirrorConfig {
    /// Where the JSON snapshot is written. Mirroring is disabled when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Sanitized config for API responses (filesystem paths hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: SanitizedDatabaseConfig,
    pub workflow: WorkflowConfig,
    pub upload: UploadConfig,
    pub mirror: SanitizedMirrorConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDatabaseConfig {
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedMirrorConfig {
    pub enabled: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: SanitizedDatabaseConfig {
                busy_timeout_ms: config.database.busy_timeout_ms,
            },
            workflow: config.workflow.clone(),
            upload: config.upload.clone(),
            mirror: SanitizedMirrorConfig {
                enabled: config.mirror.path.is_some(),
            },
        }
    }
}
