use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::kernel::policy::RecoveryPolicy;

/// Env var consulted when no config path is given on the command line.
pub const CONFIG_ENV: &str = "FIELDLINK_CONFIG";

const MAX_POWER_CYCLE_SETTLE: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub device_id: String,
    pub topic_prefix: String,
    pub telemetry_interval_secs: u64,
    pub loop_interval_ms: u64,
    pub recovery: RecoveryPolicy,
    pub storage: StorageConfig,
    pub link: LinkConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            device_id: "fieldlink-dev".to_string(),
            topic_prefix: "sensor".to_string(),
            telemetry_interval_secs: 30,
            loop_interval_ms: 100,
            recovery: RecoveryPolicy::default(),
            storage: StorageConfig::default(),
            link: LinkConfig::default(),
        }
    }
}

/// Where each tier keeps its journal. A tier without a directory is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub primary_dir: Option<PathBuf>,
    pub secondary_dir: Option<PathBuf>,
    pub primary_file: String,
    pub secondary_file: String,
    pub volatile_capacity: usize,
    /// Upper bound on records republished per drain pass.
    pub drain_batch: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            primary_dir: Some(PathBuf::from("/mnt/sdcard")),
            secondary_dir: Some(PathBuf::from("/var/lib/fieldlink")),
            primary_file: "sd_queue.jsonl".to_string(),
            secondary_file: "lfs_queue.jsonl".to_string(),
            volatile_capacity: 10,
            drain_batch: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Endpoint whose answer counts as "attached".
    pub gateway_addr: String,
    pub reachability_addr: String,
    pub probe_timeout_ms: u64,
    pub power_cycle_settle_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            gateway_addr: "192.168.1.1:53".to_string(),
            reachability_addr: "google.com:80".to_string(),
            probe_timeout_ms: 5_000,
            power_cycle_settle_ms: 10_000,
        }
    }
}

impl LinkConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn power_cycle_settle(&self) -> Duration {
        Duration::from_millis(self.power_cycle_settle_ms).min(MAX_POWER_CYCLE_SETTLE)
    }
}

impl NodeConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        info!("config: loaded {}", path.display());
        Ok(config)
    }

    /// A missing file is not an error: the node runs on defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("config: no file given, using defaults");
            return Ok(Self::default());
        };
        match Self::load(path) {
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                warn!("config: {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_id.trim().is_empty() {
            return Err(invalid("device_id", "must not be empty"));
        }
        if self.topic_prefix.contains(['#', '+']) {
            return Err(invalid("topic_prefix", "must not contain wildcards"));
        }

        let r = &self.recovery;
        let nonzero = [
            ("telemetry_interval_secs", self.telemetry_interval_secs),
            ("loop_interval_ms", self.loop_interval_ms),
            ("recovery.link_retry_secs", r.link_retry_secs),
            ("recovery.reachability_retry_secs", r.reachability_retry_secs),
            ("recovery.session_retry_secs", r.session_retry_secs),
            ("recovery.reachability_recheck_secs", r.reachability_recheck_secs),
            ("recovery.health_log_secs", r.health_log_secs),
            ("recovery.publish_watchdog_secs", r.publish_watchdog_secs),
            (
                "recovery.link_failures_before_power_cycle",
                u64::from(r.link_failures_before_power_cycle),
            ),
            (
                "recovery.session_failures_before_escalation",
                u64::from(r.session_failures_before_escalation),
            ),
            (
                "recovery.session_failure_restart_budget",
                u64::from(r.session_failure_restart_budget),
            ),
            ("storage.volatile_capacity", self.storage.volatile_capacity as u64),
            ("storage.drain_batch", self.storage.drain_batch as u64),
            ("link.probe_timeout_ms", self.link.probe_timeout_ms),
        ];
        for (field, value) in nonzero {
            if value == 0 {
                return Err(invalid(field, "must be greater than zero"));
            }
        }

        // Publishes only happen on the telemetry cadence, so a slower cadence
        // than the watchdog restarts a healthy node every cycle.
        if self.telemetry_interval_secs >= r.publish_watchdog_secs {
            return Err(ConfigError::Invalid {
                field: "telemetry_interval_secs",
                reason: format!(
                    "{}s must be shorter than recovery.publish_watchdog_secs ({}s)",
                    self.telemetry_interval_secs, r.publish_watchdog_secs
                ),
            });
        }

        if self.storage.primary_file.is_empty() || self.storage.secondary_file.is_empty() {
            return Err(invalid("storage", "journal file names must not be empty"));
        }
        if self.storage.primary_dir.is_some() && self.storage.primary_dir == self.storage.secondary_dir {
            return Err(invalid("storage.secondary_dir", "must differ from primary_dir"));
        }
        Ok(())
    }

    pub fn telemetry_interval(&self) -> Duration {
        Duration::from_secs(self.telemetry_interval_secs)
    }

    pub fn loop_interval(&self) -> Duration {
        Duration::from_millis(self.loop_interval_ms)
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
