//! Configuration for topokit components

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix (`TOPOKIT_TOPO__ROOT=/vt` etc.)
pub const ENV_PREFIX: &str = "TOPOKIT";

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Topology server and scripted backend settings
    pub topo: TopoConfig,

    /// Operation log view settings
    pub querylog: QueryLogConfig,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            topo: TopoConfig::default(),
            querylog: QueryLogConfig::default(),
            log_level: default_log_level(),
        }
    }
}

/// Topology configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopoConfig {
    /// Address of the global topology server
    pub server_address: String,

    /// Root path of the topology tree inside the global server
    pub root: String,

    /// Cells to pre-seed besides the global cell
    pub cells: Vec<String>,

    /// Capacity of each watch subscription channel
    pub watch_channel_capacity: usize,
}

impl Default for TopoConfig {
    fn default() -> Self {
        Self {
            server_address: String::new(),
            root: String::new(),
            cells: Vec::new(),
            watch_channel_capacity: 100,
        }
    }
}

/// Operation log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryLogConfig {
    /// Capacity of the completed-operation broadcast channel
    pub buffer_size: usize,

    /// Records rendered per request when no limit is given
    pub default_limit: usize,

    /// Seconds to wait for records when no timeout is given
    pub default_timeout_secs: u64,

    /// Operations at or above this many milliseconds render as "medium"
    pub medium_threshold_ms: u64,

    /// Operations at or above this many milliseconds render as "high"
    pub high_threshold_ms: u64,

    /// Longer query text is truncated before rendering
    pub max_sql_display_len: usize,
}

impl Default for QueryLogConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1024,
            default_limit: 300,
            default_timeout_secs: 10,
            medium_threshold_ms: 10,
            high_threshold_ms: 100,
            max_sql_display_len: 512,
        }
    }
}

impl QueryLogConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    pub fn medium_threshold(&self) -> Duration {
        Duration::from_millis(self.medium_threshold_ms)
    }

    pub fn high_threshold(&self) -> Duration {
        Duration::from_millis(self.high_threshold_ms)
    }
}

impl Config {
    /// Load configuration from an optional TOML file, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let cfg: Config = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings the components cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.topo.watch_channel_capacity == 0 {
            return Err(Error::InvalidConfig(
                "topo.watch_channel_capacity must be at least 1".into(),
            ));
        }
        if self.querylog.buffer_size == 0 {
            return Err(Error::InvalidConfig(
                "querylog.buffer_size must be at least 1".into(),
            ));
        }
        if self.querylog.medium_threshold_ms > self.querylog.high_threshold_ms {
            return Err(Error::InvalidConfig(format!(
                "querylog.medium_threshold_ms ({}) exceeds high_threshold_ms ({})",
                self.querylog.medium_threshold_ms, self.querylog.high_threshold_ms
            )));
        }
        if self.topo.cells.iter().any(|c| c.is_empty()) {
            return Err(Error::InvalidConfig("topo.cells contains an empty name".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.topo.watch_channel_capacity, 100);
        assert_eq!(cfg.querylog.medium_threshold(), Duration::from_millis(10));
        assert_eq!(cfg.querylog.high_threshold(), Duration::from_millis(100));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
log_level = "debug"

[topo]
root = "/vt/global"
cells = ["zone1", "zone2"]
watch_channel_capacity = 8

[querylog]
high_threshold_ms = 250
"#
        )
        .unwrap();

        let cfg = Config::load(Some(file.path())).unwrap();
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.topo.root, "/vt/global");
        assert_eq!(cfg.topo.cells, vec!["zone1", "zone2"]);
        assert_eq!(cfg.topo.watch_channel_capacity, 8);
        assert_eq!(cfg.querylog.high_threshold_ms, 250);
        assert_eq!(cfg.querylog.medium_threshold_ms, 10);
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let mut cfg = Config::default();
        cfg.querylog.medium_threshold_ms = 500;
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut cfg = Config::default();
        cfg.topo.watch_channel_capacity = 0;
        assert!(cfg.validate().is_err());
    }
}
