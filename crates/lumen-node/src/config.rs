//! TOML-based configuration for lumen nodes.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use lumen_core::{CostList, CostTable, FlowParams, MessageCode};

use crate::error::NodeError;

/// Top-level node configuration loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub flow: FlowSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("failed to read config file: {e}")))?;
        toml::from_str(&content)
            .map_err(|e| NodeError::Config(format!("failed to parse config: {e}")))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(format!("failed to parse config: {e}")))
    }
}

/// The `[flow]` section: parameters this node announces when serving.
#[derive(Debug, Deserialize)]
pub struct FlowSection {
    /// Buffer ceiling announced to each client; also the initial value.
    #[serde(default = "default_buffer_limit")]
    pub buffer_limit: u64,
    /// Guaranteed recharge rate, in buffer units per millisecond.
    #[serde(default = "default_min_recharge")]
    pub min_recharge: u64,
    /// Age after which in-flight requests with lost replies are dropped
    /// from the estimator's bookkeeping. 0 disables. Default: 60.
    #[serde(default = "default_pending_purge_secs")]
    pub pending_purge_secs: u64,
    /// Per-message cost entries announced in the handshake.
    #[serde(default)]
    pub costs: Vec<CostSection>,
}

/// A `[[flow.costs]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CostSection {
    pub code: u64,
    pub base: u64,
    #[serde(default)]
    pub per_item: u64,
}

fn default_buffer_limit() -> u64 {
    300_000_000
}

fn default_min_recharge() -> u64 {
    50_000
}

fn default_pending_purge_secs() -> u64 {
    60
}

impl Default for FlowSection {
    fn default() -> Self {
        Self {
            buffer_limit: default_buffer_limit(),
            min_recharge: default_min_recharge(),
            pending_purge_secs: default_pending_purge_secs(),
            costs: Vec::new(),
        }
    }
}

impl FlowSection {
    /// The announced flow parameters, validated.
    pub fn params(&self) -> Result<FlowParams, NodeError> {
        let params = FlowParams::new(self.buffer_limit, self.min_recharge);
        params
            .validate()
            .map_err(|e| NodeError::Config(e.to_string()))?;
        Ok(params)
    }

    /// The announced cost table.
    pub fn cost_table(&self) -> CostTable {
        let mut list = CostList::new();
        for entry in &self.costs {
            list.push(MessageCode::new(entry.code), entry.base, entry.per_item);
        }
        list.decode()
    }

    /// The pending-purge age, or `None` when purging is disabled.
    pub fn pending_purge(&self) -> Option<Duration> {
        (self.pending_purge_secs > 0).then(|| Duration::from_secs(self.pending_purge_secs))
    }
}

/// The `[logging]` section.
#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    /// Default log level when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON-formatted log lines.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
