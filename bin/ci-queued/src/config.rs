use std::path::{Path, PathBuf};

use ci_queue_log::LogFormat;
use serde::{Deserialize, Serialize};

/// On-disk config file, every field optional so it layers under CLI flags:
/// a flat struct of `Option<T>` fields read with `toml::from_str` and
/// merged by the caller.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct QueuedConfig {
    pub agents: Option<usize>,
    pub executors_per_node: Option<usize>,
    pub tick_period_secs: Option<u64>,
    pub default_quiet_period_secs: Option<u64>,
    pub persistence_path: Option<PathBuf>,
    pub log_format: Option<LogFormat>,
    pub run_for_secs: Option<u64>,
}

impl QueuedConfig {
    pub fn read(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&contents)?)
    }
}
