use std::path::PathBuf;
use std::time::Duration;

use ci_queue_log::LogFormat;
use clap::Parser;

use crate::config::QueuedConfig;

#[derive(Debug, Parser)]
#[command(name = "ci-queued", about = "Build queue and dispatcher demo harness")]
pub struct Args {
    /// Path to a TOML config file. CLI flags override values it sets.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of simulated agent nodes (plus one controller) to run
    /// executors on.
    #[arg(long)]
    pub agents: Option<usize>,

    /// Executor slots per node.
    #[arg(long)]
    pub executors_per_node: Option<usize>,

    /// How often the background ticker re-runs maintenance, in seconds.
    #[arg(long)]
    pub tick_period_secs: Option<u64>,

    /// Quiet period applied to demo tasks that don't set their own, in
    /// seconds.
    #[arg(long)]
    pub default_quiet_period_secs: Option<u64>,

    /// Where to persist pending task names across restarts.
    #[arg(long)]
    pub persistence_path: Option<PathBuf>,

    /// Log output format.
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// How long to run the demo before shutting down, in seconds. Runs
    /// forever if unset.
    #[arg(long)]
    pub run_for_secs: Option<u64>,
}

/// Fully-resolved settings after merging CLI flags over an optional config
/// file over hard-coded defaults, in that priority order (highest first).
#[derive(Debug, Clone)]
pub struct Settings {
    pub agents: usize,
    pub executors_per_node: usize,
    pub tick_period: Duration,
    pub default_quiet_period: Duration,
    pub persistence_path: PathBuf,
    pub log_format: LogFormat,
    pub run_for: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            agents: 3,
            executors_per_node: 2,
            tick_period: Duration::from_secs(5),
            default_quiet_period: Duration::from_secs(0),
            persistence_path: PathBuf::from("queue.txt"),
            log_format: LogFormat::Full,
            run_for: None,
        }
    }
}

impl Args {
    pub fn resolve(self) -> anyhow::Result<Settings> {
        let file = match &self.config {
            Some(path) => QueuedConfig::read(path)?,
            None => QueuedConfig::default(),
        };

        let defaults = Settings::default();
        Ok(Settings {
            agents: self.agents.or(file.agents).unwrap_or(defaults.agents),
            executors_per_node: self
                .executors_per_node
                .or(file.executors_per_node)
                .unwrap_or(defaults.executors_per_node),
            tick_period: self
                .tick_period_secs
                .or(file.tick_period_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.tick_period),
            default_quiet_period: self
                .default_quiet_period_secs
                .or(file.default_quiet_period_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_quiet_period),
            persistence_path: self
                .persistence_path
                .or(file.persistence_path)
                .unwrap_or(defaults.persistence_path),
            log_format: self.log_format.or(file.log_format).unwrap_or(defaults.log_format),
            run_for: self.run_for_secs.or(file.run_for_secs).map(Duration::from_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_args() -> Args {
        Args {
            config: None,
            agents: None,
            executors_per_node: None,
            tick_period_secs: None,
            default_quiet_period_secs: None,
            persistence_path: None,
            log_format: None,
            run_for_secs: None,
        }
    }

    #[test]
    fn resolve_falls_back_to_defaults_with_no_flags_or_config() {
        let settings = bare_args().resolve().unwrap();
        let defaults = Settings::default();
        assert_eq!(settings.agents, defaults.agents);
        assert_eq!(settings.tick_period, defaults.tick_period);
        assert_eq!(settings.run_for, None);
    }

    #[test]
    fn resolve_prefers_cli_flags_over_defaults() {
        let args = Args {
            agents: Some(9),
            run_for_secs: Some(30),
            ..bare_args()
        };
        let settings = args.resolve().unwrap();
        assert_eq!(settings.agents, 9);
        assert_eq!(settings.run_for, Some(Duration::from_secs(30)));
    }
}
