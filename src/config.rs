use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fixed classification thresholds.
///
/// Immutable for the lifetime of a run; handed to the [`Classifier`] at
/// construction so tests can override individual values.
///
/// [`Classifier`]: crate::classify::Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// CPU usage above this percentage is a bottleneck (strictly greater).
    pub cpu_percent: f32,
    /// Memory usage above this percentage is a bottleneck.
    pub memory_percent: f32,
    /// Disk usage above this percentage is a bottleneck.
    pub disk_percent: f32,
    /// Processes below this CPU share are flagged as starvation risks.
    pub starvation_cpu_share: f32,
    /// Reserved: how long a process may wait for CPU before being considered
    /// starved. Wait-queue timing is not sampled today, so the classifier
    /// falls back to the CPU-share cutoff above.
    pub starvation_wait_secs: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu_percent: 85.0,
            memory_percent: 90.0,
            disk_percent: 90.0,
            starvation_cpu_share: 1.0,
            starvation_wait_secs: 30,
        }
    }
}

/// Monitoring loop cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Total wall-clock duration of one monitoring run, in seconds.
    pub duration_secs: u64,
    /// Delay between the start of consecutive ticks, in seconds.
    pub interval_secs: u64,
    /// Blocking window used for the CPU-percent measurement, in milliseconds.
    /// This cost is part of each tick, not added on top of the interval.
    pub cpu_sample_window_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            duration_secs: 60,
            interval_secs: 2,
            cpu_sample_window_ms: 1000,
        }
    }
}

/// Where the persistence collaborator writes the run log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub csv_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: "perfmond_log.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub monitor: MonitorConfig,
    pub thresholds: Thresholds,
    pub output: OutputConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("reading config {}", path.as_ref().display()))?;
        let config = toml::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.as_ref().display()))?;
        Ok(config)
    }
}
