use serde::{Deserialize, Serialize};

/// One timestamped reading of host-wide resource usage.
///
/// Percentages are clamped to [0, 100] at capture time. Network counters are
/// cumulative totals since boot, in megabytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: i64,
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub disk_percent: f32,
    pub net_sent_mb: f64,
    pub net_recv_mb: f64,
}

impl Snapshot {
    /// Timestamp rendered as `YYYY-MM-DD HH:MM:SS` (UTC).
    pub fn timestamp_str(&self) -> String {
        chrono::DateTime::from_timestamp(self.timestamp, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Scheduler state of an observed process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    Running,
    Sleeping,
    /// Uninterruptible sleep, typically blocked on disk I/O ("D" state).
    DiskSleep,
    Stopped,
    Zombie,
    Other(String),
}

/// Per-process observation taken alongside a [`Snapshot`].
///
/// Transient: only the alerts derived from it survive the tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessObservation {
    pub pid: u32,
    pub name: String,
    pub state: ProcessState,
    /// CPU share in percent, clamped to [0, 100].
    pub cpu_share: f32,
    /// Core ids the process is allowed to run on. Empty when unreadable.
    pub affinity: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_formats_as_utc() {
        let snap = Snapshot {
            timestamp: 1732242135,
            cpu_percent: 0.0,
            memory_percent: 0.0,
            disk_percent: 0.0,
            net_sent_mb: 0.0,
            net_recv_mb: 0.0,
        };
        assert_eq!(snap.timestamp_str(), "2024-11-22 02:22:15");
    }
}
