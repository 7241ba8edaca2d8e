//! Host metric acquisition via sysinfo, with per-process CPU affinity read
//! from procfs.
//!
//! CPU percentages only mean something when measured across a window, so
//! [`HostSampler::sample`] blocks the calling thread for the configured
//! window. The monitoring loop treats that cost as part of the tick.

use crate::forecast::HistoryPoint;
use crate::types::{ProcessObservation, ProcessState, Snapshot};
use log::debug;
use std::time::Duration;
use sysinfo::{Disks, Networks, ProcessStatus, ProcessesToUpdate, System, MINIMUM_CPU_UPDATE_INTERVAL};
use thiserror::Error;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Error)]
pub enum SampleError {
    /// The OS performance-counter interface itself is unusable. Fatal for
    /// the current monitoring run.
    #[error("performance counter subsystem unavailable: {0}")]
    Unavailable(String),
    /// The process table could not be read this tick. Recoverable; the loop
    /// skips the tick.
    #[error("process enumeration failed: {0}")]
    Enumeration(String),
}

/// Source of snapshots and process observations.
///
/// Both calls are synchronous and have no side effects beyond the OS read.
/// The trait exists so the monitoring loop can be driven by a scripted
/// sampler in tests.
pub trait Sampler {
    fn sample(&mut self) -> Result<Snapshot, SampleError>;
    fn processes(&mut self) -> Result<Vec<ProcessObservation>, SampleError>;
}

/// Live sampler backed by the host's performance counters.
pub struct HostSampler {
    system: System,
    disks: Disks,
    networks: Networks,
    cpu_window: Duration,
}

impl HostSampler {
    pub fn new(cpu_window: Duration) -> Self {
        Self {
            system: System::new(),
            disks: Disks::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
            cpu_window: cpu_window.max(MINIMUM_CPU_UPDATE_INTERVAL),
        }
    }

    /// The fixed blocking cost of one [`sample`](Sampler::sample) call.
    pub fn cpu_window(&self) -> Duration {
        self.cpu_window
    }

    fn disk_percent(&mut self) -> f32 {
        self.disks.refresh(true);
        // Prefer the root filesystem; fall back to the aggregate when the
        // mount table does not expose "/" (containers, some BSDs).
        let (total, avail) = self
            .disks
            .iter()
            .find(|d| d.mount_point() == std::path::Path::new("/"))
            .map(|d| (d.total_space(), d.available_space()))
            .unwrap_or_else(|| {
                self.disks
                    .iter()
                    .fold((0u64, 0u64), |(t, a), d| (t + d.total_space(), a + d.available_space()))
            });
        if total == 0 {
            return 0.0;
        }
        (total.saturating_sub(avail)) as f32 / total as f32 * 100.0
    }
}

impl Default for HostSampler {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Sampler for HostSampler {
    fn sample(&mut self) -> Result<Snapshot, SampleError> {
        // Two CPU refreshes bracketing the measurement window; the delta is
        // the usage percentage.
        self.system.refresh_cpu_usage();
        std::thread::sleep(self.cpu_window);
        self.system.refresh_cpu_usage();
        if self.system.cpus().is_empty() {
            return Err(SampleError::Unavailable("no CPUs reported".to_string()));
        }
        let cpu_percent = self.system.global_cpu_usage();

        self.system.refresh_memory();
        let total_memory = self.system.total_memory();
        if total_memory == 0 {
            return Err(SampleError::Unavailable(
                "memory counters report zero total memory".to_string(),
            ));
        }
        let memory_percent = self.system.used_memory() as f32 / total_memory as f32 * 100.0;

        let disk_percent = self.disk_percent();

        self.networks.refresh(true);
        let (sent, recv) = self
            .networks
            .iter()
            .fold((0u64, 0u64), |(s, r), (_, data)| {
                (s + data.total_transmitted(), r + data.total_received())
            });

        let snapshot = Snapshot {
            timestamp: chrono::Utc::now().timestamp(),
            cpu_percent: cpu_percent.clamp(0.0, 100.0),
            memory_percent: memory_percent.clamp(0.0, 100.0),
            disk_percent: disk_percent.clamp(0.0, 100.0),
            net_sent_mb: sent as f64 / BYTES_PER_MB,
            net_recv_mb: recv as f64 / BYTES_PER_MB,
        };
        debug!(
            "[sampler] cpu={:.1}% mem={:.1}% disk={:.1}%",
            snapshot.cpu_percent, snapshot.memory_percent, snapshot.disk_percent
        );
        Ok(snapshot)
    }

    fn processes(&mut self) -> Result<Vec<ProcessObservation>, SampleError> {
        self.system.refresh_processes(ProcessesToUpdate::All, true);
        let table = self.system.processes();
        if table.is_empty() {
            return Err(SampleError::Enumeration(
                "process table came back empty".to_string(),
            ));
        }

        let mut observations: Vec<ProcessObservation> = table
            .iter()
            .map(|(pid, process)| {
                let pid = pid.as_u32();
                ProcessObservation {
                    pid,
                    name: process.name().to_string_lossy().into_owned(),
                    state: map_status(process.status()),
                    cpu_share: process.cpu_usage().clamp(0.0, 100.0),
                    affinity: read_affinity(pid),
                }
            })
            .collect();
        // The process table is a hash map; pin enumeration order to pid so
        // downstream alert ordering is deterministic.
        observations.sort_by_key(|p| p.pid);
        Ok(observations)
    }
}

fn map_status(status: ProcessStatus) -> ProcessState {
    match status {
        ProcessStatus::Run => ProcessState::Running,
        ProcessStatus::Sleep | ProcessStatus::Idle => ProcessState::Sleeping,
        ProcessStatus::UninterruptibleDiskSleep => ProcessState::DiskSleep,
        ProcessStatus::Stop => ProcessState::Stopped,
        ProcessStatus::Zombie => ProcessState::Zombie,
        other => ProcessState::Other(other.to_string()),
    }
}

/// Core ids from `Cpus_allowed_list`. A process that vanished or denies
/// access yields an empty set rather than an error; single-process failures
/// never surface past the sampler.
fn read_affinity(pid: u32) -> Vec<usize> {
    let Ok(process) = procfs::process::Process::new(pid as i32) else {
        return Vec::new();
    };
    let Ok(status) = process.status() else {
        return Vec::new();
    };
    match status.cpus_allowed_list {
        Some(ranges) => ranges
            .iter()
            .flat_map(|&(start, end)| (start..=end).map(|c| c as usize))
            .collect(),
        None => Vec::new(),
    }
}

/// Sample a short live history for the forecaster, labeling each point with
/// a time value spread evenly across the host's uptime.
///
/// Mirrors the interactive analysis path: `intervals` quick samples, each
/// blocking for the sampler's CPU window.
pub fn collect_live_history<S: Sampler>(
    sampler: &mut S,
    intervals: usize,
) -> Result<Vec<HistoryPoint>, SampleError> {
    let uptime = System::uptime() as f64;
    let (time_points, unit) = scale_time_values(linspace(0.0, uptime, intervals));

    let mut history = Vec::with_capacity(intervals);
    for t in time_points {
        let snapshot = sampler.sample()?;
        history.push(HistoryPoint {
            label: format!("{:.2} {}", t, unit),
            cpu: snapshot.cpu_percent as f64,
            mem: snapshot.memory_percent as f64,
        });
    }
    Ok(history)
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => (0..n)
            .map(|i| start + (end - start) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

/// Rescale raw seconds into the largest unit whose max value is >= 1 minute,
/// stepping seconds -> minutes -> hours.
fn scale_time_values(mut values: Vec<f64>) -> (Vec<f64>, &'static str) {
    let mut unit = "Sec";
    let max = values.iter().cloned().fold(0.0f64, f64::max);
    if max >= 60.0 {
        values.iter_mut().for_each(|v| *v /= 60.0);
        unit = "Min";
    }
    let max = values.iter().cloned().fold(0.0f64, f64::max);
    if unit == "Min" && max >= 60.0 {
        values.iter_mut().for_each(|v| *v /= 60.0);
        unit = "Hr";
    }
    (values, unit)
}
