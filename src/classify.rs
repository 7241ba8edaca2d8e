//! Threshold classification of snapshots and process observations.
//!
//! Pure functions: one snapshot plus one process table in, one [`AlertSet`]
//! out. Deadlock and starvation detection are single-tick signals; a process
//! genuinely blocked for one tick may be flagged spuriously. That is a known
//! limitation of the sampling model, not something this module tries to
//! smooth over with multi-tick confirmation.

use crate::config::Thresholds;
use crate::types::{ProcessObservation, ProcessState, Snapshot};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    Bottleneck,
    Deadlock,
    Starvation,
    Affinity,
}

/// One classified finding. `subject` names the offending metric or process;
/// `detail` is a complete human-readable description. Decorative rendering
/// (colors, icons) is the presentation layer's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub category: AlertCategory,
    pub subject: String,
    pub detail: String,
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.detail)
    }
}

/// Classified alerts for one tick, partitioned by category.
///
/// Categories are independent; within each one, alerts keep process
/// enumeration order. An empty category is an empty vec, never absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertSet {
    pub bottleneck: Vec<Alert>,
    pub deadlock: Vec<Alert>,
    pub starvation: Vec<Alert>,
    pub affinity: Vec<Alert>,
}

impl AlertSet {
    pub fn bottleneck_detected(&self) -> bool {
        !self.bottleneck.is_empty()
    }

    pub fn is_clear(&self) -> bool {
        self.bottleneck.is_empty()
            && self.deadlock.is_empty()
            && self.starvation.is_empty()
            && self.affinity.is_empty()
    }
}

pub struct Classifier {
    thresholds: Thresholds,
}

impl Classifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn classify(&self, snapshot: &Snapshot, processes: &[ProcessObservation]) -> AlertSet {
        let mut alerts = AlertSet::default();
        let t = &self.thresholds;

        // Strictly greater than: a metric sitting exactly on its threshold
        // is not a bottleneck.
        if snapshot.cpu_percent > t.cpu_percent {
            alerts.bottleneck.push(Alert {
                category: AlertCategory::Bottleneck,
                subject: "cpu".to_string(),
                detail: format!("High CPU Usage: {}%", snapshot.cpu_percent),
            });
        }
        if snapshot.memory_percent > t.memory_percent {
            alerts.bottleneck.push(Alert {
                category: AlertCategory::Bottleneck,
                subject: "memory".to_string(),
                detail: format!("High Memory Usage: {}%", snapshot.memory_percent),
            });
        }
        if snapshot.disk_percent > t.disk_percent {
            alerts.bottleneck.push(Alert {
                category: AlertCategory::Bottleneck,
                subject: "disk".to_string(),
                detail: format!("High Disk Usage: {}%", snapshot.disk_percent),
            });
        }

        for proc in processes {
            if proc.state == ProcessState::DiskSleep {
                alerts.deadlock.push(Alert {
                    category: AlertCategory::Deadlock,
                    subject: proc.name.clone(),
                    detail: format!(
                        "Deadlock Detected: Process {} (PID {})",
                        proc.name, proc.pid
                    ),
                });
            }
            if proc.cpu_share < t.starvation_cpu_share {
                alerts.starvation.push(Alert {
                    category: AlertCategory::Starvation,
                    subject: proc.name.clone(),
                    detail: format!(
                        "Starvation Risk: Process {} (PID {})",
                        proc.name, proc.pid
                    ),
                });
            }
            if proc.affinity.len() == 1 {
                alerts.affinity.push(Alert {
                    category: AlertCategory::Affinity,
                    subject: proc.name.clone(),
                    detail: format!(
                        "CPU Affinity Issue: Process {} (PID {}) assigned to Core {}",
                        proc.name, proc.pid, proc.affinity[0]
                    ),
                });
            }
        }

        alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(cpu: f32, mem: f32, disk: f32) -> Snapshot {
        Snapshot {
            timestamp: 0,
            cpu_percent: cpu,
            memory_percent: mem,
            disk_percent: disk,
            net_sent_mb: 0.0,
            net_recv_mb: 0.0,
        }
    }

    fn process(pid: u32, name: &str, state: ProcessState, cpu: f32, affinity: &[usize]) -> ProcessObservation {
        ProcessObservation {
            pid,
            name: name.to_string(),
            state,
            cpu_share: cpu,
            affinity: affinity.to_vec(),
        }
    }

    fn classifier() -> Classifier {
        Classifier::new(Thresholds::default())
    }

    #[test]
    fn cpu_at_threshold_is_not_a_bottleneck() {
        let alerts = classifier().classify(&snapshot(85.0, 0.0, 0.0), &[]);
        assert!(alerts.bottleneck.is_empty());
        assert!(!alerts.bottleneck_detected());
    }

    #[test]
    fn cpu_just_above_threshold_is_one_bottleneck() {
        let alerts = classifier().classify(&snapshot(85.01, 0.0, 0.0), &[]);
        assert_eq!(alerts.bottleneck.len(), 1);
        assert_eq!(alerts.bottleneck[0].subject, "cpu");
        assert!(alerts.bottleneck_detected());
    }

    #[test]
    fn each_violated_metric_gets_its_own_alert() {
        let alerts = classifier().classify(&snapshot(90.0, 95.0, 99.0), &[]);
        assert_eq!(alerts.bottleneck.len(), 3);
        let subjects: Vec<&str> = alerts.bottleneck.iter().map(|a| a.subject.as_str()).collect();
        assert_eq!(subjects, ["cpu", "memory", "disk"]);
    }

    #[test]
    fn disk_sleep_processes_are_deadlock_risks() {
        let procs = vec![
            process(10, "updatedb", ProcessState::DiskSleep, 5.0, &[0, 1]),
            process(11, "bash", ProcessState::Sleeping, 5.0, &[0, 1]),
        ];
        let alerts = classifier().classify(&snapshot(0.0, 0.0, 0.0), &procs);
        assert_eq!(alerts.deadlock.len(), 1);
        assert_eq!(alerts.deadlock[0].subject, "updatedb");
        assert!(alerts.deadlock[0].detail.contains("PID 10"));
    }

    #[test]
    fn low_cpu_share_is_starvation_risk() {
        let procs = vec![
            process(20, "idleproc", ProcessState::Sleeping, 0.3, &[0, 1]),
            process(21, "busyproc", ProcessState::Running, 45.0, &[0, 1]),
        ];
        let alerts = classifier().classify(&snapshot(0.0, 0.0, 0.0), &procs);
        assert_eq!(alerts.starvation.len(), 1);
        assert_eq!(alerts.starvation[0].subject, "idleproc");
    }

    #[test]
    fn single_core_affinity_is_flagged_with_core_id() {
        let procs = vec![
            process(30, "pinned", ProcessState::Running, 50.0, &[3]),
            process(31, "free", ProcessState::Running, 50.0, &[0, 1, 2, 3]),
        ];
        let alerts = classifier().classify(&snapshot(0.0, 0.0, 0.0), &procs);
        assert_eq!(alerts.affinity.len(), 1);
        assert!(alerts.affinity[0].detail.contains("Core 3"));
    }

    #[test]
    fn alerts_preserve_enumeration_order_within_category() {
        let procs = vec![
            process(1, "a", ProcessState::Sleeping, 0.0, &[0, 1]),
            process(2, "b", ProcessState::Sleeping, 0.0, &[0, 1]),
            process(3, "c", ProcessState::Sleeping, 0.0, &[0, 1]),
        ];
        let alerts = classifier().classify(&snapshot(0.0, 0.0, 0.0), &procs);
        let order: Vec<&str> = alerts.starvation.iter().map(|a| a.subject.as_str()).collect();
        assert_eq!(order, ["a", "b", "c"]);
    }

    #[test]
    fn one_process_can_appear_in_multiple_categories() {
        // No cross-category dedup: a pinned D-state idle process trips three rules.
        let procs = vec![process(40, "stuck", ProcessState::DiskSleep, 0.0, &[2])];
        let alerts = classifier().classify(&snapshot(0.0, 0.0, 0.0), &procs);
        assert_eq!(alerts.deadlock.len(), 1);
        assert_eq!(alerts.starvation.len(), 1);
        assert_eq!(alerts.affinity.len(), 1);
        assert!(!alerts.is_clear());
    }

    #[test]
    fn custom_thresholds_are_honored() {
        let classifier = Classifier::new(Thresholds {
            cpu_percent: 50.0,
            ..Thresholds::default()
        });
        let alerts = classifier.classify(&snapshot(60.0, 0.0, 0.0), &[]);
        assert_eq!(alerts.bottleneck.len(), 1);
    }
}
