//! End-to-end: monitoring run -> persistence -> external reload -> forecast.

use perfmond::sampler::{SampleError, Sampler};
use perfmond::{
    export, forecast, Classifier, HistoryPoint, Monitor, ProcessObservation, ProcessState,
    Snapshot, Thresholds,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

/// Scripted sampler describing a host drifting into a CPU bottleneck with
/// one process stuck in disk sleep.
struct ScriptedSampler {
    tick: usize,
    stop_after: usize,
    stop: Arc<AtomicBool>,
}

impl Sampler for ScriptedSampler {
    fn sample(&mut self) -> Result<Snapshot, SampleError> {
        self.tick += 1;
        if self.tick >= self.stop_after {
            self.stop.store(true, Ordering::Release);
        }
        Ok(Snapshot {
            timestamp: 1_700_000_000 + self.tick as i64 * 2,
            cpu_percent: 80.0 + self.tick as f32 * 3.0,
            memory_percent: 50.0,
            disk_percent: 40.0,
            net_sent_mb: self.tick as f64 * 1.5,
            net_recv_mb: self.tick as f64 * 4.0,
        })
    }

    fn processes(&mut self) -> Result<Vec<ProcessObservation>, SampleError> {
        Ok(vec![
            ProcessObservation {
                pid: 100,
                name: "stuck-io".to_string(),
                state: ProcessState::DiskSleep,
                cpu_share: 12.0,
                affinity: vec![0, 1, 2, 3],
            },
            ProcessObservation {
                pid: 200,
                name: "worker".to_string(),
                state: ProcessState::Running,
                cpu_share: 80.0,
                affinity: vec![0, 1, 2, 3],
            },
        ])
    }
}

#[test]
fn full_run_persists_and_feeds_the_forecaster() {
    let stop = Arc::new(AtomicBool::new(false));
    let sampler = ScriptedSampler {
        tick: 0,
        stop_after: 4,
        stop: Arc::clone(&stop),
    };
    let mut monitor = Monitor::with_stop(sampler, Classifier::new(Thresholds::default()), stop);

    monitor
        .run(Duration::from_secs(30), Duration::from_millis(2))
        .unwrap();
    let history = monitor.into_history();
    assert_eq!(history.len(), 4);

    // Ticks 1 (83%) and 2 (86%): the threshold is strict, so only tick 2 on
    // is a bottleneck.
    assert!(!history.all()[0].alerts.bottleneck_detected());
    assert!(history.all()[1].alerts.bottleneck_detected());
    // The D-state process is flagged every tick.
    assert_eq!(history.all()[0].alerts.deadlock.len(), 1);
    // Timestamps strictly increase with append order.
    let stamps: Vec<i64> = history.all().iter().map(|r| r.snapshot.timestamp).collect();
    assert!(stamps.windows(2).all(|w| w[0] < w[1]));

    // Persist and read the run log back.
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("run_log.csv");
    export::write_run_log(&log_path, history.all()).unwrap();
    let raw = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(raw.lines().count(), history.len() + 1);
    assert!(raw.lines().nth(2).unwrap().contains("Yes"));
    assert!(raw.contains("Deadlock Detected: Process stuck-io (PID 100)"));

    // Feed the sampled usage into the forecaster via the external-history
    // CSV shape.
    let history_path = dir.path().join("history.csv");
    let points: Vec<HistoryPoint> = history
        .all()
        .iter()
        .enumerate()
        .map(|(i, r)| HistoryPoint {
            label: format!("{} Min", (i + 1) * 2),
            cpu: r.snapshot.cpu_percent as f64,
            mem: r.snapshot.memory_percent as f64,
        })
        .collect();
    export::write_history_csv(&history_path, &points).unwrap();
    let reloaded = export::load_history_csv(&history_path).unwrap();
    assert_eq!(reloaded.len(), points.len());

    let mut rng = StdRng::seed_from_u64(3);
    let forecast_points = forecast(&reloaded, 30, 10, &mut rng).unwrap();
    assert_eq!(forecast_points.len(), 3);
    assert_eq!(forecast_points[0].label, "10 Min");
    assert_eq!(forecast_points[2].label, "30 Min");
    for p in &forecast_points {
        assert!((0.0..=100.0).contains(&p.cpu));
        assert!((0.0..=100.0).contains(&p.mem));
        // Memory history was flat at 50, so its forecast is exact.
        assert_eq!(p.mem, 50.0);
    }
}
