//! The monitoring loop: Idle -> Sampling -> Drained.
//!
//! Single-threaded and synchronous. Each tick runs sampler, classifier, and
//! advisor in that order and appends one record; the inter-tick suspension
//! subtracts whatever the tick itself cost, so the sampler's blocking CPU
//! window is not doubled on top of the interval.

use crate::advisor::advise;
use crate::classify::Classifier;
use crate::history::{HistoryRecord, HistoryStore};
use crate::sampler::{SampleError, Sampler};
use crate::types::Snapshot;
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("sample interval must be non-zero")]
    InvalidInterval,
    #[error("monitoring loop already ran; construct a new one for a fresh run")]
    AlreadyDrained,
    /// The counter subsystem went away mid-run. The partial history up to
    /// the failing tick remains readable.
    #[error("monitoring aborted: {0}")]
    Fatal(#[source] SampleError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Sampling,
    Drained,
}

/// One monitoring run over a sampler. Not restartable: once drained, a new
/// `Monitor` must be constructed.
pub struct Monitor<S: Sampler> {
    sampler: S,
    classifier: Classifier,
    history: HistoryStore,
    stop: Arc<AtomicBool>,
    state: LoopState,
}

impl<S: Sampler> Monitor<S> {
    pub fn new(sampler: S, classifier: Classifier) -> Self {
        Self::with_stop(sampler, classifier, Arc::new(AtomicBool::new(false)))
    }

    /// Like [`new`](Self::new), but the caller supplies the stop flag. Useful
    /// when the signal source exists before the loop does.
    pub fn with_stop(sampler: S, classifier: Classifier, stop: Arc<AtomicBool>) -> Self {
        Self {
            sampler,
            classifier,
            history: HistoryStore::new(),
            stop,
            state: LoopState::Idle,
        }
    }

    /// Flag an external caller can set to request an orderly stop. Checked
    /// at the top of each tick.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn into_history(self) -> HistoryStore {
        self.history
    }

    /// Run for `total` wall-clock time, one tick every `interval`.
    ///
    /// On a fatal counter-subsystem error the loop drains early and returns
    /// the error; records collected before the failure stay in the store.
    pub fn run(&mut self, total: Duration, interval: Duration) -> Result<(), MonitorError> {
        if self.state != LoopState::Idle {
            return Err(MonitorError::AlreadyDrained);
        }
        if interval.is_zero() {
            return Err(MonitorError::InvalidInterval);
        }

        self.state = LoopState::Sampling;
        self.history.clear();
        let start = Instant::now();
        info!(
            "[monitor] starting run: duration={:?} interval={:?}",
            total, interval
        );

        while start.elapsed() < total {
            if self.stop.load(Ordering::Acquire) {
                info!("[monitor] stop signal received, draining");
                break;
            }

            let tick_start = Instant::now();
            match self.tick() {
                Ok(record) => {
                    info!(
                        "[monitor] [{}] cpu={}% mem={}% disk={}% bottleneck={}",
                        record.snapshot.timestamp_str(),
                        record.snapshot.cpu_percent,
                        record.snapshot.memory_percent,
                        record.snapshot.disk_percent,
                        if record.alerts.bottleneck_detected() { "yes" } else { "no" }
                    );
                    self.history.append(record);
                }
                Err(err @ SampleError::Unavailable(_)) => {
                    error!("[monitor] counter subsystem failure, aborting run: {err}");
                    self.state = LoopState::Drained;
                    return Err(MonitorError::Fatal(err));
                }
                Err(err) => {
                    warn!("[monitor] tick skipped: {err}");
                }
            }

            // The tick already spent time inside the sampler's measurement
            // window; only suspend for the remainder of the interval.
            if let Some(rest) = interval.checked_sub(tick_start.elapsed()) {
                std::thread::sleep(rest);
            }
        }

        self.state = LoopState::Drained;
        info!("[monitor] run complete: {} records", self.history.len());
        Ok(())
    }

    fn tick(&mut self) -> Result<HistoryRecord, SampleError> {
        let snapshot = self.sampler.sample()?;
        let processes = self.sampler.processes()?;
        let alerts = self.classifier.classify(&snapshot, &processes);
        let suggestions = advise(&alerts);
        Ok(HistoryRecord {
            snapshot,
            alerts,
            suggestions,
        })
    }
}

/// On-demand classify-and-advise, independent of any running loop.
pub fn spot_check<S: Sampler>(
    sampler: &mut S,
    classifier: &Classifier,
) -> Result<(Snapshot, crate::classify::AlertSet, Vec<String>), SampleError> {
    let snapshot = sampler.sample()?;
    let processes = sampler.processes()?;
    let alerts = classifier.classify(&snapshot, &processes);
    let suggestions = advise(&alerts);
    Ok((snapshot, alerts, suggestions))
}
