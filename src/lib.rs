pub mod advisor;
pub mod classify;
pub mod config;
pub mod export;
pub mod forecast;
pub mod history;
pub mod monitor;
pub mod sampler;
pub mod types;

pub use classify::{Alert, AlertCategory, AlertSet, Classifier};
pub use config::{Config, MonitorConfig, OutputConfig, Thresholds};
pub use forecast::{forecast, forecast_live, ForecastError, ForecastPoint, HistoryPoint};
pub use history::{HistoryRecord, HistoryStore};
pub use monitor::{LoopState, Monitor, MonitorError};
pub use sampler::{HostSampler, SampleError, Sampler};
pub use types::{ProcessObservation, ProcessState, Snapshot};
