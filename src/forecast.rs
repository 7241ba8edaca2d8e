//! Short-term resource trend projection.
//!
//! One ordinary-least-squares line per metric over the history indices
//! 1..=N, evaluated at forecast indices 1..=steps with bounded uniform noise
//! added per point. The forecast deliberately re-bases the regression's
//! independent variable at 1 for the future points instead of continuing at
//! N+1; that is the defined model, see DESIGN.md before "fixing" it.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Noise half-widths as fractions of each metric's standard deviation.
/// Memory is assumed more stable than CPU.
const CPU_NOISE_FACTOR: f64 = 0.5;
const MEM_NOISE_FACTOR: f64 = 0.3;

#[derive(Debug, Error, PartialEq)]
pub enum ForecastError {
    #[error("invalid forecast parameters: {0}")]
    InvalidParams(String),
    #[error("history window is empty")]
    EmptyHistory,
    #[error("history data is missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("history row {0} is malformed: {1}")]
    BadRow(usize, String),
    #[error("failed to read history data: {0}")]
    Io(String),
}

/// One labeled point of past usage, live-sampled or externally loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub label: String,
    pub cpu: f64,
    pub mem: f64,
}

/// One predicted point, clamped to [0, 100] and rounded to two decimals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub label: String,
    pub cpu: f64,
    pub mem: f64,
}

/// Least-squares line fit over indices 1..=n. A single observation
/// degenerates to a flat line through it.
#[derive(Debug, Clone, Copy)]
struct TrendLine {
    slope: f64,
    intercept: f64,
    std_dev: f64,
}

impl TrendLine {
    fn fit(values: &[f64]) -> Self {
        let n = values.len() as f64;
        let mean_x = (n + 1.0) / 2.0;
        let mean_y = values.iter().sum::<f64>() / n;

        let mut sxy = 0.0;
        let mut sxx = 0.0;
        for (i, &y) in values.iter().enumerate() {
            let x = (i + 1) as f64;
            sxy += (x - mean_x) * (y - mean_y);
            sxx += (x - mean_x) * (x - mean_x);
        }
        let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };
        let intercept = mean_y - slope * mean_x;

        // Population standard deviation (ddof = 0).
        let variance = values.iter().map(|&y| (y - mean_y).powi(2)).sum::<f64>() / n;

        Self {
            slope,
            intercept,
            std_dev: variance.sqrt(),
        }
    }

    fn at(&self, index: f64) -> f64 {
        self.intercept + self.slope * index
    }
}

/// Project CPU and memory usage `horizon_minutes` into the future at
/// `interval_minutes` spacing.
///
/// A horizon shorter than one interval yields an empty forecast. A
/// single-point history yields a constant, noise-free forecast. The noise
/// source is injected so callers can seed it; production paths use
/// [`forecast_live`].
pub fn forecast<R: Rng>(
    history: &[HistoryPoint],
    horizon_minutes: u32,
    interval_minutes: u32,
    rng: &mut R,
) -> Result<Vec<ForecastPoint>, ForecastError> {
    if interval_minutes == 0 {
        return Err(ForecastError::InvalidParams(
            "interval must be a positive number of minutes".to_string(),
        ));
    }
    if horizon_minutes == 0 {
        return Err(ForecastError::InvalidParams(
            "horizon must be a positive number of minutes".to_string(),
        ));
    }
    if history.is_empty() {
        return Err(ForecastError::EmptyHistory);
    }

    let cpu_series: Vec<f64> = history.iter().map(|p| p.cpu).collect();
    let mem_series: Vec<f64> = history.iter().map(|p| p.mem).collect();
    let cpu_line = TrendLine::fit(&cpu_series);
    let mem_line = TrendLine::fit(&mem_series);

    let steps = horizon_minutes / interval_minutes;
    let mut points = Vec::with_capacity(steps as usize);
    for i in 1..=steps {
        let index = i as f64;
        let cpu_noise = cpu_line.std_dev * rng.gen_range(-CPU_NOISE_FACTOR..=CPU_NOISE_FACTOR);
        let mem_noise = mem_line.std_dev * rng.gen_range(-MEM_NOISE_FACTOR..=MEM_NOISE_FACTOR);
        points.push(ForecastPoint {
            label: format!("{} Min", i * interval_minutes),
            cpu: round2((cpu_line.at(index) + cpu_noise).clamp(0.0, 100.0)),
            mem: round2((mem_line.at(index) + mem_noise).clamp(0.0, 100.0)),
        });
    }
    Ok(points)
}

/// [`forecast`] with the thread-local RNG, for production callers.
pub fn forecast_live(
    history: &[HistoryPoint],
    horizon_minutes: u32,
    interval_minutes: u32,
) -> Result<Vec<ForecastPoint>, ForecastError> {
    forecast(history, horizon_minutes, interval_minutes, &mut rand::thread_rng())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
