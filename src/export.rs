//! CSV persistence collaborator.
//!
//! The core hands a completed run here; this module owns the row format and
//! file mechanics. Also the loader for user-supplied history tables and the
//! synthetic-history generator used for demos and tests.

use crate::forecast::{ForecastError, HistoryPoint};
use crate::history::HistoryRecord;
use log::info;
use rand::Rng;
use std::io::Write;
use std::path::Path;

const RUN_LOG_COLUMNS: [&str; 11] = [
    "Timestamp",
    "CPU Usage (%)",
    "Memory Usage (%)",
    "Disk Usage (%)",
    "Network Sent (MB)",
    "Network Received (MB)",
    "Bottleneck Detected",
    "Deadlock Issues",
    "Starvation Issues",
    "CPU Affinity Issues",
    "Optimization Suggestions",
];

const TIME_COLUMN: &str = "Time (Unit)";
const CPU_COLUMN: &str = "CPU Usage";
const MEM_COLUMN: &str = "Memory Usage";

/// Write a completed run's history as the 11-column monitoring log.
pub fn write_run_log<P: AsRef<Path>>(path: P, records: &[HistoryRecord]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path.as_ref())?;
    writeln!(file, "{}", RUN_LOG_COLUMNS.join(","))?;

    for record in records {
        let alerts = &record.alerts;
        let row = [
            record.snapshot.timestamp_str(),
            record.snapshot.cpu_percent.to_string(),
            record.snapshot.memory_percent.to_string(),
            record.snapshot.disk_percent.to_string(),
            format!("{:.2}", record.snapshot.net_sent_mb),
            format!("{:.2}", record.snapshot.net_recv_mb),
            if alerts.bottleneck_detected() { "Yes" } else { "No" }.to_string(),
            join_or_none(alerts.deadlock.iter().map(|a| a.detail.as_str())),
            join_or_none(alerts.starvation.iter().map(|a| a.detail.as_str())),
            join_or_none(alerts.affinity.iter().map(|a| a.detail.as_str())),
            record.suggestions.join(" | "),
        ];
        let line: Vec<String> = row.iter().map(|cell| quote_csv(cell)).collect();
        writeln!(file, "{}", line.join(","))?;
    }
    info!(
        "[export] wrote {} records to {}",
        records.len(),
        path.as_ref().display()
    );
    Ok(())
}

fn join_or_none<'a, I: Iterator<Item = &'a str>>(mut items: I) -> String {
    let mut out = String::new();
    match items.next() {
        None => return "None".to_string(),
        Some(first) => out.push_str(first),
    }
    for item in items {
        out.push_str(" | ");
        out.push_str(item);
    }
    out
}

fn quote_csv(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Load an externally supplied history table.
///
/// Any tabular source works as long as the three required columns are
/// present; a missing column or an unparseable usage value is an
/// input-validation error, reported before any forecasting happens.
pub fn load_history_csv<P: AsRef<Path>>(path: P) -> Result<Vec<HistoryPoint>, ForecastError> {
    let raw = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ForecastError::Io(format!("{}: {e}", path.as_ref().display())))?;
    let mut lines = raw.lines();

    let header = lines.next().unwrap_or("");
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    let col = |name: &'static str| -> Result<usize, ForecastError> {
        columns
            .iter()
            .position(|&c| c == name)
            .ok_or(ForecastError::MissingColumn(name))
    };
    let time_idx = col(TIME_COLUMN)?;
    let cpu_idx = col(CPU_COLUMN)?;
    let mem_idx = col(MEM_COLUMN)?;

    let mut history = Vec::new();
    for (row, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        let cell = |idx: usize| -> Result<&str, ForecastError> {
            cells
                .get(idx)
                .copied()
                .ok_or_else(|| ForecastError::BadRow(row + 1, "too few columns".to_string()))
        };
        let cpu = cell(cpu_idx)?
            .parse::<f64>()
            .map_err(|e| ForecastError::BadRow(row + 1, format!("CPU Usage: {e}")))?;
        let mem = cell(mem_idx)?
            .parse::<f64>()
            .map_err(|e| ForecastError::BadRow(row + 1, format!("Memory Usage: {e}")))?;
        history.push(HistoryPoint {
            label: cell(time_idx)?.to_string(),
            cpu,
            mem,
        });
    }
    Ok(history)
}

/// Write a history table in the three-column shape `load_history_csv` reads.
pub fn write_history_csv<P: AsRef<Path>>(
    path: P,
    history: &[HistoryPoint],
) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path.as_ref())?;
    writeln!(file, "{TIME_COLUMN},{CPU_COLUMN},{MEM_COLUMN}")?;
    for point in history {
        writeln!(file, "{},{},{}", quote_csv(&point.label), point.cpu, point.mem)?;
    }
    Ok(())
}

/// Synthetic but plausible usage history: 25-50 rows at one consistent
/// random step (mostly 10-60 min), with a mild upward drift and bounded
/// fluctuation per metric.
pub fn generate_usage_data<R: Rng>(rng: &mut R) -> Vec<HistoryPoint> {
    let rows = rng.gen_range(25..=50usize);
    let step: u32 = if rng.gen::<f64>() < 0.9 {
        rng.gen_range(10..=60)
    } else {
        rng.gen_range(61..=180)
    };
    let base_cpu = rng.gen_range(15.0..30.0);
    let base_mem = rng.gen_range(20.0..40.0);

    let mut history = Vec::with_capacity(rows);
    let mut minutes = 0u32;
    for i in 0..rows {
        minutes += step;
        let cpu_trend = base_cpu + i as f64 * rng.gen_range(0.0..0.3);
        let cpu = round1(cpu_trend + rng.gen_range(-3.0..3.0)).clamp(10.0, 60.0);
        let mem_trend = base_mem + i as f64 * rng.gen_range(0.0..0.2);
        let mem = round1(mem_trend + rng.gen_range(-2.0..2.0)).clamp(15.0, 65.0);
        history.push(HistoryPoint {
            label: format!("{minutes} Min"),
            cpu,
            mem,
        });
    }
    history
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
