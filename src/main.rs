use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use perfmond::{
    export, forecast_live, monitor::spot_check, sampler::collect_live_history, Classifier, Config,
    HostSampler, Monitor,
};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(about = "Host performance monitor: sampling, bottleneck detection, trend forecasting")]
struct Args {
    /// Path to a TOML config file
    #[clap(long)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the monitoring loop and write the CSV run log
    Monitor {
        /// Total run duration in seconds (overrides config)
        #[clap(long)]
        duration_secs: Option<u64>,
        /// Tick interval in seconds (overrides config)
        #[clap(long)]
        interval_secs: Option<u64>,
        /// Run log path (overrides config)
        #[clap(long)]
        out: Option<PathBuf>,
    },
    /// Forecast future CPU and memory usage from past history
    Forecast {
        /// History CSV to forecast from; omitted = sample the host live
        #[clap(long)]
        history: Option<PathBuf>,
        /// Forecast horizon in minutes
        #[clap(long, default_value = "60")]
        horizon_min: u32,
        /// Spacing between forecast points in minutes
        #[clap(long, default_value = "5")]
        interval_min: u32,
        /// Number of live samples taken when no history file is given
        #[clap(long, default_value = "25")]
        live_samples: usize,
    },
    /// One-shot classification of the current system state
    Check,
    /// Generate a synthetic history CSV for the forecaster
    GenData {
        /// Output path
        #[clap(long, default_value = "test_data.csv")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match args.command.unwrap_or(Command::Monitor {
        duration_secs: None,
        interval_secs: None,
        out: None,
    }) {
        Command::Monitor {
            duration_secs,
            interval_secs,
            out,
        } => {
            run_monitor(&config, duration_secs, interval_secs, out).await
        }
        Command::Forecast {
            history,
            horizon_min,
            interval_min,
            live_samples,
        } => run_forecast(&config, history, horizon_min, interval_min, live_samples),
        Command::Check => run_check(&config),
        Command::GenData { out } => {
            let history = export::generate_usage_data(&mut rand::thread_rng());
            export::write_history_csv(&out, &history)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("Generated {} history rows at {}", history.len(), out.display());
            Ok(())
        }
    }
}

async fn run_monitor(
    config: &Config,
    duration_secs: Option<u64>,
    interval_secs: Option<u64>,
    out: Option<PathBuf>,
) -> Result<()> {
    let total = Duration::from_secs(duration_secs.unwrap_or(config.monitor.duration_secs));
    let interval = Duration::from_secs(interval_secs.unwrap_or(config.monitor.interval_secs));
    let out = out.unwrap_or_else(|| PathBuf::from(&config.output.csv_path));

    let sampler = HostSampler::new(Duration::from_millis(config.monitor.cpu_sample_window_ms));
    let mut monitor = Monitor::new(sampler, Classifier::new(config.thresholds.clone()));

    // Ctrl-c flips the stop flag; the loop drains with a partial history.
    let stop = monitor.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("[main] interrupt received, requesting stop");
            stop.store(true, Ordering::Release);
        }
    });

    // The loop is synchronous by design; keep it off the async runtime.
    let (monitor, run_result) = tokio::task::spawn_blocking(move || {
        let result = monitor.run(total, interval);
        (monitor, result)
    })
    .await
    .context("monitoring task panicked")?;

    // Persist whatever was collected, even after a fatal sampler error.
    let history = monitor.into_history();
    export::write_run_log(&out, history.all())
        .with_context(|| format!("writing run log {}", out.display()))?;
    println!("Monitoring complete. {} records saved to {}", history.len(), out.display());

    if let Err(err) = run_result {
        error!("[main] run ended early: {err}");
        return Err(err.into());
    }
    Ok(())
}

fn run_forecast(
    config: &Config,
    history_path: Option<PathBuf>,
    horizon_min: u32,
    interval_min: u32,
    live_samples: usize,
) -> Result<()> {
    let history = match history_path {
        Some(path) => {
            let history = export::load_history_csv(&path)?;
            println!("Loaded {} history rows from {}", history.len(), path.display());
            history
        }
        None => {
            println!("Sampling {live_samples} live data points...");
            let mut sampler =
                HostSampler::new(Duration::from_millis(config.monitor.cpu_sample_window_ms / 2));
            collect_live_history(&mut sampler, live_samples)?
        }
    };

    let points = forecast_live(&history, horizon_min, interval_min)?;
    println!("{:<6} {:<12} {:<14} {}", "Index", "Time", "Predicted CPU", "Predicted Memory");
    for (i, point) in points.iter().enumerate() {
        println!(
            "{:<6} {:<12} {:<14.2} {:.2}",
            i + 1,
            point.label,
            point.cpu,
            point.mem
        );
    }
    Ok(())
}

fn run_check(config: &Config) -> Result<()> {
    let mut sampler =
        HostSampler::new(Duration::from_millis(config.monitor.cpu_sample_window_ms));
    let classifier = Classifier::new(config.thresholds.clone());
    let (snapshot, alerts, suggestions) = spot_check(&mut sampler, &classifier)?;

    println!("[{}] CPU: {}% | Memory: {}% | Disk: {}%",
        snapshot.timestamp_str(),
        snapshot.cpu_percent,
        snapshot.memory_percent,
        snapshot.disk_percent
    );
    for alert in alerts
        .bottleneck
        .iter()
        .chain(&alerts.deadlock)
        .chain(&alerts.starvation)
        .chain(&alerts.affinity)
    {
        println!("{alert}");
    }
    println!("Suggested optimizations:");
    for suggestion in &suggestions {
        println!("  {suggestion}");
    }
    Ok(())
}
