use anyhow::{Context, Result};
use clap::Parser;
use netwatch::*;
use std::path::PathBuf;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

/// Live network traffic monitor: per-minute packet and bandwidth report.
#[derive(Parser)]
#[command(name = "netwatch", version = version::VERSION, about)]
struct Cli {
    /// Interface to capture on (leave empty to list all).
    #[arg(short, long)]
    interface: Option<String>,

    /// Capture duration in seconds.
    #[arg(short, long)]
    duration: Option<u64>,

    /// Capture filter (e.g. 'tcp port 80').
    #[arg(short, long)]
    filter: Option<String>,

    /// Enable bandwidth monitoring (`-b` alone means true).
    #[arg(
        short = 'b',
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    bandwidth: Option<bool>,

    /// Network adapter for bandwidth monitoring (leave empty for auto-select).
    #[arg(short, long)]
    adapter: Option<String>,

    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,

    /// Logging filter (overrides RUST_LOG).
    #[arg(long)]
    log_level: Option<String>,
}

fn init_tracing(log_level: Option<&str>) -> Result<()> {
    let filter = match log_level {
        Some(level) => {
            EnvFilter::try_new(level).with_context(|| format!("invalid log level: {}", level))?
        }
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn apply_overrides(cli: &Cli, app_config: &mut config::AppConfig) -> Result<()> {
    if let Some(d) = cli.duration {
        app_config.capture.duration_secs = d;
    }
    if let Some(f) = &cli.filter {
        app_config.capture.filter = f.clone();
    }
    if let Some(b) = cli.bandwidth {
        app_config.bandwidth.enabled = b;
    }
    if let Some(a) = &cli.adapter {
        app_config.bandwidth.adapter = a.clone();
    }
    app_config.validate()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref())?;

    let mut app_config = config::AppConfig::load(cli.config.as_deref())?;
    apply_overrides(&cli, &mut app_config)?;

    match cli.interface.as_deref() {
        None => list(&app_config).await,
        Some(interface) => capture(interface, &app_config, cli.json).await?,
    }
    Ok(())
}

async fn list(app_config: &config::AppConfig) {
    let program = &app_config.capture.program;
    match source::list_interfaces(program).await {
        Ok(output) => {
            println!("Available network interfaces:");
            println!("{}", output);
        }
        Err(e) => {
            println!("Error listing interfaces: {}", e);
            println!("Make sure {} is installed and in your PATH", program);
        }
    }

    let backend = app_config.bandwidth.backend.resolve();
    match backend.open().and_then(|mut b| b.adapters()) {
        Ok(adapters) if !adapters.is_empty() => {
            println!("Bandwidth adapters ({}):", backend);
            for adapter in adapters {
                println!("  {}", adapter);
            }
        }
        Ok(_) => println!("No bandwidth adapters found ({})", backend),
        Err(e) => println!("Bandwidth adapters unavailable ({}): {}", backend, e),
    }

    println!("\nUsage: netwatch -i <interface> -d <seconds> -f '<filter>' -b true -a '<adapter>'");
    println!("Example: netwatch -i 1 -d 30 -f 'tcp port 443'");
}

async fn capture(interface: &str, app_config: &config::AppConfig, json: bool) -> Result<()> {
    tracing::info!(
        version = %version::full(),
        interface,
        duration_secs = app_config.capture.duration_secs,
        "starting {}",
        version::NAME
    );

    // stdout carries only the JSON document in --json mode.
    if !json {
        println!("Starting packet capture on interface {}...", interface);
        if let Some(filter) = app_config.filter() {
            println!("Filter: {}", filter);
        }
        println!("---");
    }

    let packets = Box::new(source::TsharkSource {
        program: app_config.capture.program.clone(),
        interface: interface.to_string(),
        filter: app_config.filter().map(str::to_string),
    });

    let counters = if app_config.bandwidth.enabled {
        match app_config.bandwidth.backend.open() {
            Ok(backend) => Some(backend),
            Err(e) => {
                tracing::warn!(error = %e, operation = "open_backend", "bandwidth monitoring unavailable");
                None
            }
        }
    } else {
        None
    };

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = interrupt.cancelled() => {}
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    tracing::info!("Received interrupt, finishing early");
                    interrupt.cancel();
                }
            }
        }
    });

    let report = monitor::run(
        monitor::MonitorDeps {
            packets,
            counters,
            cancel: cancel.clone(),
        },
        monitor::MonitorConfig {
            duration: Duration::from_secs(app_config.capture.duration_secs),
            bucket_width: state::BUCKET_WIDTH,
            rotation_tick: Duration::from_millis(app_config.buckets.rotation_tick_ms),
            echo: !json,
            bandwidth: bandwidth_worker::BandwidthWorkerConfig {
                adapter: app_config.adapter().map(str::to_string),
                poll_interval: Duration::from_millis(app_config.bandwidth.poll_interval_ms),
                settle_delay: Duration::from_millis(app_config.bandwidth.settle_delay_ms),
            },
        },
    )
    .await;
    cancel.cancel();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }
    Ok(())
}
