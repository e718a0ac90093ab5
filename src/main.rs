use std::path::PathBuf;
use std::process::exit;
use std::thread;
use std::time::{Duration, Instant};

use accel_monitor::render::{self, RenderOptions};
use accel_monitor::{
    list_ports, logging, AcquisitionLoop, Axis, Config, Sample, SampleStore, SerialSource,
};
use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(
    name = "accel-monitor",
    about = "Read x,y,z accelerometer lines from a serial device and show them live"
)]
struct Args {
    /// Serial device path (e.g. /dev/ttyACM0, /dev/cu.usbmodem141202, COM3)
    port: Option<String>,
    /// TOML config file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Baud rate
    #[arg(long)]
    baud: Option<u32>,
    /// Acquisition and refresh period in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,
    /// Per-frame read timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Number of samples shown on the chart
    #[arg(short, long)]
    window: Option<usize>,
    /// Axes to chart, comma separated (x,y,z)
    #[arg(long, value_delimiter = ',')]
    axes: Option<Vec<Axis>>,
    /// Keep at most this many samples in memory
    #[arg(long)]
    retention: Option<usize>,
    /// Warn after this many consecutive ticks without a fresh frame
    #[arg(long)]
    stale_after: Option<u32>,
    /// Stop after this many seconds instead of running forever
    #[arg(long)]
    duration_secs: Option<u64>,
    /// Print available serial ports and exit
    #[arg(long)]
    list_ports: bool,
    /// Disable ANSI colours
    #[arg(long)]
    no_color: bool,
    /// Raise log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn resolve_config(&self) -> Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(port) = &self.port {
            cfg.port = Some(port.clone());
        }
        if let Some(baud) = self.baud {
            cfg.baud_rate = baud;
        }
        if let Some(ms) = self.interval_ms {
            cfg.tick_interval_ms = ms;
        }
        if let Some(ms) = self.timeout_ms {
            cfg.read_timeout_ms = ms;
        }
        if let Some(window) = self.window {
            cfg.window = window;
        }
        if let Some(axes) = &self.axes {
            cfg.axes = axes.clone();
        }
        if self.retention.is_some() {
            cfg.retention = self.retention;
        }
        if self.stale_after.is_some() {
            cfg.stale_after = self.stale_after;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(args.verbose);

    if args.list_ports {
        let ports = list_ports().context("Failed to enumerate serial ports")?;
        if ports.is_empty() {
            println!("No serial ports found");
        }
        for p in ports {
            println!("{}\t{}", p.name, p.kind);
        }
        return Ok(());
    }

    let cfg = args.resolve_config()?;
    let port = cfg
        .port
        .clone()
        .context("No serial port given (pass PORT or set `port` in the config file)")?;

    println!("========APP START ========");
    let source = SerialSource::open(&port, cfg.baud_rate)
        .with_context(|| format!("Failed to open serial port at {}", port))?
        .with_max_line(cfg.max_line);

    let (writer, store) = SampleStore::seeded(Sample::zero(Local::now()), cfg.retention)
        .context("Failed to seed the sample store")?;

    let handle = AcquisitionLoop::new(source, writer, cfg.read_timeout())
        .with_stale_after(cfg.stale_after)
        .spawn(cfg.tick_interval())
        .context("Failed to start acquisition thread")?;
    info!(
        "Acquiring from {} every {:?} (timeout {:?})",
        port,
        cfg.tick_interval(),
        cfg.read_timeout()
    );

    let opts = RenderOptions {
        color: !args.no_color,
    };
    let deadline = args
        .duration_secs
        .map(|s| Instant::now() + Duration::from_secs(s));

    while handle.is_running() {
        thread::sleep(cfg.tick_interval());

        let latest = store.latest();
        let window = store.recent_window(cfg.window);
        println!("{}", render::status_line(&latest));
        print!("{}", render::chart(&window, &cfg.axes, opts));
        print!("{}", render::gauges(&latest, opts));
        println!();

        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
    }

    // Close the device only after the in-flight read returned
    if let Some(acq) = handle.stop() {
        let stats = acq.stats();
        info!(
            "Stopped after {} ticks: {} fresh, {} timeouts, {} device errors, {} undecodable",
            stats.ticks, stats.fresh, stats.timeouts, stats.device_errors, stats.decode_errors
        );
        drop(acq.into_source());
    }
    println!("========APP STOP ========");
    Ok(())
}
