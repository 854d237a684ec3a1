//! sysinfod - telemetry device host.
//!
//! Builds the standard cpu, memory and disk jobs over /proc, then reads
//! snapshots from the device in fixed-size chunks and prints each one as a
//! line of JSON on stdout.

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(target_os = "linux")]
use sysinfo_core::collector::RealFs;
#[cfg(not(target_os = "linux"))]
use sysinfo_core::collector::mock::MockFs;
use sysinfo_core::collector::{FileSystem, SystemProbe};
use sysinfo_core::jobs::standard_jobs;
use sysinfo_core::{Device, DeviceError, JobKind, ReadOutcome, SharedTelemetryState};

/// Telemetry device host.
#[derive(Parser)]
#[command(name = "sysinfod", about = "Serves system telemetry snapshots as JSON", version)]
struct Args {
    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    proc_path: String,

    /// Job to read: cpu, memory or disk.
    #[arg(short, long, default_value = "cpu")]
    job: JobKind,

    /// Bytes requested per read call.
    #[arg(long, default_value = "64", value_parser = parse_chunk_size)]
    chunk_size: usize,

    /// Seconds between snapshots.
    #[arg(short, long, default_value = "1")]
    interval: u64,

    /// Number of snapshots to take. 0 runs until interrupted.
    #[arg(short, long, default_value = "1")]
    count: u64,

    /// Print the status report after the last snapshot.
    #[arg(long)]
    status: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

fn parse_chunk_size(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(0) => Err("chunk size must be greater than zero".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("invalid chunk size '{}': {}", s, e)),
    }
}

/// Initializes the tracing subscriber. Logs go to stderr so stdout carries
/// only snapshots.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["sysinfod", "sysinfo_core"] {
        match format!("{}={}", target, level).parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("invalid log directive for {}: {}", target, e),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Runs one full read cycle and writes the snapshot to `out`.
fn dump_snapshot(device: &Device, chunk_size: usize, out: &mut impl Write) -> io::Result<u64> {
    let mut handle = device.open()?;
    let mut chunk = vec![0u8; chunk_size];
    let mut offset = 0u64;
    let mut reads = 0u32;

    while let ReadOutcome::Data(n) = handle.read_at(chunk.as_mut_slice(), &mut offset)? {
        out.write_all(&chunk[..n])?;
        reads += 1;
    }
    writeln!(out)?;
    out.flush()?;
    handle.close();

    debug!(bytes = offset, reads, "snapshot drained");
    Ok(offset)
}

fn dump_status(device: &Device, out: &mut impl Write) -> io::Result<u64> {
    let copied = io::copy(&mut device.status(), out)?;
    out.flush()?;
    Ok(copied)
}

/// Process exit status for a failed run: the errno of a device error, 1 otherwise.
fn exit_status(e: &io::Error) -> u8 {
    e.get_ref()
        .and_then(|inner| inner.downcast_ref::<DeviceError>())
        .and_then(|device_error| u8::try_from(device_error.errno().unsigned_abs()).ok())
        .unwrap_or(1)
}

fn run<F: FileSystem + Clone + 'static>(args: &Args, fs: F) -> io::Result<()> {
    let probe = SystemProbe::new(fs.clone(), &args.proc_path);
    if !probe.is_available() {
        warn!(
            "{} does not look like a proc filesystem, metrics will be unavailable",
            probe.proc_path().display()
        );
    }

    let jobs = standard_jobs(fs, &args.proc_path).map_err(DeviceError::from)?;
    let device = Device::new(jobs, Arc::new(SharedTelemetryState::new(args.job)));
    info!("serving jobs: {:?}", device.jobs().kinds().collect::<Vec<_>>());

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let interval = Duration::from_secs(args.interval);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut taken = 0u64;

    while running.load(Ordering::SeqCst) {
        dump_snapshot(&device, args.chunk_size, &mut out)?;
        taken += 1;
        if args.count != 0 && taken >= args.count {
            break;
        }

        // Sleep with periodic checks for shutdown signal
        let sleep_interval = Duration::from_millis(100);
        let mut remaining = interval;
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(sleep_interval);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }
    }

    if args.status {
        dump_status(&device, &mut out)?;
    }

    info!(
        read_count = device.read_count(),
        uptime_ns = device.uptime_since_load(),
        "Shutdown complete"
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    info!("sysinfod {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Config: job={}, chunk_size={}, interval={}s, count={}, proc={}",
        args.job, args.chunk_size, args.interval, args.count, args.proc_path
    );

    #[cfg(target_os = "linux")]
    let fs = RealFs::new();
    #[cfg(not(target_os = "linux"))]
    let fs = MockFs::typical_system();

    match run(&args, fs) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(exit_status(&e))
        }
    }
}
