//! # Freedrive Controller
//!
//! Host process for the freedrive controller. Loads a TOML configuration,
//! starts the hardware loop with the configured driver over a shared slot
//! table, walks the controller through its lifecycle and drives the update
//! from a paced RT cycle.
//!
//! On startup one ENABLE goal is submitted. `--cancel-after` and
//! `--disable-after` schedule a cancellation or a DISABLE goal. Every
//! terminal result is printed to stdout as one JSON line.

use clap::Parser;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use freedrive_common::config::{ConfigLoader, LogLevel, Validate};
use freedrive_common::consts::DEFAULT_CONFIG_PATH;
use freedrive_common::goal::{CancelResponse, FreedriveRequest, GoalReport, RejectReason};
use freedrive_common::slots::{SlotRegistry, SlotTable};
use freedrive_controller::cycle::{CycleRunner, rt_setup};
use freedrive_controller::goal::ActiveGoal;
use freedrive_controller::{ControllerConfig, FreedriveController, ReportChannel};
use freedrive_hal::{DriverRegistry, HalCore, HardwareLayout};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Freedrive Controller: RT freedrive mode switching over interface slots
#[derive(Parser, Debug)]
#[command(name = "freedrive_controller")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Real-time freedrive mode controller with async hardware handshake")]
struct Args {
    /// Path to the controller configuration TOML.
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Run with built-in defaults instead of a configuration file.
    #[arg(long, conflicts_with = "config")]
    defaults: bool,

    /// Print the default configuration as TOML and exit.
    #[arg(long)]
    print_default_config: bool,

    /// Stop after this many control cycles (default: run until Ctrl+C).
    #[arg(long)]
    cycles: Option<u64>,

    /// Cancel the ENABLE goal after this many milliseconds.
    #[arg(long, value_name = "MS")]
    cancel_after: Option<u64>,

    /// Submit a DISABLE goal after this many milliseconds.
    #[arg(long, value_name = "MS")]
    disable_after: Option<u64>,

    /// CPU core to pin the RT thread to (default: 1).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (default: 80).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    if args.print_default_config {
        match toml::to_string_pretty(&ControllerConfig::default()) {
            Ok(text) => print!("{text}"),
            Err(e) => {
                eprintln!("FATAL: {e}");
                process::exit(1);
            }
        }
        return;
    }

    let config = load_config(&args);
    let level = config
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, level);

    info!("Freedrive Controller v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = config.and_then(|c| run(&args, c));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Freedrive Controller shutdown complete");
}

fn load_config(args: &Args) -> Result<ControllerConfig, BoxError> {
    if args.defaults {
        let config = ControllerConfig::default();
        config.validate()?;
        return Ok(config);
    }
    ControllerConfig::load_validated(&args.config)
        .map_err(|e| format!("{}: {e}", args.config.display()).into())
}

fn setup_tracing(args: &Args, config_level: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        config_level.as_tracing_level()
    };
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_names(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .compact()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_names(true)
            .init();
    }
}

fn run(args: &Args, config: ControllerConfig) -> Result<(), BoxError> {
    info!(
        "Config OK: service='{}', cycle_time={}us, driver='{}'",
        config.shared.service_name, config.cycle_time_us, config.driver
    );

    // ── Slot table & hardware loop ──
    let registry = SlotRegistry::from_layout(&config.layout())?;
    let table = SlotTable::shared();
    let hw_layout = HardwareLayout::from_registry(&registry, &config.params.tf_prefix)?;
    let mut hal = HalCore::new(
        config.hal_config(),
        hw_layout,
        Arc::clone(&table),
        config.cycle_time_us,
    )?;
    hal.init(&DriverRegistry::with_builtin())?;
    let hal_running = hal.running_flag();
    let hal_thread = thread::Builder::new()
        .name("freedrive_hal".to_string())
        .spawn(move || {
            let result = hal.run();
            if let Err(e) = hal.shutdown() {
                warn!("HAL shutdown error: {e}");
            }
            result.map(|()| hal.stats())
        })?;

    // ── Controller lifecycle ──
    let (channel, reports) = ReportChannel::unbounded();
    let mut controller = FreedriveController::new(Arc::new(channel));
    controller.on_init()?;
    controller.on_configure(config.params.clone(), &registry)?;
    info!(
        "Claimed interfaces: command={:?}, state={:?}",
        controller.command_interface_configuration(),
        controller.state_interface_configuration()
    );
    let updater = controller.on_activate(&table)?;

    // ── RT cycle ──
    let mut runner = CycleRunner::new(updater, config.cycle_time());
    if let Some(cycles) = args.cycles {
        runner = runner.with_max_cycles(cycles);
    }
    let cycle_running = runner.running_flag();
    let (cpu_core, rt_priority) = (args.cpu_core, args.rt_priority);
    let rt_thread = thread::Builder::new()
        .name("freedrive_rt".to_string())
        .spawn(move || {
            rt_setup(cpu_core, rt_priority)?;
            info!("RT setup complete (cpu_core={cpu_core}, priority={rt_priority})");
            runner.run()?;
            Ok::<_, freedrive_controller::cycle::CycleError>(runner)
        })?;

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    // ── Client session ──
    let poll = config.cycle_time().max(Duration::from_millis(1)) * 10;
    let started = Instant::now();
    let goal = submit_when_ready(&controller, FreedriveRequest::ENABLE, &running, poll, || {
        rt_thread.is_finished()
    })?;

    let mut cancel_at = args.cancel_after.map(|ms| started + Duration::from_millis(ms));
    let mut disable_at = args.disable_after.map(|ms| started + Duration::from_millis(ms));

    while running.load(Ordering::SeqCst) && !rt_thread.is_finished() {
        let now = Instant::now();
        if cancel_at.is_some_and(|at| now >= at) {
            cancel_at = None;
            if let Some(goal) = &goal {
                match controller.cancel(goal.id()) {
                    CancelResponse::Accept => info!("{}: cancel sent", goal.id()),
                    CancelResponse::Reject => warn!("{}: cancel rejected", goal.id()),
                }
            }
        }
        if disable_at.is_some_and(|at| now >= at) {
            disable_at = None;
            if let Err(reason) = controller.submit(FreedriveRequest::DISABLE) {
                warn!("DISABLE goal rejected: {reason}");
            }
        }
        print_next_report(&reports, poll)?;
    }

    // ── Shutdown ──
    cycle_running.store(false, Ordering::SeqCst);
    match rt_thread.join() {
        Ok(Ok(runner)) => {
            let stats = runner.stats();
            let counters = runner.updater().counters();
            info!(
                "RT loop stopped after {} cycles: avg={}ns, max={}ns, overruns={}, deferred={}, goals completed={}",
                stats.cycle_count,
                stats.avg_cycle_ns(),
                stats.max_cycle_ns,
                stats.overruns,
                stats.deferred,
                counters.completed
            );
        }
        Ok(Err(e)) => error!("RT loop error: {e}"),
        Err(_) => error!("RT thread panicked"),
    }

    controller.on_deactivate()?;
    while let Ok(report) = reports.try_recv() {
        print_report(&report)?;
    }
    controller.on_shutdown()?;

    hal_running.store(false, Ordering::SeqCst);
    match hal_thread.join() {
        Ok(Ok(stats)) => info!(
            "HAL stopped after {} cycles (avg={}us, violations={})",
            stats.cycle_count,
            stats.avg_cycle_time_us(),
            stats.timing_violations
        ),
        Ok(Err(e)) => error!("HAL loop error: {e}"),
        Err(_) => error!("HAL thread panicked"),
    }
    Ok(())
}

/// Submit `request`, retrying while the hardware is still initializing.
fn submit_when_ready(
    controller: &FreedriveController,
    request: FreedriveRequest,
    running: &AtomicBool,
    poll: Duration,
    rt_done: impl Fn() -> bool,
) -> Result<Option<Arc<ActiveGoal>>, BoxError> {
    loop {
        if !running.load(Ordering::SeqCst) || rt_done() {
            return Ok(None);
        }
        match controller.submit(request) {
            Ok(goal) => return Ok(Some(goal)),
            Err(RejectReason::HardwareNotReady) => {
                debug!("Hardware not initialized yet, retrying in {poll:?}");
                thread::sleep(poll);
            }
            Err(reason) => return Err(reason.into()),
        }
    }
}

fn print_next_report(reports: &Receiver<GoalReport>, timeout: Duration) -> Result<(), BoxError> {
    match reports.recv_timeout(timeout) {
        Ok(report) => print_report(&report),
        Err(RecvTimeoutError::Timeout) => Ok(()),
        Err(RecvTimeoutError::Disconnected) => Err("report channel closed".into()),
    }
}

fn print_report(report: &GoalReport) -> Result<(), BoxError> {
    println!("{}", serde_json::to_string(report)?);
    Ok(())
}
