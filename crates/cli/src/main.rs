//! legged-run - drive the control harness from a gamepad or the keyboard
//!
//! Runs the fixed-cadence loop against the loopback robot and the hold-pose
//! state machine. Sessions are written to the configured log directory each
//! time the state machine returns to PASSIVE, and once more on exit.

#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::Parser;
use legged_errors::{ErrorCategory, HarnessError};
use legged_harness::{
    ControlLoop, CsvSessionSink, HarnessConfig, HoldPosePolicy, LoopbackRobot, RunSummary,
};
use legged_input::{InputDevice, open_gamepad};
use legged_scheduler::CycleClock;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "legged-run")]
#[command(about = "Run the legged-robot control harness")]
#[command(version)]
#[command(long_about = "
legged-run drives the control loop at a fixed period, reading operator
commands from a connected gamepad (or the keyboard when none is found) and
recording one telemetry session per active period of the state machine.

Hold SELECT (Esc on the keyboard) or press Ctrl-C to stop.
")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "LEGGED_CONFIG")]
    config: Option<PathBuf>,

    /// Use keyboard control even when a gamepad is connected
    #[arg(long)]
    keyboard: bool,

    /// Directory for session CSV files (overrides the config)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Stop after this many cycles
    #[arg(long, hide = true)]
    max_cycles: Option<u64>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match run(cli) {
        Ok(summary) => {
            output::print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            output::print_error(&e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn exit_code(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<HarnessError>().map(HarnessError::category) {
        Some(ErrorCategory::Config) => 2,
        Some(ErrorCategory::Device) => 3,
        Some(ErrorCategory::Cycle | ErrorCategory::Telemetry) | None => 1,
    }
}

fn load_config(cli: &Cli) -> Result<HarnessConfig> {
    let mut config = match &cli.config {
        Some(path) => HarnessConfig::load_from_path(path)
            .map_err(HarnessError::from)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => HarnessConfig::default(),
    };
    if let Some(dir) = &cli.log_dir {
        config.log_dir.clone_from(dir);
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<RunSummary> {
    let config = load_config(&cli)?;
    info!(
        control_dt = config.control_dt,
        num_joints = config.num_joints,
        log_dir = %config.log_dir.display(),
        "configuration loaded"
    );
    for joint in 0..config.num_joints {
        debug!(joint, name = %config.joint_label(joint), "joint");
    }

    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop);
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::Release))
        .context("installing Ctrl-C handler")?;

    let device = open_gamepad(cli.keyboard, Arc::clone(&stop))
        .map_err(HarnessError::from)
        .context("opening input device")?;
    info!(kind = ?device.kind(), buttons = device.button_count(), "input device ready");

    let pose = config
        .default_pose
        .clone()
        .unwrap_or_else(|| vec![0.0; config.num_joints]);
    let robot = LoopbackRobot::new(config.num_joints, config.period());
    let policy = HoldPosePolicy::new(pose, config.stand_kp, config.stand_kd, config.damping_kd);

    let mut settings = config.loop_settings();
    settings.max_cycles = cli.max_cycles;

    let mut control = ControlLoop::new(
        device,
        robot,
        policy,
        CsvSessionSink::new(&config.log_dir),
        CycleClock::system(config.period()),
        settings,
    )
    .with_stop_flag(stop);

    Ok(control.run())
}
