//! The control loop driver.
//!
//! One iteration, in order:
//!
//! 1. start the cycle clock
//! 2. update the input device and map it to a [`CommandVector`]
//! 3. pull a sensor snapshot, step the policy, push the actuation command
//! 4. let the session controller observe the policy's state and record
//! 5. sleep out the rest of the period (or count an overrun)
//!
//! A [`CycleError`] in step 3 or 4 abandons the rest of the body; step 5
//! always runs. Exit requests (SELECT held, or the shared stop flag) are
//! checked before each iteration. On exit the open session is flushed and
//! one damping command is sent.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use legged_errors::{CycleError, CycleResult};
use legged_input::InputDevice;
use legged_scheduler::{
    Clock, CycleClock, CycleOutcome, DriftSummary, Sleeper, SystemClock, ThreadSleeper,
};

use crate::command::{CommandMapper, CommandVector};
use crate::ports::{
    ActuationCommand, Actuator, ControlState, FsmState, Policy, PolicyOutput, SensorSnapshot,
    SensorSource,
};
use crate::session::{
    CycleRecord, LoggingSessionController, SessionSink, SessionStats, SessionTransition,
};

/// Loop parameters that are not owned by a collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSettings {
    /// Expected joint count of every snapshot and policy output
    pub num_joints: usize,
    /// Consecutive overruns before one warning is logged (0 disables)
    pub overrun_alarm_threshold: u64,
    /// Damping gain sent on shutdown
    pub damping_kd: f32,
    /// Stop after this many cycles
    pub max_cycles: Option<u64>,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            num_joints: 29,
            overrun_alarm_threshold: 50,
            damping_kd: 8.0,
            max_cycles: None,
        }
    }
}

/// What happened in one cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Command mapped from the input device
    pub command: CommandVector,
    /// State reported by the policy, if the body got that far
    pub fsm_state: Option<FsmState>,
    /// Session transition, if the body got that far
    pub transition: SessionTransition,
    /// Error that cut the body short, or a zeroed non-finite axis when the
    /// body completed
    pub error: Option<CycleError>,
    /// Timing of the cycle
    pub outcome: CycleOutcome,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// SELECT was held
    Select,
    /// The stop flag was raised (Ctrl-C)
    Interrupted,
    /// `max_cycles` was reached
    CycleLimit,
}

/// Totals for a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Why the loop stopped
    pub reason: ExitReason,
    /// Cycles executed
    pub cycles: u64,
    /// Cycles that missed their deadline
    pub overruns: u64,
    /// Cycles that reported a [`CycleError`]
    pub failed_cycles: u64,
    /// Wake-up lateness against the cycle deadlines
    pub drift: DriftSummary,
    /// Session controller counters
    pub sessions: SessionStats,
    /// File written by the shutdown flush
    pub final_save: Option<PathBuf>,
}

/// Fixed-cadence control loop over an input device, a robot, a policy and
/// a session sink.
pub struct ControlLoop<D, R, P, K, C = SystemClock, Z = ThreadSleeper>
where
    D: InputDevice,
    R: SensorSource + Actuator,
    P: Policy,
    K: SessionSink,
    C: Clock,
    Z: Sleeper,
{
    device: D,
    robot: R,
    policy: P,
    session: LoggingSessionController<K>,
    clock: CycleClock<C, Z>,
    settings: LoopSettings,
    stop: Arc<AtomicBool>,
    last_command: CommandVector,
    failed_cycles: u64,
}

impl<D, R, P, K, C, Z> ControlLoop<D, R, P, K, C, Z>
where
    D: InputDevice,
    R: SensorSource + Actuator,
    P: Policy,
    K: SessionSink,
    C: Clock,
    Z: Sleeper,
{
    /// Assemble a loop. The session controller is sized from `settings`.
    pub fn new(
        device: D,
        robot: R,
        policy: P,
        sink: K,
        clock: CycleClock<C, Z>,
        settings: LoopSettings,
    ) -> Self {
        Self {
            device,
            robot,
            policy,
            session: LoggingSessionController::new(settings.num_joints, sink),
            clock,
            settings,
            stop: Arc::new(AtomicBool::new(false)),
            last_command: CommandVector::default(),
            failed_cycles: 0,
        }
    }

    /// Share an externally owned stop flag (e.g. set from a Ctrl-C handler).
    #[must_use]
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// The stop flag checked before each iteration.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Run until SELECT, the stop flag, or the cycle limit, then shut down.
    pub fn run(&mut self) -> RunSummary {
        tracing::info!(
            period_ms = self.clock.period().as_millis(),
            num_joints = self.settings.num_joints,
            device = ?self.device.kind(),
            "control loop started"
        );

        let reason = loop {
            if self.stop.load(Ordering::Acquire) {
                break ExitReason::Interrupted;
            }
            if self.last_command.exit_requested {
                break ExitReason::Select;
            }
            if let Some(max) = self.settings.max_cycles
                && self.clock.cycle_count() >= max
            {
                break ExitReason::CycleLimit;
            }
            self.run_cycle();
        };

        tracing::info!(?reason, cycles = self.clock.cycle_count(), "control loop stopping");
        let final_save = self.shutdown();

        RunSummary {
            reason,
            cycles: self.clock.cycle_count(),
            overruns: self.clock.overrun_count(),
            failed_cycles: self.failed_cycles,
            drift: self.clock.drift().summary(),
            sessions: self.session.stats(),
            final_save,
        }
    }

    /// Execute exactly one cycle, including the cadence sleep.
    pub fn run_cycle(&mut self) -> CycleReport {
        self.clock.start_cycle();

        if let Err(e) = self.device.update() {
            tracing::warn!(error = %e, "input update failed, holding previous state");
        }
        let command = CommandMapper::map(&self.device);
        let axis_error = command.non_finite_axis.map(|index| {
            tracing::warn!(axis = index, "non-finite axis value replaced with 0.0");
            CycleError::NonFinite {
                field: "axis",
                index,
            }
        });
        if let Some(mode) = command.mode_cmd {
            tracing::debug!(%mode, "mode command");
        }
        self.last_command = command;

        let (fsm_state, transition, error) = match self.cycle_body(&command) {
            Ok((state, transition)) => (Some(state), transition, axis_error),
            Err(e) => {
                tracing::warn!(error = %e, severity = ?e.severity(), "cycle skipped");
                (None, SessionTransition::None, Some(e))
            }
        };
        if error.is_some() {
            self.failed_cycles = self.failed_cycles.saturating_add(1);
        }

        let outcome = self.clock.finish_cycle();
        let threshold = self.settings.overrun_alarm_threshold;
        if threshold > 0 && outcome.consecutive_overruns == threshold {
            tracing::warn!(
                consecutive = outcome.consecutive_overruns,
                total = self.clock.overrun_count(),
                period_ms = self.clock.period().as_millis(),
                "control loop is persistently missing its deadline"
            );
        }

        CycleReport {
            command,
            fsm_state,
            transition,
            error,
            outcome,
        }
    }

    fn cycle_body(&mut self, command: &CommandVector) -> CycleResult<(FsmState, SessionTransition)> {
        let n = self.settings.num_joints;

        let sensors = self.robot.snapshot()?;
        validate_sensors(&sensors, n)?;

        let output = self.policy.step(&ControlState {
            sensors: &sensors,
            command,
        })?;
        validate_output(&output, n)?;

        self.robot.send(&ActuationCommand::from_policy(&output))?;

        let record = CycleRecord {
            timestamp: wall_clock_seconds(),
            sensors: &sensors,
            output: &output,
            command,
        };
        let transition = self.session.observe(&output.fsm_state, &record);
        Ok((output.fsm_state, transition))
    }

    /// Flush the open session, then send one damping command.
    pub fn shutdown(&mut self) -> Option<PathBuf> {
        let saved = self.session.shutdown();

        let damping = ActuationCommand::damping(self.settings.num_joints, self.settings.damping_kd);
        match self.robot.send(&damping) {
            Ok(()) => tracing::info!(kd = self.settings.damping_kd, "damping command sent"),
            Err(e) => tracing::error!(error = %e, "failed to send damping command"),
        }
        saved
    }

    /// The input device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// The sensing and actuation collaborator.
    pub fn robot(&self) -> &R {
        &self.robot
    }

    /// The policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// The logging session controller.
    pub fn session(&self) -> &LoggingSessionController<K> {
        &self.session
    }

    /// The cycle clock, for overrun and drift counters.
    pub fn clock(&self) -> &CycleClock<C, Z> {
        &self.clock
    }

    /// Loop parameters.
    pub fn settings(&self) -> &LoopSettings {
        &self.settings
    }
}

fn validate_sensors(sensors: &SensorSnapshot, n: usize) -> CycleResult {
    CycleError::check_len("joint_q", &sensors.joint_q, n)?;
    CycleError::check_len("joint_dq", &sensors.joint_dq, n)?;
    CycleError::check_finite("joint_q", &sensors.joint_q)?;
    CycleError::check_finite("joint_dq", &sensors.joint_dq)?;
    CycleError::check_finite("gravity_orientation", &sensors.gravity_orientation)?;
    CycleError::check_finite("angular_velocity", &sensors.angular_velocity)
}

fn validate_output(output: &PolicyOutput, n: usize) -> CycleResult {
    CycleError::check_len("target_q", &output.target_q, n)?;
    CycleError::check_len("kp", &output.kp, n)?;
    CycleError::check_len("kd", &output.kd, n)?;
    CycleError::check_finite("target_q", &output.target_q)?;
    CycleError::check_finite("kp", &output.kp)?;
    CycleError::check_finite("kd", &output.kd)
}

#[expect(
    clippy::cast_precision_loss,
    reason = "epoch microseconds stay exact in an f64 until the year 2255"
)]
fn wall_clock_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
