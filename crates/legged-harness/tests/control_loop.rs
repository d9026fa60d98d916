//! End-to-end runs of the control loop against the loopback collaborators.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use legged_errors::{CycleError, CycleResult, DeviceError};
use legged_harness::{
    ActuationCommand, Actuator, ControlLoop, CsvSessionSink, ExitReason, FsmStateId,
    HoldPosePolicy, LoopSettings, LoopbackRobot, MemorySessionSink, SensorSnapshot, SensorSource,
    SessionState, SessionTransition,
};
use legged_input::{DeviceKind, InputDevice, Key, KeyboardGamepad, ScriptedKeyPump};
use legged_scheduler::{CycleClock, ManualClock, ManualSleeper};
use legged_telemetry::{TelemetryStore, read_csv};

const JOINTS: usize = 3;
const PERIOD: Duration = Duration::from_millis(20);

type TestLoop<R, K> =
    ControlLoop<KeyboardGamepad<ScriptedKeyPump>, R, HoldPosePolicy, K, ManualClock, ManualSleeper>;

fn settings() -> LoopSettings {
    LoopSettings {
        num_joints: JOINTS,
        overrun_alarm_threshold: 3,
        damping_kd: 8.0,
        max_cycles: Some(100),
    }
}

fn policy() -> HoldPosePolicy {
    HoldPosePolicy::new(vec![0.2, -0.4, 0.6], 60.0, 1.5, 8.0)
}

fn build<R, K>(frames: Vec<Vec<Key>>, robot: R, sink: K, clock: &ManualClock) -> TestLoop<R, K>
where
    R: SensorSource + Actuator,
    K: legged_harness::SessionSink,
{
    ControlLoop::new(
        KeyboardGamepad::new(ScriptedKeyPump::new(frames)),
        robot,
        policy(),
        sink,
        CycleClock::new(PERIOD, clock.clone(), clock.sleeper()),
        settings(),
    )
}

/// R1 held, then A released: LOCO.
fn loco() -> Vec<Vec<Key>> {
    vec![vec![Key::char('e'), Key::char('j')], vec![Key::char('e')]]
}

/// L3 released: PASSIVE.
fn passive() -> Vec<Vec<Key>> {
    vec![vec![Key::char('f')], vec![]]
}

fn assert_damping(command: Option<&ActuationCommand>) {
    assert_eq!(command, Some(&ActuationCommand::damping(JOINTS, 8.0)));
}

#[test]
fn test_full_session_cycle_with_select_exit() {
    let mut frames = vec![vec![]];
    frames.extend(loco()); // cycle 3 opens session 1
    frames.extend([vec![], vec![]]);
    frames.extend(passive()); // cycle 7 closes session 1
    frames.extend(loco()); // cycle 9 opens session 2
    frames.push(vec![Key::Esc]);

    let clock = ManualClock::new();
    let robot = LoopbackRobot::new(JOINTS, PERIOD);
    let mut control = build(frames, robot, MemorySessionSink::default(), &clock);

    let summary = control.run();

    assert_eq!(summary.reason, ExitReason::Select);
    assert_eq!(summary.cycles, 10);
    assert_eq!(summary.overruns, 0);
    assert_eq!(summary.failed_cycles, 0);
    assert_eq!(summary.sessions.opened, 2);
    assert_eq!(summary.sessions.saved, 2);
    assert_eq!(
        summary.final_save.as_deref(),
        Some(std::path::Path::new("memory://session/2"))
    );

    let rows: Vec<usize> = control
        .session()
        .sink()
        .sessions
        .iter()
        .map(TelemetryStore::row_count)
        .collect();
    assert_eq!(rows, vec![4, 2]);
    assert_eq!(control.session().state(), SessionState::Idle);

    assert_damping(control.robot().last_command());
    assert_eq!(control.clock().sleeper().sleeps(), vec![PERIOD; 10].as_slice());
}

#[test]
fn test_run_cycle_reports_transitions() {
    let mut frames = loco();
    frames.push(vec![]);
    let clock = ManualClock::new();
    let mut control = build(
        frames,
        LoopbackRobot::new(JOINTS, PERIOD),
        MemorySessionSink::default(),
        &clock,
    );

    let first = control.run_cycle();
    assert_eq!(first.transition, SessionTransition::None);
    assert_eq!(first.fsm_state.map(|s| s.id), Some(FsmStateId::Passive));

    let second = control.run_cycle();
    assert_eq!(second.transition, SessionTransition::Opened);
    assert_eq!(second.fsm_state.map(|s| s.id), Some(FsmStateId::Loco));
    assert_eq!(second.outcome.cycle, 2);
    assert!(second.error.is_none());

    // Holding a pose drives the loopback joints toward it.
    let _ = control.run_cycle();
    assert!(control.robot().joint_q().first().is_some_and(|q| *q > 0.0));
}

#[test]
fn test_stop_flag_checked_before_first_cycle() {
    let clock = ManualClock::new();
    let stop = Arc::new(AtomicBool::new(true));
    let mut control = build(
        vec![],
        LoopbackRobot::new(JOINTS, PERIOD),
        MemorySessionSink::default(),
        &clock,
    )
    .with_stop_flag(Arc::clone(&stop));

    let summary = control.run();
    assert_eq!(summary.reason, ExitReason::Interrupted);
    assert_eq!(summary.cycles, 0);
    assert_eq!(summary.final_save, None);
    assert_damping(control.robot().last_command());
    assert!(stop.load(Ordering::Acquire));
}

#[test]
fn test_interrupt_mid_session_flushes_once() {
    let clock = ManualClock::new();
    let mut control = build(
        loco(),
        LoopbackRobot::new(JOINTS, PERIOD),
        MemorySessionSink::default(),
        &clock,
    );
    let stop = control.stop_flag();

    for _ in 0..5 {
        let _ = control.run_cycle();
    }
    assert_eq!(control.session().state(), SessionState::Recording);

    stop.store(true, Ordering::Release);
    let summary = control.run();

    assert_eq!(summary.reason, ExitReason::Interrupted);
    assert_eq!(summary.sessions.saved, 1);
    assert_eq!(control.session().sink().sessions.len(), 1);
    assert!(control.shutdown().is_none());
    assert_eq!(control.session().sink().sessions.len(), 1);
}

#[test]
fn test_sensor_faults_skip_body_but_keep_cadence() {
    let clock = ManualClock::new();
    let mut robot = LoopbackRobot::new(JOINTS, PERIOD);
    robot.inject_sensor_faults(3);
    let mut control = build(vec![], robot, MemorySessionSink::default(), &clock);

    let report = control.run_cycle();
    assert!(report.error.is_some());
    assert!(report.fsm_state.is_none());
    assert_eq!(report.outcome.slept, PERIOD);

    let summary = control.run();
    assert_eq!(summary.reason, ExitReason::CycleLimit);
    assert_eq!(Some(summary.cycles), control.settings().max_cycles);
    assert_eq!(summary.failed_cycles, 3);
    assert_eq!(summary.sessions.opened, 0);
}

#[test]
fn test_wrong_joint_count_is_a_cycle_error() {
    let clock = ManualClock::new();
    let robot = LoopbackRobot::new(JOINTS + 1, PERIOD);
    let mut control = build(vec![], robot, MemorySessionSink::default(), &clock);

    let report = control.run_cycle();
    assert!(matches!(
        report.error,
        Some(CycleError::ShapeMismatch { field: "joint_q", .. })
    ));
    assert_eq!(control.robot().commands_sent(), 0);
}

/// Pad with a broken left stick: axis 0 reads NaN, everything else neutral.
struct BrokenStickPad;

impl InputDevice for BrokenStickPad {
    fn update(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn is_pressed_index(&self, _index: usize) -> bool {
        false
    }

    fn is_released_index(&self, _index: usize) -> bool {
        false
    }

    fn axis_value(&self, axis: usize) -> f32 {
        if axis == 0 { f32::NAN } else { 0.0 }
    }

    fn hat_direction(&self, _hat: usize) -> (i8, i8) {
        (0, 0)
    }

    fn button_count(&self) -> usize {
        15
    }

    fn axis_count(&self) -> usize {
        4
    }

    fn hat_count(&self) -> usize {
        1
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Physical
    }
}

#[test]
fn test_non_finite_axis_is_reported_but_cycle_completes() {
    let clock = ManualClock::new();
    let mut control = ControlLoop::new(
        BrokenStickPad,
        LoopbackRobot::new(JOINTS, PERIOD),
        policy(),
        MemorySessionSink::default(),
        CycleClock::new(PERIOD, clock.clone(), clock.sleeper()),
        LoopSettings {
            max_cycles: Some(3),
            ..settings()
        },
    );

    let report = control.run_cycle();
    assert_eq!(
        report.error,
        Some(CycleError::NonFinite {
            field: "axis",
            index: 0
        })
    );
    assert!(report.command.velocity_cmd.iter().all(|v| v.abs() < f32::EPSILON));
    assert!(report.fsm_state.is_some());
    assert_eq!(control.robot().commands_sent(), 1);

    let summary = control.run();
    assert_eq!(summary.reason, ExitReason::CycleLimit);
    assert_eq!(summary.cycles, 3);
    assert_eq!(summary.failed_cycles, 3);
}

/// Loopback robot whose sensing takes longer than the period.
struct SlowRobot {
    inner: LoopbackRobot,
    clock: ManualClock,
    delay: Duration,
}

impl SensorSource for SlowRobot {
    fn snapshot(&mut self) -> CycleResult<SensorSnapshot> {
        self.clock.advance(self.delay);
        self.inner.snapshot()
    }
}

impl Actuator for SlowRobot {
    fn send(&mut self, command: &ActuationCommand) -> CycleResult {
        self.inner.send(command)
    }
}

#[test]
fn test_overruns_are_counted_not_fatal() {
    let clock = ManualClock::new();
    let robot = SlowRobot {
        inner: LoopbackRobot::new(JOINTS, PERIOD),
        clock: clock.clone(),
        delay: Duration::from_millis(25),
    };
    let mut control = build(vec![], robot, MemorySessionSink::default(), &clock);

    let mut consecutive = Vec::new();
    for _ in 0..4 {
        let report = control.run_cycle();
        assert!(report.outcome.overran);
        assert_eq!(report.outcome.overrun_by, Duration::from_millis(5));
        consecutive.push(report.outcome.consecutive_overruns);
    }

    assert_eq!(consecutive, vec![1, 2, 3, 4]);
    assert_eq!(control.clock().overrun_count(), 4);
    assert!(control.clock().sleeper().sleeps().is_empty());
    assert_eq!(control.robot().inner.commands_sent(), 4);
}

#[test]
fn test_run_summary_reports_drift() {
    let clock = ManualClock::new();
    let robot = SlowRobot {
        inner: LoopbackRobot::new(JOINTS, PERIOD),
        clock: clock.clone(),
        delay: Duration::from_millis(25),
    };
    let mut control = ControlLoop::new(
        KeyboardGamepad::new(ScriptedKeyPump::default()),
        robot,
        policy(),
        MemorySessionSink::default(),
        CycleClock::new(PERIOD, clock.clone(), clock.sleeper()),
        LoopSettings {
            max_cycles: Some(5),
            ..settings()
        },
    );

    let summary = control.run();
    assert_eq!(summary.overruns, 5);
    assert_eq!(summary.drift.cycles, 5);
    assert_eq!(summary.drift.p99_ns, 5_000_000);
    assert_eq!(summary.drift.max_ns, 5_000_000);
}

#[test]
fn test_csv_sink_writes_session_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let log_dir = dir.path().join("log");

    let mut frames = loco();
    frames.extend([vec![], vec![]]);
    frames.extend(passive());

    let clock = ManualClock::new();
    let mut control = build(
        frames,
        LoopbackRobot::new(JOINTS, PERIOD),
        CsvSessionSink::new(&log_dir),
        &clock,
    );

    let mut saved = None;
    for _ in 0..6 {
        if let SessionTransition::Closed { saved: path } = control.run_cycle().transition {
            saved = path;
        }
    }
    let path = saved.ok_or("session was not saved")?;
    assert!(path.starts_with(&log_dir));

    let file = std::io::BufReader::new(std::fs::File::open(&path)?);
    let table = read_csv(file)?;
    assert_eq!(table.header.len(), 1 + 5 * JOINTS + 11);
    assert_eq!(table.header.first().map(String::as_str), Some("timestamp"));
    assert_eq!(table.rows.len(), 4);
    assert_eq!(
        table.column("fsm_state_enum"),
        Some(vec!["LOCOMODE"; 4])
    );
    assert_eq!(table.column("kp_2"), Some(vec!["60"; 4]));
    Ok(())
}
