//! State-gated telemetry sessions.
//!
//! A session opens the first cycle the external state machine is in an
//! active (non-quiescent) state and closes the first cycle it enters
//! PASSIVE. Closing serializes the whole session once; nothing is written
//! while recording.
//!
//! ```text
//!            active state observed
//!   ┌──────┐ ─────────────────────▶ ┌───────────┐
//!   │ Idle │                        │ Recording │ ── append one row per cycle
//!   └──────┘ ◀───────────────────── └───────────┘
//!            PASSIVE observed and previous state was not PASSIVE
//!            (save, then drop the store)
//! ```
//!
//! Any active state observed while idle opens a fresh session, including
//! a return to an active state after an unexpected gap.

use std::path::{Path, PathBuf};

use chrono::Local;
use legged_errors::TelemetryError;
use legged_telemetry::{TelemetrySchema, TelemetryStore, save_session};

use crate::command::CommandVector;
use crate::ports::{FsmState, FsmStateId, PolicyOutput, SensorSnapshot};

/// Destination for closed sessions.
pub trait SessionSink {
    /// Persist a closed session and return where it went.
    ///
    /// # Errors
    ///
    /// [`TelemetryError::Empty`] when there is nothing to save, otherwise
    /// whatever the backing store reports.
    fn save(&mut self, store: &TelemetryStore) -> Result<PathBuf, TelemetryError>;
}

/// Writes each session to `<dir>/robot_control_%Y%m%d_%H%M%S.csv`.
#[derive(Debug, Clone)]
pub struct CsvSessionSink {
    dir: PathBuf,
}

impl CsvSessionSink {
    /// Sink writing into `dir`, created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SessionSink for CsvSessionSink {
    fn save(&mut self, store: &TelemetryStore) -> Result<PathBuf, TelemetryError> {
        save_session(store, &self.dir, &Local::now())
    }
}

/// Keeps closed sessions in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionSink {
    /// Every session saved so far
    pub sessions: Vec<TelemetryStore>,
    /// When set, every save fails with this I/O error kind
    pub fail_with: Option<std::io::ErrorKind>,
}

impl SessionSink for MemorySessionSink {
    fn save(&mut self, store: &TelemetryStore) -> Result<PathBuf, TelemetryError> {
        if let Some(kind) = self.fail_with {
            return Err(std::io::Error::from(kind).into());
        }
        if store.is_empty() {
            return Err(TelemetryError::Empty);
        }
        self.sessions.push(store.clone());
        Ok(PathBuf::from(format!("memory://session/{}", self.sessions.len())))
    }
}

impl<S: SessionSink + ?Sized> SessionSink for &mut S {
    fn save(&mut self, store: &TelemetryStore) -> Result<PathBuf, TelemetryError> {
        (**self).save(store)
    }
}

/// Session controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No store is open
    Idle,
    /// Rows are being appended to an open store
    Recording,
}

/// What happened to the session on one observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTransition {
    /// No state change
    None,
    /// A new session was opened
    Opened,
    /// The session was closed; `saved` is the file written, if any
    Closed {
        /// Location of the saved session
        saved: Option<PathBuf>,
    },
}

/// Session lifecycle counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Sessions opened
    pub opened: u64,
    /// Sessions written successfully
    pub saved: u64,
    /// Sessions whose write failed
    pub failed: u64,
    /// Sessions closed with no rows
    pub discarded: u64,
    /// Rows recorded across all sessions
    pub rows: u64,
}

/// Everything recorded for one cycle.
#[derive(Debug, Clone, Copy)]
pub struct CycleRecord<'a> {
    /// Wall-clock seconds since the Unix epoch
    pub timestamp: f64,
    /// Sensor readings used this cycle
    pub sensors: &'a SensorSnapshot,
    /// Policy output sent this cycle
    pub output: &'a PolicyOutput,
    /// Operator command this cycle
    pub command: &'a CommandVector,
}

/// Precomputed per-joint column names.
#[derive(Debug, Clone)]
struct JointColumns {
    actual_q: Vec<String>,
    actual_dq: Vec<String>,
    target_q: Vec<String>,
    kp: Vec<String>,
    kd: Vec<String>,
}

impl JointColumns {
    fn new(num_joints: usize) -> Self {
        let names = |prefix: &str| -> Vec<String> {
            (0..num_joints).map(|i| format!("{prefix}_{i}")).collect()
        };
        Self {
            actual_q: names("actual_q"),
            actual_dq: names("actual_dq"),
            target_q: names("target_q"),
            kp: names("kp"),
            kd: names("kd"),
        }
    }
}

const VEL_CMD_COLUMNS: [&str; 3] = ["vel_cmd_x", "vel_cmd_y", "vel_cmd_yaw"];
const GRAVITY_COLUMNS: [&str; 3] = ["gravity_ori_x", "gravity_ori_y", "gravity_ori_z"];
const ANG_VEL_COLUMNS: [&str; 3] = ["ang_vel_0", "ang_vel_1", "ang_vel_2"];

/// Two-state logging session machine.
#[derive(Debug)]
pub struct LoggingSessionController<K: SessionSink> {
    state: SessionState,
    store: Option<TelemetryStore>,
    previous_fsm_state: Option<FsmStateId>,
    schema: TelemetrySchema,
    joints: JointColumns,
    sink: K,
    stats: SessionStats,
}

impl<K: SessionSink> LoggingSessionController<K> {
    /// Create an idle controller for `num_joints` joints.
    pub fn new(num_joints: usize, sink: K) -> Self {
        Self {
            state: SessionState::Idle,
            store: None,
            previous_fsm_state: None,
            schema: TelemetrySchema::control(num_joints),
            joints: JointColumns::new(num_joints),
            sink,
            stats: SessionStats::default(),
        }
    }

    /// Observe this cycle's state machine state, transition, and record a
    /// row if a session is open afterwards.
    pub fn observe(&mut self, fsm: &FsmState, record: &CycleRecord<'_>) -> SessionTransition {
        let current = fsm.id;
        let transition = match self.state {
            SessionState::Idle if !current.is_quiescent() => {
                tracing::info!(fsm_state = %fsm.name, "starting data logging");
                self.store = Some(self.schema.new_store());
                self.state = SessionState::Recording;
                self.stats.opened = self.stats.opened.saturating_add(1);
                SessionTransition::Opened
            }
            SessionState::Recording
                if current == FsmStateId::Passive
                    && self.previous_fsm_state != Some(FsmStateId::Passive) =>
            {
                tracing::info!(fsm_state = %fsm.name, "stopping data logging");
                SessionTransition::Closed {
                    saved: self.close(),
                }
            }
            _ => SessionTransition::None,
        };

        if let Some(store) = self.store.as_mut() {
            self.joints.record_row(store, fsm, record);
            self.stats.rows = self.stats.rows.saturating_add(1);
        }

        self.previous_fsm_state = Some(current);
        transition
    }

    /// Flush an open session. Saves at most once; later calls do nothing.
    pub fn shutdown(&mut self) -> Option<PathBuf> {
        if self.state != SessionState::Recording {
            return None;
        }
        tracing::info!("saving log data before exit");
        self.close()
    }

    fn close(&mut self) -> Option<PathBuf> {
        self.state = SessionState::Idle;
        let store = self.store.take()?;

        match self.sink.save(&store) {
            Ok(path) => {
                self.stats.saved = self.stats.saved.saturating_add(1);
                tracing::info!(path = %path.display(), summary = %store.summary(), "log data saved");
                Some(path)
            }
            Err(TelemetryError::Empty) => {
                self.stats.discarded = self.stats.discarded.saturating_add(1);
                tracing::warn!("no data to save");
                None
            }
            Err(e) => {
                self.stats.failed = self.stats.failed.saturating_add(1);
                tracing::error!(error = %e, "failed to save log data");
                None
            }
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The open session's store, if recording.
    pub fn store(&self) -> Option<&TelemetryStore> {
        self.store.as_ref()
    }

    /// Lifecycle counters.
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// The sink.
    pub fn sink(&self) -> &K {
        &self.sink
    }
}

impl JointColumns {
    fn record_row(&self, store: &mut TelemetryStore, fsm: &FsmState, record: &CycleRecord<'_>) {
        store.begin_row();
        store.append("timestamp", record.timestamp);

        let sensors = record.sensors;
        for ((q_name, dq_name), (q, dq)) in self
            .actual_q
            .iter()
            .zip(&self.actual_dq)
            .zip(sensors.joint_q.iter().zip(&sensors.joint_dq))
        {
            store.append(q_name, *q);
            store.append(dq_name, *dq);
        }

        let output = record.output;
        for (name, q) in self.target_q.iter().zip(&output.target_q) {
            store.append(name, *q);
        }
        for ((kp_name, kd_name), (kp, kd)) in self
            .kp
            .iter()
            .zip(&self.kd)
            .zip(output.kp.iter().zip(&output.kd))
        {
            store.append(kp_name, *kp);
            store.append(kd_name, *kd);
        }

        for (name, v) in VEL_CMD_COLUMNS.iter().zip(record.command.velocity_cmd) {
            store.append(name, v);
        }

        store.append("fsm_state", fsm.name.as_str());
        store.append("fsm_state_enum", fsm.id.to_string());

        for (name, g) in GRAVITY_COLUMNS.iter().zip(sensors.gravity_orientation) {
            store.append(name, g);
        }
        for (name, w) in ANG_VEL_COLUMNS.iter().zip(sensors.angular_velocity) {
            store.append(name, w);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        sensors: SensorSnapshot,
        output: PolicyOutput,
        command: CommandVector,
    }

    impl Fixture {
        fn new(joints: usize) -> Self {
            Self {
                sensors: SensorSnapshot::zeroed(joints),
                output: PolicyOutput {
                    target_q: vec![0.1; joints],
                    kp: vec![40.0; joints],
                    kd: vec![1.0; joints],
                    fsm_state: FsmState::new(FsmStateId::Passive, "passive"),
                },
                command: CommandVector::default(),
            }
        }

        fn record(&self) -> CycleRecord<'_> {
            CycleRecord {
                timestamp: 1_700_000_000.0,
                sensors: &self.sensors,
                output: &self.output,
                command: &self.command,
            }
        }
    }

    fn state(id: FsmStateId) -> FsmState {
        FsmState::new(id, id.to_string().to_lowercase())
    }

    #[test]
    fn test_lifecycle_sequence() {
        use FsmStateId::{Loco, Passive};

        let fixture = Fixture::new(2);
        let mut controller = LoggingSessionController::new(2, MemorySessionSink::default());

        let transitions: Vec<SessionTransition> = [Passive, Loco, Loco, Passive, Passive, Loco]
            .into_iter()
            .map(|id| controller.observe(&state(id), &fixture.record()))
            .collect();

        assert_eq!(
            transitions,
            vec![
                SessionTransition::None,
                SessionTransition::Opened,
                SessionTransition::None,
                SessionTransition::Closed {
                    saved: Some(PathBuf::from("memory://session/1"))
                },
                SessionTransition::None,
                SessionTransition::Opened,
            ]
        );
        assert_eq!(controller.stats().opened, 2);
        assert_eq!(controller.stats().saved, 1);
        assert_eq!(controller.state(), SessionState::Recording);

        // The final session is saved by the shutdown flush.
        assert!(controller.shutdown().is_some());
        assert_eq!(controller.stats().saved, 2);

        let first = controller.sink().sessions.first().map(TelemetryStore::row_count);
        assert_eq!(first, Some(2));
    }

    #[test]
    fn test_shutdown_saves_exactly_once() {
        let fixture = Fixture::new(1);
        let mut controller = LoggingSessionController::new(1, MemorySessionSink::default());
        let _ = controller.observe(&state(FsmStateId::Skill(1)), &fixture.record());

        assert!(controller.shutdown().is_some());
        assert!(controller.shutdown().is_none());
        assert_eq!(controller.sink().sessions.len(), 1);
    }

    #[test]
    fn test_shutdown_while_idle_saves_nothing() {
        let mut controller = LoggingSessionController::new(1, MemorySessionSink::default());
        assert!(controller.shutdown().is_none());
        assert_eq!(controller.stats(), SessionStats::default());
    }

    #[test]
    fn test_fixed_pose_does_not_open_or_close() {
        let fixture = Fixture::new(1);
        let mut controller = LoggingSessionController::new(1, MemorySessionSink::default());

        let _ = controller.observe(&state(FsmStateId::FixedPose), &fixture.record());
        assert_eq!(controller.state(), SessionState::Idle);

        let _ = controller.observe(&state(FsmStateId::Loco), &fixture.record());
        let t = controller.observe(&state(FsmStateId::FixedPose), &fixture.record());
        assert_eq!(t, SessionTransition::None);
        assert_eq!(controller.state(), SessionState::Recording);
        assert_eq!(controller.store().map(TelemetryStore::row_count), Some(2));
    }

    #[test]
    fn test_save_failure_still_closes() {
        let fixture = Fixture::new(1);
        let sink = MemorySessionSink {
            fail_with: Some(std::io::ErrorKind::PermissionDenied),
            ..MemorySessionSink::default()
        };
        let mut controller = LoggingSessionController::new(1, sink);

        let _ = controller.observe(&state(FsmStateId::Loco), &fixture.record());
        let t = controller.observe(&state(FsmStateId::Passive), &fixture.record());

        assert_eq!(t, SessionTransition::Closed { saved: None });
        assert_eq!(controller.state(), SessionState::Idle);
        assert!(controller.store().is_none());
        assert_eq!(controller.stats().failed, 1);
    }

    #[test]
    fn test_row_layout() {
        let mut fixture = Fixture::new(2);
        fixture.sensors.joint_q = vec![0.5, -0.5];
        fixture.command.velocity_cmd = [0.3, 0.0, -0.2];

        let mut controller = LoggingSessionController::new(2, MemorySessionSink::default());
        let _ = controller.observe(&state(FsmStateId::Loco), &fixture.record());

        let store = controller.store();
        let cell = |name: &str| {
            store
                .and_then(|s| s.column(name))
                .and_then(|c| c.first().cloned().flatten())
                .map(|c| c.to_string())
        };
        assert_eq!(cell("actual_q_1").as_deref(), Some("-0.5"));
        assert_eq!(cell("vel_cmd_yaw").as_deref(), Some("-0.2"));
        assert_eq!(cell("fsm_state").as_deref(), Some("locomode"));
        assert_eq!(cell("fsm_state_enum").as_deref(), Some("LOCOMODE"));
        assert_eq!(cell("gravity_ori_z").as_deref(), Some("-1"));
        assert_eq!(cell("kd_0").as_deref(), Some("1"));
        assert_eq!(store.map(TelemetryStore::column_count), Some(1 + 5 * 2 + 11));
    }
}
