//! Reference collaborators for dry runs.
//!
//! [`LoopbackRobot`] integrates commanded targets with a first-order lag and
//! reports them back as sensor state. [`HoldPosePolicy`] switches states on
//! mode commands and holds a fixed pose in every active state. Neither is a
//! controller; they exist so the loop, input and session lifecycle can be
//! exercised without a simulator or a robot.

use std::time::Duration;

use legged_errors::{CycleError, CycleResult};

use crate::command::ModeCommand;
use crate::orientation::gravity_orientation;
use crate::ports::{
    ActuationCommand, Actuator, ControlState, FsmState, FsmStateId, Policy, PolicyOutput,
    SensorSnapshot, SensorSource,
};

/// Virtual robot that tracks commanded joint targets.
#[derive(Debug, Clone)]
pub struct LoopbackRobot {
    q: Vec<f32>,
    dq: Vec<f32>,
    quat: [f32; 4],
    angular_velocity: [f32; 3],
    dt: f32,
    time_constant: f32,
    sensor_faults: u32,
    connected: bool,
    last_command: Option<ActuationCommand>,
    commands_sent: u64,
}

impl LoopbackRobot {
    /// Create an upright robot with every joint at zero.
    pub fn new(num_joints: usize, dt: Duration) -> Self {
        Self {
            q: vec![0.0; num_joints],
            dq: vec![0.0; num_joints],
            quat: [1.0, 0.0, 0.0, 0.0],
            angular_velocity: [0.0; 3],
            dt: dt.as_secs_f32(),
            time_constant: 0.1,
            sensor_faults: 0,
            connected: true,
            last_command: None,
            commands_sent: 0,
        }
    }

    /// Set the base orientation as a `[w, x, y, z]` quaternion.
    #[must_use]
    pub fn with_orientation(mut self, quat: [f32; 4]) -> Self {
        self.quat = quat;
        self
    }

    /// Set the tracking time constant in seconds.
    #[must_use]
    pub fn with_time_constant(mut self, seconds: f32) -> Self {
        self.time_constant = seconds;
        self
    }

    /// Fail the next `count` snapshots.
    pub fn inject_sensor_faults(&mut self, count: u32) {
        self.sensor_faults = count;
    }

    /// Reject every command until [`reconnect`](Self::reconnect).
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    pub fn reconnect(&mut self) {
        self.connected = true;
    }

    /// Joint positions.
    pub fn joint_q(&self) -> &[f32] {
        &self.q
    }

    /// Most recent command accepted.
    pub fn last_command(&self) -> Option<&ActuationCommand> {
        self.last_command.as_ref()
    }

    /// Number of commands accepted.
    pub fn commands_sent(&self) -> u64 {
        self.commands_sent
    }

    fn tracking_alpha(&self) -> f32 {
        if self.time_constant <= 0.0 {
            return 1.0;
        }
        (self.dt / (self.time_constant + self.dt)).clamp(0.0, 1.0)
    }
}

impl SensorSource for LoopbackRobot {
    fn snapshot(&mut self) -> CycleResult<SensorSnapshot> {
        if self.sensor_faults > 0 {
            self.sensor_faults = self.sensor_faults.saturating_sub(1);
            return Err(CycleError::Sensor("injected sensor fault".to_string()));
        }
        Ok(SensorSnapshot {
            joint_q: self.q.clone(),
            joint_dq: self.dq.clone(),
            gravity_orientation: gravity_orientation(self.quat),
            angular_velocity: self.angular_velocity,
        })
    }
}

impl Actuator for LoopbackRobot {
    fn send(&mut self, command: &ActuationCommand) -> CycleResult {
        if !self.connected {
            return Err(CycleError::Actuator("robot disconnected".to_string()));
        }
        CycleError::check_len("target_q", &command.target_q, self.q.len())?;
        CycleError::check_len("kp", &command.kp, self.q.len())?;

        let alpha = self.tracking_alpha();
        for ((q, dq), (target, kp)) in self
            .q
            .iter_mut()
            .zip(self.dq.iter_mut())
            .zip(command.target_q.iter().zip(&command.kp))
        {
            // Zero stiffness: joints go limp and come to rest.
            let next = if *kp > 0.0 { *q + alpha * (target - *q) } else { *q };
            *dq = if self.dt > 0.0 { (next - *q) / self.dt } else { 0.0 };
            *q = next;
        }

        self.last_command = Some(command.clone());
        self.commands_sent = self.commands_sent.saturating_add(1);
        Ok(())
    }
}

/// Reference state machine: PASSIVE until commanded, then holds a pose.
#[derive(Debug, Clone)]
pub struct HoldPosePolicy {
    state: FsmStateId,
    pose: Vec<f32>,
    kp: f32,
    kd: f32,
    passive_kd: f32,
}

impl HoldPosePolicy {
    /// Hold `pose` with gains `kp`/`kd`; PASSIVE damps with `passive_kd`.
    pub fn new(pose: Vec<f32>, kp: f32, kd: f32, passive_kd: f32) -> Self {
        Self {
            state: FsmStateId::Passive,
            pose,
            kp,
            kd,
            passive_kd,
        }
    }

    /// Current state.
    pub fn state(&self) -> FsmStateId {
        self.state
    }

    fn transition(&mut self, command: ModeCommand) {
        let next = match command {
            ModeCommand::Passive => FsmStateId::Passive,
            ModeCommand::PosReset => FsmStateId::FixedPose,
            ModeCommand::Loco => FsmStateId::Loco,
            ModeCommand::Skill1 => FsmStateId::Skill(1),
            ModeCommand::Skill2 => FsmStateId::Skill(2),
            ModeCommand::Skill3 => FsmStateId::Skill(3),
            ModeCommand::Skill4 => FsmStateId::Skill(4),
        };
        if next != self.state {
            tracing::info!(from = %self.state, to = %next, "state change");
            self.state = next;
        }
    }
}

fn state_name(id: FsmStateId) -> String {
    match id {
        FsmStateId::Invalid => "invalid".to_string(),
        FsmStateId::Passive => "passive".to_string(),
        FsmStateId::FixedPose => "fixedpose".to_string(),
        FsmStateId::Loco => "loco".to_string(),
        FsmStateId::Skill(n) => format!("skill_{n}"),
        FsmStateId::Other(n) => format!("state_{n}"),
    }
}

impl Policy for HoldPosePolicy {
    fn step(&mut self, state: &ControlState<'_>) -> CycleResult<PolicyOutput> {
        if let Some(command) = state.command.mode_cmd {
            self.transition(command);
        }

        let n = state.sensors.joint_q.len();
        CycleError::check_len("default_pose", &self.pose, n)?;

        let (target_q, kp, kd) = if self.state == FsmStateId::Passive {
            (
                state.sensors.joint_q.clone(),
                vec![0.0; n],
                vec![self.passive_kd; n],
            )
        } else {
            (self.pose.clone(), vec![self.kp; n], vec![self.kd; n])
        };

        Ok(PolicyOutput {
            target_q,
            kp,
            kd,
            fsm_state: FsmState::new(self.state, state_name(self.state)),
        })
    }
}
