//! Port traits for the external collaborators.
//!
//! The harness never talks to a robot, a simulator, or a policy directly.
//! Each is reached through one synchronous call per cycle and must return
//! well within the cycle period.

use core::fmt;

use legged_errors::CycleResult;

use crate::command::CommandVector;

/// Joint and IMU state pulled once per cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SensorSnapshot {
    /// Joint positions (rad)
    pub joint_q: Vec<f32>,
    /// Joint velocities (rad/s)
    pub joint_dq: Vec<f32>,
    /// Gravity direction in the body frame
    pub gravity_orientation: [f32; 3],
    /// Body angular velocity (rad/s)
    pub angular_velocity: [f32; 3],
}

impl SensorSnapshot {
    /// A zeroed snapshot for `num_joints` joints, upright.
    pub fn zeroed(num_joints: usize) -> Self {
        Self {
            joint_q: vec![0.0; num_joints],
            joint_dq: vec![0.0; num_joints],
            gravity_orientation: [0.0, 0.0, -1.0],
            angular_velocity: [0.0; 3],
        }
    }
}

/// Everything the policy sees for one cycle.
#[derive(Debug, Clone, Copy)]
pub struct ControlState<'a> {
    /// Latest sensor readings
    pub sensors: &'a SensorSnapshot,
    /// Latest operator command
    pub command: &'a CommandVector,
}

/// Identity of the external state machine's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsmStateId {
    /// Not yet initialized or unknown
    Invalid,
    /// Motors limp, damping only
    Passive,
    /// Holding a fixed pose
    FixedPose,
    /// Walking
    Loco,
    /// Numbered skill (1-based)
    Skill(u8),
    /// Any other state the policy defines
    Other(u16),
}

impl FsmStateId {
    /// Quiescent states never record telemetry.
    pub fn is_quiescent(self) -> bool {
        matches!(
            self,
            FsmStateId::Passive | FsmStateId::FixedPose | FsmStateId::Invalid
        )
    }
}

impl fmt::Display for FsmStateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsmStateId::Invalid => f.write_str("INVALID"),
            FsmStateId::Passive => f.write_str("PASSIVE"),
            FsmStateId::FixedPose => f.write_str("FIXEDPOSE"),
            FsmStateId::Loco => f.write_str("LOCOMODE"),
            FsmStateId::Skill(n) => write!(f, "SKILL_{n}"),
            FsmStateId::Other(n) => write!(f, "STATE_{n}"),
        }
    }
}

/// The external state machine's current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsmState {
    /// Raw identifier
    pub id: FsmStateId,
    /// Human-readable name
    pub name: String,
}

impl FsmState {
    /// Create a state.
    pub fn new(id: FsmStateId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Per-joint targets and gains produced by the policy.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyOutput {
    /// Target joint positions
    pub target_q: Vec<f32>,
    /// Proportional gains
    pub kp: Vec<f32>,
    /// Derivative gains
    pub kd: Vec<f32>,
    /// State the policy is in after this step
    pub fsm_state: FsmState,
}

/// One low-level motor command frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuationCommand {
    /// Target positions
    pub target_q: Vec<f32>,
    /// Target velocities
    pub target_dq: Vec<f32>,
    /// Proportional gains
    pub kp: Vec<f32>,
    /// Derivative gains
    pub kd: Vec<f32>,
    /// Feed-forward torques
    pub tau: Vec<f32>,
}

impl ActuationCommand {
    /// Position-control frame from policy output; velocity and torque zero.
    pub fn from_policy(output: &PolicyOutput) -> Self {
        let n = output.target_q.len();
        Self {
            target_q: output.target_q.clone(),
            target_dq: vec![0.0; n],
            kp: output.kp.clone(),
            kd: output.kd.clone(),
            tau: vec![0.0; n],
        }
    }

    /// Damping frame: zero stiffness, uniform `kd`, no targets.
    pub fn damping(num_joints: usize, kd: f32) -> Self {
        Self {
            target_q: vec![0.0; num_joints],
            target_dq: vec![0.0; num_joints],
            kp: vec![0.0; num_joints],
            kd: vec![kd; num_joints],
            tau: vec![0.0; num_joints],
        }
    }
}

/// Sensing collaborator.
pub trait SensorSource {
    /// Pull the latest joint and IMU state.
    ///
    /// # Errors
    ///
    /// Returns a [`CycleError`](legged_errors::CycleError) when no valid
    /// state is available this cycle.
    fn snapshot(&mut self) -> CycleResult<SensorSnapshot>;
}

/// Actuation collaborator.
pub trait Actuator {
    /// Push one command frame to the motors.
    ///
    /// # Errors
    ///
    /// Returns a [`CycleError`](legged_errors::CycleError) when the frame
    /// could not be delivered.
    fn send(&mut self, command: &ActuationCommand) -> CycleResult;
}

/// Policy / finite-state-machine collaborator.
pub trait Policy {
    /// Advance one step.
    ///
    /// # Errors
    ///
    /// Returns a [`CycleError`](legged_errors::CycleError) when the step
    /// cannot produce a valid output.
    fn step(&mut self, state: &ControlState<'_>) -> CycleResult<PolicyOutput>;
}
