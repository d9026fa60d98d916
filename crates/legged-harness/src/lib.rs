//! Real-time execution harness for a legged-robot controller.
//!
//! The harness owns the parts of a deployment that are the same whether the
//! robot is simulated or physical:
//!
//! - [`command`]: gamepad state to mode commands and a velocity command
//! - [`session`]: opens, records and saves a telemetry session based on the
//!   external state machine's current state
//! - [`driver`]: the fixed-cadence loop tying input, sensing, policy,
//!   actuation and logging together
//!
//! Sensing, actuation and the policy itself are external collaborators
//! behind the traits in [`ports`]. [`sim`] ships trivial reference versions
//! so the loop can be dry-run without a robot.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod command;
pub mod config;
pub mod driver;
pub mod orientation;
pub mod ports;
pub mod session;
pub mod sim;

pub use command::{CommandMapper, CommandVector, ModeCommand};
pub use config::HarnessConfig;
pub use driver::{ControlLoop, CycleReport, ExitReason, LoopSettings, RunSummary};
pub use orientation::gravity_orientation;
pub use ports::{
    ActuationCommand, Actuator, ControlState, FsmState, FsmStateId, Policy, PolicyOutput,
    SensorSnapshot, SensorSource,
};
pub use session::{
    CsvSessionSink, CycleRecord, LoggingSessionController, MemorySessionSink, SessionSink,
    SessionState, SessionStats, SessionTransition,
};
pub use sim::{HoldPosePolicy, LoopbackRobot};
