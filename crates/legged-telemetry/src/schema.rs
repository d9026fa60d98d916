//! Pre-declared column layouts.

use crate::store::TelemetryStore;

/// Ordered list of column names declared when a session opens.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TelemetrySchema {
    columns: Vec<String>,
}

/// Column name for a per-joint field, e.g. `kp_3`.
pub fn joint_column(prefix: &str, joint: usize) -> String {
    format!("{prefix}_{joint}")
}

impl TelemetrySchema {
    /// Empty schema; every column is dynamic.
    pub fn new() -> Self {
        Self::default()
    }

    /// The control-cycle layout for `num_joints` joints:
    ///
    /// `timestamp`, interleaved `actual_q_i`/`actual_dq_i`, every
    /// `target_q_i`, interleaved `kp_i`/`kd_i`, `vel_cmd_x|y|yaw`,
    /// `fsm_state`, `fsm_state_enum`, `gravity_ori_x|y|z`, `ang_vel_0..2`.
    pub fn control(num_joints: usize) -> Self {
        let mut schema = Self::new().with_column("timestamp");
        for i in 0..num_joints {
            schema.push(joint_column("actual_q", i));
            schema.push(joint_column("actual_dq", i));
        }
        for i in 0..num_joints {
            schema.push(joint_column("target_q", i));
        }
        for i in 0..num_joints {
            schema.push(joint_column("kp", i));
            schema.push(joint_column("kd", i));
        }
        for name in [
            "vel_cmd_x",
            "vel_cmd_y",
            "vel_cmd_yaw",
            "fsm_state",
            "fsm_state_enum",
            "gravity_ori_x",
            "gravity_ori_y",
            "gravity_ori_z",
        ] {
            schema.push(name.to_string());
        }
        for i in 0..3 {
            schema.push(joint_column("ang_vel", i));
        }
        schema
    }

    /// Append a column.
    pub fn with_column(mut self, name: impl Into<String>) -> Self {
        self.push(name.into());
        self
    }

    fn push(&mut self, name: String) {
        if !self.columns.contains(&name) {
            self.columns.push(name);
        }
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema declares nothing.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Create a store with every schema column declared.
    pub fn new_store(&self) -> TelemetryStore {
        let mut store = TelemetryStore::new();
        for name in &self.columns {
            store.declare(name);
        }
        store
    }
}
