//! Harness configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use legged_errors::ConfigError;
use serde::{Deserialize, Serialize};

use crate::driver::LoopSettings;

/// Runtime configuration, loaded from YAML. Missing keys take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Control period in seconds
    pub control_dt: f64,
    /// Number of actuated joints
    pub num_joints: usize,
    /// Directory session files are written to
    pub log_dir: PathBuf,
    /// Consecutive overruns before the sustained-overrun warning
    pub overrun_alarm_threshold: u64,
    /// Damping gain of the shutdown command
    pub damping_kd: f32,
    /// Display names for joints, in index order
    pub joint_names: Option<Vec<String>>,
    /// Standing pose for the reference policy (rad)
    pub default_pose: Option<Vec<f32>>,
    /// Reference policy stiffness
    pub stand_kp: f32,
    /// Reference policy damping
    pub stand_kd: f32,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            control_dt: 0.02,
            num_joints: 29,
            log_dir: PathBuf::from("log"),
            overrun_alarm_threshold: 50,
            damping_kd: 8.0,
            joint_names: None,
            default_pose: None,
            stand_kp: 60.0,
            stand_kd: 1.5,
        }
    }
}

impl HarnessConfig {
    /// Load and validate a YAML file.
    ///
    /// # Errors
    ///
    /// I/O, parse and validation failures.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse and validate YAML text.
    ///
    /// # Errors
    ///
    /// Parse and validation failures.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the loop cannot run with.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.control_dt.is_finite() || self.control_dt <= 0.0 {
            return Err(ConfigError::invalid(
                "control_dt",
                format!("must be a positive number of seconds, got {}", self.control_dt),
            ));
        }
        if Duration::try_from_secs_f64(self.control_dt).is_err() {
            return Err(ConfigError::invalid("control_dt", "out of range"));
        }
        if self.num_joints == 0 {
            return Err(ConfigError::invalid("num_joints", "must be at least 1"));
        }
        if !self.damping_kd.is_finite() || self.damping_kd < 0.0 {
            return Err(ConfigError::invalid(
                "damping_kd",
                "must be finite and non-negative",
            ));
        }
        if let Some(names) = &self.joint_names
            && names.len() != self.num_joints
        {
            return Err(ConfigError::invalid(
                "joint_names",
                format!("has {} entries, expected {}", names.len(), self.num_joints),
            ));
        }
        if let Some(pose) = &self.default_pose {
            if pose.len() != self.num_joints {
                return Err(ConfigError::invalid(
                    "default_pose",
                    format!("has {} entries, expected {}", pose.len(), self.num_joints),
                ));
            }
            if pose.iter().any(|q| !q.is_finite()) {
                return Err(ConfigError::invalid("default_pose", "contains non-finite values"));
            }
        }
        Ok(())
    }

    /// Control period. Zero if `control_dt` was never validated.
    pub fn period(&self) -> Duration {
        Duration::try_from_secs_f64(self.control_dt).unwrap_or_default()
    }

    /// Display name of joint `index`, `joint_{index}` when unnamed.
    pub fn joint_label(&self, index: usize) -> String {
        self.joint_names
            .as_ref()
            .and_then(|names| names.get(index))
            .cloned()
            .unwrap_or_else(|| format!("joint_{index}"))
    }

    /// Driver settings derived from this configuration.
    pub fn loop_settings(&self) -> LoopSettings {
        LoopSettings {
            num_joints: self.num_joints,
            overrun_alarm_threshold: self.overrun_alarm_threshold,
            damping_kd: self.damping_kd,
            max_cycles: None,
        }
    }
}
