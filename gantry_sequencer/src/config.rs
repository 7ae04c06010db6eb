//! Sequencer configuration.
//!
//! One TOML file describes the cell (host mode, nodes, axes), the wait
//! bounds, the bring-up policy, the mechanism and the trajectory. Every
//! section is optional; the defaults drive the reference four-axis gantry
//! through one full circle.
//!
//! # TOML Example
//!
//! ```toml
//! nodes = ["NY4112_node"]
//! axes = ["DEF_AXIS_1", "DEF_AXIS_2", "DEF_AXIS_3", "DEF_AXIS_4"]
//!
//! [shared]
//! log_level = "info"
//! service_name = "gantry-cell-01"
//!
//! [host]
//! mode = "simulation"
//!
//! [timeouts]
//! lifecycle_s = 10.0
//! motion_stop_s = 30.0
//!
//! [bring_up]
//! moving_axis_policy = "wait_only"
//! settle_ms = 500
//!
//! [mechanism]
//! dof = ["x", "y", "z"]
//! kinematics = { gantry = "x" }
//!
//! [trajectory]
//! max_velocity = 500.0
//! max_acceleration = 5000.0
//! center = [300.0, 0.0]
//! angle_deg = 360.0
//! plane = "xy"
//! ```

use crate::fleet::{FleetOptions, MovingAxisPolicy};
use gantry_common::config::{ConfigError, SharedConfig};
use gantry_common::consts::{
    DEFAULT_LIFECYCLE_TIMEOUT_S, DEFAULT_MOTION_STOP_TIMEOUT_S, MAX_JOINTS,
};
use gantry_common::mechanism::{Dof, DofMask, KinematicModel};
use gantry_common::motion::{HostMode, WaitTimeout};
use gantry_common::trajectory::{CircleTrajectory, InverseKinematicsRequest, SampleBuffer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Host layer settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    pub mode: HostMode,
}

/// Wait bounds in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutConfig {
    /// Initialize, align, lock, home, reset and shutdown waits.
    pub lifecycle_s: f64,
    /// Waits for an axis to stop moving.
    pub motion_stop_s: f64,
    /// Wait for streamed motion to complete; omitted = indefinite.
    pub motion_complete_s: Option<f64>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            lifecycle_s: DEFAULT_LIFECYCLE_TIMEOUT_S,
            motion_stop_s: DEFAULT_MOTION_STOP_TIMEOUT_S,
            motion_complete_s: None,
        }
    }
}

impl TimeoutConfig {
    pub fn lifecycle(&self) -> WaitTimeout {
        WaitTimeout::seconds(self.lifecycle_s)
    }

    pub fn motion_stop(&self) -> WaitTimeout {
        WaitTimeout::seconds(self.motion_stop_s)
    }

    pub fn motion_complete(&self) -> WaitTimeout {
        self.motion_complete_s
            .map_or(WaitTimeout::Indefinite, WaitTimeout::seconds)
    }
}

/// Bring-up behaviour.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BringUpConfig {
    pub moving_axis_policy: MovingAxisPolicy,
    /// Pause after all axes are Ready, in milliseconds.
    pub settle_ms: u64,
}

/// Kinematic binding of the axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MechanismConfig {
    pub dof: Vec<Dof>,
    pub kinematics: KinematicModel,
    /// Storage for each joint's inverse-kinematics samples.
    pub joint_buffer: SampleBuffer,
}

impl Default for MechanismConfig {
    fn default() -> Self {
        Self {
            dof: vec![Dof::X, Dof::Y, Dof::Z],
            kinematics: KinematicModel::default(),
            joint_buffer: SampleBuffer::PlannerAllocated,
        }
    }
}

impl MechanismConfig {
    pub fn dof_mask(&self) -> DofMask {
        self.dof.iter().copied().collect()
    }
}

fn default_nodes() -> Vec<String> {
    vec!["NY4112_node".to_string()]
}

fn default_axes() -> Vec<String> {
    (1..=4).map(|n| format!("DEF_AXIS_{n}")).collect()
}

/// Complete sequencer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SequencerConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub host: HostConfig,
    /// Nodes connected in order after the host is up.
    #[serde(default = "default_nodes")]
    pub nodes: Vec<String>,
    /// Axes in joint order.
    #[serde(default = "default_axes")]
    pub axes: Vec<String>,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub bring_up: BringUpConfig,
    #[serde(default)]
    pub mechanism: MechanismConfig,
    #[serde(default)]
    pub trajectory: CircleTrajectory,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            host: HostConfig::default(),
            nodes: default_nodes(),
            axes: default_axes(),
            timeouts: TimeoutConfig::default(),
            bring_up: BringUpConfig::default(),
            mechanism: MechanismConfig::default(),
            trajectory: CircleTrajectory::default(),
        }
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

fn check_positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be positive, got {value}")))
    }
}

fn check_timeout(name: &str, seconds: f64) -> Result<(), ConfigError> {
    check_positive(name, seconds)?;
    match WaitTimeout::try_seconds(seconds) {
        Some(_) => Ok(()),
        None => Err(invalid(format!("{name} is out of range, got {seconds}"))),
    }
}

fn check_names(kind: &str, names: &[String]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for name in names {
        if name.is_empty() {
            return Err(invalid(format!("{kind} name cannot be empty")));
        }
        if !seen.insert(name.as_str()) {
            return Err(invalid(format!("duplicate {kind} name '{name}'")));
        }
    }
    Ok(())
}

impl SequencerConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.axes.is_empty() {
            return Err(invalid("at least one axis is required"));
        }
        if self.axes.len() > MAX_JOINTS {
            return Err(invalid(format!(
                "{} axes configured, at most {MAX_JOINTS} supported",
                self.axes.len()
            )));
        }
        check_names("axis", &self.axes)?;
        check_names("node", &self.nodes)?;

        check_timeout("timeouts.lifecycle_s", self.timeouts.lifecycle_s)?;
        check_timeout("timeouts.motion_stop_s", self.timeouts.motion_stop_s)?;
        if let Some(s) = self.timeouts.motion_complete_s {
            check_timeout("timeouts.motion_complete_s", s)?;
        }

        self.mechanism
            .kinematics
            .check_binding(self.mechanism.dof_mask(), self.axes.len())
            .map_err(|reason| invalid(format!("mechanism: {reason}")))?;

        let t = &self.trajectory;
        check_positive("trajectory.max_velocity", t.max_velocity)?;
        check_positive("trajectory.max_acceleration", t.max_acceleration)?;
        check_positive("trajectory.spline_time", t.spline_time)?;
        if !t.angle_deg.is_finite() || t.angle_deg == 0.0 {
            return Err(invalid("trajectory.angle_deg must be non-zero"));
        }
        if t.center.iter().any(|c| !c.is_finite()) {
            return Err(invalid("trajectory.center must be finite"));
        }
        Ok(())
    }

    pub fn fleet_options(&self) -> FleetOptions {
        FleetOptions {
            lifecycle: self.timeouts.lifecycle(),
            motion_stop: self.timeouts.motion_stop(),
            moving_axis_policy: self.bring_up.moving_axis_policy,
            settle: Duration::from_millis(self.bring_up.settle_ms),
        }
    }

    /// Inverse-kinematics storage for every axis.
    pub fn joint_buffers(&self) -> InverseKinematicsRequest {
        InverseKinematicsRequest {
            position_buffers: vec![self.mechanism.joint_buffer; self.axes.len()],
            velocity_buffers: vec![self.mechanism.joint_buffer; self.axes.len()],
        }
    }
}
