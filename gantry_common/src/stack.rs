//! Motion stack trait and vendor status types.
//!
//! This module defines:
//! - `MotionStack` trait - The four vendor layers (host, node, axis, kinematics)
//! - `VendorStatus` - Status value returned by every failing vendor call
//! - `StackFactory` type alias - Factory function type
//!
//! Everything behind this trait (bus I/O, servo protocol, kinematic solving,
//! spline generation, streaming) is opaque to the sequencer.

use crate::mechanism::{KinematicModel, MechanismId, MechanismSpec, Pose};
use crate::motion::{
    AxisConfiguration, AxisHandle, DriveStatus, HostMode, NodeHandle, ParameterSource,
    SyncRequest, WaitTimeout,
};
use crate::trajectory::{CircleTrajectory, InverseKinematicsRequest, JointMotionBuffers, PathSplines};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Broad class of a vendor failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// The layer refused the request (wrong state, bad handle, ...).
    Rejected,
    /// A wait-for-completion call exceeded its bound.
    Timeout,
    /// The named resource could not be reached or opened.
    Unavailable,
    /// Parameters inconsistent with the mechanism or model.
    Mismatch,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rejected => "rejected",
            Self::Timeout => "timeout",
            Self::Unavailable => "unavailable",
            Self::Mismatch => "mismatch",
        })
    }
}

/// Non-success status returned by a vendor call.
///
/// The human-readable description comes from [`MotionStack::status_string`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[error("vendor status 0x{code:08X} ({kind})")]
pub struct VendorStatus {
    pub kind: StatusKind,
    pub code: u32,
}

impl VendorStatus {
    pub const fn new(kind: StatusKind, code: u32) -> Self {
        Self { kind, code }
    }
}

/// Factory function type for creating motion stack instances.
pub type StackFactory = fn() -> Box<dyn MotionStack>;

/// The vendor motion-control stack.
///
/// State-changing axis calls are asynchronous at the drive: they submit a
/// request and return. Completion is observed with [`axis_synchronize`].
///
/// # Layers
///
/// | Layer      | Calls                                                       |
/// |------------|-------------------------------------------------------------|
/// | Host       | `init_host`, `term_host`, `status_string`                   |
/// | Node       | `node_connect`, `node_disconnect`                           |
/// | Axis/servo | `axis_*`                                                    |
/// | Kinematics | `mechanism_*`, `define_kinematic_model`, `current_position`, `plan_circle`, `solve_inverse_kinematics`, `stream_*` |
///
/// [`axis_synchronize`]: MotionStack::axis_synchronize
pub trait MotionStack {
    /// Backend identifier (e.g. "simulation").
    fn name(&self) -> &'static str;

    // ─── Host ───────────────────────────────────────────────────────

    fn init_host(&mut self, mode: HostMode) -> Result<(), VendorStatus>;

    fn term_host(&mut self) -> Result<(), VendorStatus>;

    /// Vendor description of a status value.
    fn status_string(&self, status: &VendorStatus) -> String;

    // ─── Node ───────────────────────────────────────────────────────

    fn node_connect(&mut self, name: &str) -> Result<NodeHandle, VendorStatus>;

    fn node_disconnect(&mut self, node: NodeHandle) -> Result<(), VendorStatus>;

    // ─── Axis / servo ───────────────────────────────────────────────

    fn axis_connect(&mut self, name: &str) -> Result<AxisHandle, VendorStatus>;

    fn axis_initialize(&mut self, axis: AxisHandle, source: ParameterSource)
    -> Result<(), VendorStatus>;

    /// Block until `request` completes on `axis` or `timeout` elapses.
    ///
    /// A timeout is reported with [`StatusKind::Timeout`] and leaves the
    /// drive in its error state.
    fn axis_synchronize(
        &mut self,
        axis: AxisHandle,
        request: SyncRequest,
        timeout: WaitTimeout,
    ) -> Result<(), VendorStatus>;

    fn axis_configuration(&mut self, axis: AxisHandle) -> Result<AxisConfiguration, VendorStatus>;

    fn axis_align_motor(&mut self, axis: AxisHandle) -> Result<(), VendorStatus>;

    fn axis_lock(&mut self, axis: AxisHandle) -> Result<(), VendorStatus>;

    fn axis_home(&mut self, axis: AxisHandle) -> Result<(), VendorStatus>;

    fn axis_read_state(&mut self, axis: AxisHandle) -> Result<DriveStatus, VendorStatus>;

    fn axis_quick_stop(&mut self, axis: AxisHandle) -> Result<(), VendorStatus>;

    fn axis_reset(&mut self, axis: AxisHandle) -> Result<(), VendorStatus>;

    fn axis_shutdown(&mut self, axis: AxisHandle) -> Result<(), VendorStatus>;

    fn axis_disconnect(&mut self, axis: AxisHandle) -> Result<(), VendorStatus>;

    // ─── Mechanism / kinematics ─────────────────────────────────────

    fn mechanism_create(&mut self, spec: &MechanismSpec) -> Result<MechanismId, VendorStatus>;

    fn mechanism_delete(&mut self, mechanism: MechanismId) -> Result<(), VendorStatus>;

    fn define_kinematic_model(
        &mut self,
        mechanism: MechanismId,
        model: KinematicModel,
    ) -> Result<(), VendorStatus>;

    fn current_position(&mut self, mechanism: MechanismId) -> Result<Pose, VendorStatus>;

    /// Plan a sine-acceleration circle starting at `params.start`.
    fn plan_circle(
        &mut self,
        mechanism: MechanismId,
        params: &CircleTrajectory,
    ) -> Result<PathSplines, VendorStatus>;

    /// Convert the planned path into joint samples.
    ///
    /// Either fully succeeds or fails with no buffer guarantees.
    fn solve_inverse_kinematics(
        &mut self,
        mechanism: MechanismId,
        path: &PathSplines,
        request: &InverseKinematicsRequest,
    ) -> Result<JointMotionBuffers, VendorStatus>;

    /// Feed joint samples to the drives.
    fn stream_motion(
        &mut self,
        mechanism: MechanismId,
        buffers: &JointMotionBuffers,
    ) -> Result<(), VendorStatus>;

    /// Block until the streamed motion completes.
    fn stream_synchronize(
        &mut self,
        mechanism: MechanismId,
        timeout: WaitTimeout,
    ) -> Result<(), VendorStatus>;
}
