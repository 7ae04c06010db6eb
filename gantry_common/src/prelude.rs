//! Prelude module for common re-exports.
//!
//! ```rust
//! use gantry_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{GANTRY_JOINTS, MAX_JOINTS};

// ─── Motion stack boundary ──────────────────────────────────────────
pub use crate::stack::{MotionStack, StackFactory, StatusKind, VendorStatus};

// ─── Axis / node ────────────────────────────────────────────────────
pub use crate::motion::{
    AxisConfiguration, AxisHandle, DriveState, DriveStatus, HostMode, MotorType, NodeHandle,
    ParameterSource, SyncRequest, WaitTimeout,
};

// ─── Mechanism / trajectory ─────────────────────────────────────────
pub use crate::mechanism::{
    Dof, DofMask, GantryAxis, KinematicModel, MechanismId, MechanismSpec, Pose,
};
pub use crate::trajectory::{
    CircleTrajectory, InverseKinematicsRequest, JointMotionBuffers, JointSamples, PathSplines,
    Plane, SampleBuffer,
};
