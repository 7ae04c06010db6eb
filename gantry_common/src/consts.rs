//! Workspace-wide constants.

use static_assertions::const_assert;

/// Number of Cartesian degrees of freedom a mechanism can expose (X, Y, Z, Rx, Ry, Rz).
pub const DOF_COUNT: usize = 6;

/// Maximum number of joints bound into one mechanism.
pub const MAX_JOINTS: usize = 8;

/// Joints of a gantry: the long axis is driven by two motors (X1, X2), plus Y and Z.
pub const GANTRY_JOINTS: usize = 4;

/// Default bound for lifecycle waits (initialize, align, lock, home, reset, shutdown) in seconds.
pub const DEFAULT_LIFECYCLE_TIMEOUT_S: f64 = 10.0;

/// Default bound for waiting on an axis to stop moving, in seconds.
pub const DEFAULT_MOTION_STOP_TIMEOUT_S: f64 = 30.0;

/// Canonical service name used in logs.
pub const SEQUENCER_SERVICE_NAME: &str = "gantry_sequencer";

const_assert!(GANTRY_JOINTS <= MAX_JOINTS);
const_assert!(DOF_COUNT <= MAX_JOINTS);
