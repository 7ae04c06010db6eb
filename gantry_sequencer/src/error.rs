//! Failure taxonomy for the motion sequence.
//!
//! Every failure carries the location it happened at (the entity and the
//! step) and the vendor's description of the underlying status.

use gantry_common::motion::SyncRequest;
use gantry_common::stack::{MotionStack, StatusKind, VendorStatus};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::error;

/// Operation a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    InitHost,
    TermHost,
    NodeConnect,
    NodeDisconnect,
    AxisConnect,
    AxisInitialize,
    AxisConfiguration,
    AxisAlignMotor,
    AxisLock,
    AxisHome,
    AxisReadState,
    AxisQuickStop,
    AxisReset,
    AxisShutdown,
    AxisDisconnect,
    /// Wait for completion of a submitted request.
    Wait(SyncRequest),
    /// Post-bring-up check that the axis reached Ready.
    BringUpCheck,
    MechanismCreate,
    DefineKinematicModel,
    MechanismDelete,
    CurrentPosition,
    PlanTrajectory,
    InverseKinematics,
    StreamMotion,
    StreamSynchronize,
}

impl Step {
    /// Connect steps report every refusal as an unavailable resource.
    const fn is_connect(&self) -> bool {
        matches!(self, Self::NodeConnect | Self::AxisConnect)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InitHost => "init_host",
            Self::TermHost => "term_host",
            Self::NodeConnect => "node_connect",
            Self::NodeDisconnect => "node_disconnect",
            Self::AxisConnect => "connect",
            Self::AxisInitialize => "initialize",
            Self::AxisConfiguration => "read_configuration",
            Self::AxisAlignMotor => "align_motor",
            Self::AxisLock => "lock",
            Self::AxisHome => "home",
            Self::AxisReadState => "read_state",
            Self::AxisQuickStop => "quick_stop",
            Self::AxisReset => "reset",
            Self::AxisShutdown => "shutdown",
            Self::AxisDisconnect => "disconnect",
            Self::Wait(request) => return write!(f, "wait_{}", request.as_str()),
            Self::BringUpCheck => "bring_up_check",
            Self::MechanismCreate => "mechanism_create",
            Self::DefineKinematicModel => "define_kinematic_model",
            Self::MechanismDelete => "mechanism_delete",
            Self::CurrentPosition => "current_position",
            Self::PlanTrajectory => "plan_trajectory",
            Self::InverseKinematics => "solve_inverse_kinematics",
            Self::StreamMotion => "stream_motion",
            Self::StreamSynchronize => "stream_synchronize",
        };
        f.write_str(name)
    }
}

/// Where a failure happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailurePoint {
    /// Axis name, node name, `host` or `mechanism`.
    pub entity: String,
    pub step: Step,
}

impl FailurePoint {
    pub fn new(entity: impl Into<String>, step: Step) -> Self {
        Self {
            entity: entity.into(),
            step,
        }
    }
}

impl fmt::Display for FailurePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity, self.step)
    }
}

/// Failure class without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    CommandRejected,
    Timeout,
    ConfigurationMismatch,
    ResourceUnavailable,
}

impl ErrorKind {
    /// Classify a vendor status raised at `step`.
    pub const fn classify(kind: StatusKind, step: Step) -> Self {
        match kind {
            StatusKind::Timeout => Self::Timeout,
            StatusKind::Unavailable => Self::ResourceUnavailable,
            StatusKind::Mismatch => Self::ConfigurationMismatch,
            StatusKind::Rejected if step.is_connect() => Self::ResourceUnavailable,
            StatusKind::Rejected => Self::CommandRejected,
        }
    }
}

/// A failed step of the motion sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SequenceError {
    /// A layer refused the request.
    #[error("{location}: command rejected: {description}")]
    CommandRejected {
        location: FailurePoint,
        description: String,
    },

    /// A wait for completion exceeded its bound.
    #[error("{location}: timed out: {description}")]
    Timeout {
        location: FailurePoint,
        description: String,
    },

    /// Parameters inconsistent with the mechanism or kinematic model.
    #[error("{location}: configuration mismatch: {description}")]
    ConfigurationMismatch {
        location: FailurePoint,
        description: String,
    },

    /// A named resource could not be reached.
    #[error("{location}: resource unavailable: {description}")]
    ResourceUnavailable {
        location: FailurePoint,
        description: String,
    },
}

impl SequenceError {
    /// Build an error of `kind`.
    pub fn new(kind: ErrorKind, location: FailurePoint, description: impl Into<String>) -> Self {
        let description = description.into();
        match kind {
            ErrorKind::CommandRejected => Self::CommandRejected {
                location,
                description,
            },
            ErrorKind::Timeout => Self::Timeout {
                location,
                description,
            },
            ErrorKind::ConfigurationMismatch => Self::ConfigurationMismatch {
                location,
                description,
            },
            ErrorKind::ResourceUnavailable => Self::ResourceUnavailable {
                location,
                description,
            },
        }
    }

    /// Translate a vendor status, describing it through the stack.
    pub fn from_vendor(stack: &dyn MotionStack, location: FailurePoint, status: VendorStatus) -> Self {
        let kind = ErrorKind::classify(status.kind, location.step);
        Self::new(kind, location, stack.status_string(&status))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CommandRejected { .. } => ErrorKind::CommandRejected,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::ConfigurationMismatch { .. } => ErrorKind::ConfigurationMismatch,
            Self::ResourceUnavailable { .. } => ErrorKind::ResourceUnavailable,
        }
    }

    pub fn location(&self) -> &FailurePoint {
        match self {
            Self::CommandRejected { location, .. }
            | Self::Timeout { location, .. }
            | Self::ConfigurationMismatch { location, .. }
            | Self::ResourceUnavailable { location, .. } => location,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::CommandRejected { description, .. }
            | Self::Timeout { description, .. }
            | Self::ConfigurationMismatch { description, .. }
            | Self::ResourceUnavailable { description, .. } => description,
        }
    }
}

/// Log a failure point and build its error.
pub(crate) fn vendor_failure(
    stack: &dyn MotionStack,
    entity: &str,
    step: Step,
    status: VendorStatus,
) -> SequenceError {
    let err = SequenceError::from_vendor(stack, FailurePoint::new(entity, step), status);
    error!(location = %err.location(), status = err.description(), "{}", err);
    err
}

/// Log and build a failure the sequencer raises itself.
pub(crate) fn local_failure(
    kind: ErrorKind,
    entity: &str,
    step: Step,
    description: impl Into<String>,
) -> SequenceError {
    let err = SequenceError::new(kind, FailurePoint::new(entity, step), description);
    error!(location = %err.location(), status = err.description(), "{}", err);
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_connect_is_unavailable() {
        assert_eq!(
            ErrorKind::classify(StatusKind::Rejected, Step::AxisConnect),
            ErrorKind::ResourceUnavailable
        );
        assert_eq!(
            ErrorKind::classify(StatusKind::Rejected, Step::AxisLock),
            ErrorKind::CommandRejected
        );
        assert_eq!(
            ErrorKind::classify(StatusKind::Timeout, Step::Wait(SyncRequest::Lock)),
            ErrorKind::Timeout
        );
        assert_eq!(
            ErrorKind::classify(StatusKind::Mismatch, Step::MechanismCreate),
            ErrorKind::ConfigurationMismatch
        );
    }

    #[test]
    fn display_names_location_and_status() {
        let err = SequenceError::new(
            ErrorKind::CommandRejected,
            FailurePoint::new("DEF_AXIS_2", Step::AxisLock),
            "wrong state",
        );
        assert_eq!(err.to_string(), "DEF_AXIS_2.lock: command rejected: wrong state");
        assert_eq!(err.kind(), ErrorKind::CommandRejected);
        assert_eq!(err.location().step, Step::AxisLock);
    }

    #[test]
    fn wait_steps_name_their_request() {
        assert_eq!(Step::Wait(SyncRequest::HomingCompleted).to_string(), "wait_homing_completed");
    }
}
