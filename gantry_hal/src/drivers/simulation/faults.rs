//! Fault injection for the simulation stack.
//!
//! Tests arm faults against a call (optionally restricted to one axis or
//! node name). An armed fault makes the matching call fail with the
//! status a real stack would report for that situation.

use gantry_common::motion::SyncRequest;
use gantry_common::stack::{StatusKind, VendorStatus};

use super::status;

/// Vendor call a fault can be armed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
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
    /// The wait for this request never completes: it times out and the
    /// drive drops into its error state.
    Stall(SyncRequest),
    MechanismCreate,
    MechanismDelete,
    DefineKinematicModel,
    CurrentPosition,
    PlanTrajectory,
    InverseKinematics,
    StreamMotion,
    StreamSynchronize,
}

impl FaultPoint {
    /// Status reported when this fault fires.
    pub const fn status(&self) -> VendorStatus {
        match self {
            Self::NodeConnect | Self::AxisConnect => {
                VendorStatus::new(StatusKind::Unavailable, status::NOT_FOUND)
            }
            Self::Stall(_) | Self::StreamSynchronize => {
                VendorStatus::new(StatusKind::Timeout, status::SYNC_TIMEOUT)
            }
            Self::DefineKinematicModel | Self::InverseKinematics => {
                VendorStatus::new(StatusKind::Mismatch, status::KINEMATICS_FAILED)
            }
            _ => VendorStatus::new(StatusKind::Rejected, status::INJECTED_FAULT),
        }
    }
}

/// One armed fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// Axis or node name; `None` matches any target.
    pub target: Option<String>,
    pub point: FaultPoint,
    /// Remaining firings; `None` fires forever.
    pub remaining: Option<u32>,
}

/// Set of armed faults.
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    faults: Vec<Fault>,
}

impl FaultPlan {
    pub fn arm(&mut self, fault: Fault) {
        self.faults.push(fault);
    }

    pub fn clear(&mut self) {
        self.faults.clear();
    }

    /// Consume one firing of a fault matching `point` on `target`.
    pub fn trip(&mut self, point: FaultPoint, target: Option<&str>) -> Option<VendorStatus> {
        let index = self.faults.iter().position(|f| {
            f.point == point
                && match (&f.target, target) {
                    (None, _) => true,
                    (Some(want), Some(got)) => want == got,
                    (Some(_), None) => false,
                }
        })?;

        match self.faults[index].remaining {
            Some(0) => {
                self.faults.remove(index);
                return None;
            }
            Some(1) => {
                self.faults.remove(index);
            }
            Some(n) => self.faults[index].remaining = Some(n - 1),
            None => {}
        }
        Some(point.status())
    }
}
