//! Simulated servo drive.
//!
//! Commands are accepted only from the drive states a real servo accepts
//! them in. An accepted command leaves the request pending until the
//! matching synchronize call completes it.

use gantry_common::motion::{AxisHandle, DriveState, DriveStatus, MotorType, SyncRequest};
use gantry_common::stack::{StatusKind, VendorStatus};
use tracing::trace;

use super::status;

/// Start-up description of one simulated drive.
#[derive(Debug, Clone, PartialEq)]
pub struct SimAxisSetup {
    pub name: String,
    pub motor_type: MotorType,
    /// Drive state found when the axis is first connected.
    pub initial_state: DriveState,
}

impl SimAxisSetup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            motor_type: MotorType::BrushlessAc,
            initial_state: DriveState::Idle,
        }
    }

    pub fn motor_type(mut self, motor_type: MotorType) -> Self {
        self.motor_type = motor_type;
        self
    }

    pub fn initial_state(mut self, state: DriveState) -> Self {
        self.initial_state = state;
        self
    }
}

/// One simulated drive.
#[derive(Debug, Clone)]
pub struct SimAxis {
    name: String,
    motor_type: MotorType,
    handle: Option<AxisHandle>,
    state: DriveState,
    pending: Option<(SyncRequest, DriveState)>,
    /// Joint position [mm].
    position: f64,
}

fn wrong_state() -> VendorStatus {
    VendorStatus::new(StatusKind::Rejected, status::WRONG_STATE)
}

impl SimAxis {
    pub fn new(setup: &SimAxisSetup) -> Self {
        Self {
            name: setup.name.clone(),
            motor_type: setup.motor_type,
            handle: None,
            state: setup.initial_state,
            pending: None,
            position: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> Option<AxisHandle> {
        self.handle
    }

    pub fn set_handle(&mut self, handle: Option<AxisHandle>) {
        self.handle = handle;
    }

    pub fn motor_type(&self) -> MotorType {
        self.motor_type
    }

    pub fn state(&self) -> DriveState {
        self.state
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn set_position(&mut self, position: f64) {
        self.position = position;
    }

    pub fn status(&self) -> DriveStatus {
        DriveStatus {
            state: self.state,
            pending: self.pending.map(|(request, _)| request),
        }
    }

    /// Accept `request` if the drive is in one of `from`, completing into `to`.
    fn submit(
        &mut self,
        request: SyncRequest,
        from: &[DriveState],
        to: DriveState,
    ) -> Result<(), VendorStatus> {
        if self.pending.is_some() {
            return Err(VendorStatus::new(StatusKind::Rejected, status::REQUEST_PENDING));
        }
        if !from.contains(&self.state) {
            trace!(axis = %self.name, state = ?self.state, request = request.as_str(), "rejected");
            return Err(wrong_state());
        }
        self.pending = Some((request, to));
        Ok(())
    }

    pub fn initialize(&mut self) -> Result<(), VendorStatus> {
        self.submit(SyncRequest::Initialize, &[DriveState::Idle], DriveState::Inactive)
    }

    pub fn align_motor(&mut self) -> Result<(), VendorStatus> {
        self.submit(SyncRequest::AlignMotor, &[DriveState::Inactive], DriveState::Free)
    }

    pub fn lock(&mut self) -> Result<(), VendorStatus> {
        self.submit(
            SyncRequest::Lock,
            &[DriveState::Inactive, DriveState::Free],
            DriveState::Locked,
        )
    }

    pub fn home(&mut self) -> Result<(), VendorStatus> {
        self.submit(
            SyncRequest::HomingCompleted,
            &[DriveState::Locked, DriveState::Ready],
            DriveState::Ready,
        )?;
        self.position = 0.0;
        Ok(())
    }

    pub fn quick_stop(&mut self) -> Result<(), VendorStatus> {
        if self.state != DriveState::Moving {
            return Err(wrong_state());
        }
        // A quick-stop overrides whatever motion request was in flight.
        self.pending = Some((SyncRequest::MotionStopped, DriveState::Ready));
        self.state = DriveState::Stopping;
        Ok(())
    }

    pub fn reset(&mut self) -> Result<(), VendorStatus> {
        // Reset is accepted from any state and drops pending requests.
        self.pending = Some((SyncRequest::Reset, DriveState::Inactive));
        Ok(())
    }

    pub fn shutdown(&mut self) -> Result<(), VendorStatus> {
        if self.state == DriveState::Moving {
            return Err(wrong_state());
        }
        self.pending = None;
        self.submit(
            SyncRequest::Shutdown,
            &[
                DriveState::Idle,
                DriveState::Inactive,
                DriveState::Free,
                DriveState::Locked,
                DriveState::Ready,
                DriveState::Stopping,
                DriveState::Error,
            ],
            DriveState::Idle,
        )
    }

    /// Start streamed motion.
    pub fn begin_motion(&mut self) -> Result<(), VendorStatus> {
        if self.state != DriveState::Ready || self.pending.is_some() {
            return Err(wrong_state());
        }
        self.state = DriveState::Moving;
        Ok(())
    }

    /// Streamed motion finished at `position`.
    pub fn end_motion(&mut self, position: f64) {
        if self.state == DriveState::Moving {
            self.state = DriveState::Ready;
            self.position = position;
        }
    }

    /// Wait for `request`; `stalled` simulates a request that never completes.
    pub fn synchronize(&mut self, request: SyncRequest, stalled: bool) -> Result<(), VendorStatus> {
        if stalled {
            self.pending = None;
            self.state = DriveState::Error;
            return Err(VendorStatus::new(StatusKind::Timeout, status::SYNC_TIMEOUT));
        }
        match self.pending {
            Some((pending, to)) if pending == request => {
                self.pending = None;
                self.state = to;
                Ok(())
            }
            Some(_) => Err(VendorStatus::new(StatusKind::Rejected, status::REQUEST_PENDING)),
            // An axis found moving stops by itself at the end of its move.
            None if request == SyncRequest::MotionStopped && self.state == DriveState::Moving => {
                self.state = DriveState::Ready;
                Ok(())
            }
            // Nothing submitted, nothing to wait for.
            None => Err(wrong_state()),
        }
    }
}
