//! Per-axis controller.
//!
//! `AxisController` owns one axis record for the whole run. State-changing
//! commands only submit a request to the drive; they hand back a
//! [`Pending`] token that must be waited on with [`AxisController::wait`].
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected ─connect─► Idle ─initialize─► Initializing ─align─► Aligning
//!                                                  │                  │
//!                                                  └──────lock────────┤
//!                                                                     ▼
//!            Ready ◄─wait complete─ Homing ◄─────────home────────── Locking
//!              │ ▲
//!       motion │ │ wait complete
//!              ▼ │
//!            Moving ─quick_stop─► Stopping
//!
//! any wait timeout ─► Faulted ─reset (once)─► Initializing
//! ```

use crate::error::{local_failure, vendor_failure, ErrorKind, SequenceError, Step};
use gantry_common::motion::{
    AxisHandle, DriveState, DriveStatus, MotorType, ParameterSource, SyncRequest, WaitTimeout,
};
use gantry_common::stack::{MotionStack, StatusKind, VendorStatus};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

// ─── Lifecycle phase ────────────────────────────────────────────────

/// Lifecycle phase of one axis, derived from a fresh drive read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisState {
    Disconnected,
    Idle,
    Initializing,
    Aligning,
    Locking,
    Homing,
    Ready,
    Moving,
    Stopping,
    Faulted,
}

impl AxisState {
    /// Map a drive report to a lifecycle phase.
    ///
    /// An in-flight request decides the phase; a settled drive maps by state.
    pub const fn from_drive(status: DriveStatus) -> Self {
        match status.pending {
            Some(SyncRequest::Initialize) => Self::Initializing,
            Some(SyncRequest::AlignMotor) => Self::Aligning,
            Some(SyncRequest::Lock) => Self::Locking,
            Some(SyncRequest::HomingCompleted) => Self::Homing,
            Some(SyncRequest::MotionStopped | SyncRequest::Shutdown) => Self::Stopping,
            Some(SyncRequest::Reset) => Self::Faulted,
            None => match status.state {
                DriveState::Idle => Self::Idle,
                DriveState::Inactive => Self::Initializing,
                DriveState::Free => Self::Aligning,
                DriveState::Locked => Self::Locking,
                DriveState::Ready => Self::Ready,
                DriveState::Moving => Self::Moving,
                DriveState::Stopping => Self::Stopping,
                DriveState::Error => Self::Faulted,
            },
        }
    }
}

impl fmt::Display for AxisState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ─── Record ─────────────────────────────────────────────────────────

/// Everything known about one axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisRecord {
    pub name: String,
    pub handle: Option<AxisHandle>,
    /// True only between a successful connect and a successful disconnect.
    pub connected: bool,
    pub last_state: AxisState,
    /// Last raw drive report.
    pub drive: Option<DriveStatus>,
    /// Read from the axis configuration; `None` until read.
    pub motor_type: Option<MotorType>,
}

impl AxisRecord {
    fn new(name: String) -> Self {
        Self {
            name,
            handle: None,
            connected: false,
            last_state: AxisState::Disconnected,
            drive: None,
            motor_type: None,
        }
    }
}

/// A request submitted to a drive and not yet waited on.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a submitted request must be waited on with AxisController::wait"]
pub struct Pending {
    request: SyncRequest,
}

impl Pending {
    pub fn request(&self) -> SyncRequest {
        self.request
    }
}

// ─── Controller ─────────────────────────────────────────────────────

/// Controller for one axis.
#[derive(Debug, Clone)]
pub struct AxisController {
    record: AxisRecord,
    /// `reset()` has been issued this run.
    reset_used: bool,
    /// A reset wait timed out; lifecycle commands are refused for the rest of the run.
    terminal: bool,
    /// Referenced by a live mechanism.
    bound: bool,
}

impl AxisController {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            record: AxisRecord::new(name.into()),
            reset_used: false,
            terminal: false,
            bound: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn record(&self) -> &AxisRecord {
        &self.record
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.record.connected
    }

    /// Last known lifecycle phase.
    #[inline]
    pub fn state(&self) -> AxisState {
        self.record.last_state
    }

    pub fn handle(&self) -> Option<AxisHandle> {
        self.record.handle
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub(crate) fn set_bound(&mut self, bound: bool) {
        self.bound = bound;
    }

    fn fail(&self, kind: ErrorKind, step: Step, description: impl Into<String>) -> SequenceError {
        local_failure(kind, &self.record.name, step, description)
    }

    /// Handle of a connected axis that still accepts lifecycle commands.
    fn live_handle(&self, step: Step) -> Result<AxisHandle, SequenceError> {
        if self.terminal {
            return Err(self.fail(
                ErrorKind::CommandRejected,
                step,
                "axis is out of service after a failed reset",
            ));
        }
        self.connected_handle(step)
    }

    fn connected_handle(&self, step: Step) -> Result<AxisHandle, SequenceError> {
        match (self.record.connected, self.record.handle) {
            (true, Some(handle)) => Ok(handle),
            _ => Err(self.fail(ErrorKind::CommandRejected, step, "axis is not connected")),
        }
    }

    /// Submit `request` through `command`.
    fn submit(
        &mut self,
        stack: &mut dyn MotionStack,
        step: Step,
        request: SyncRequest,
        command: fn(&mut dyn MotionStack, AxisHandle) -> Result<(), VendorStatus>,
    ) -> Result<Pending, SequenceError> {
        let handle = self.live_handle(step)?;
        debug!(axis = %self.record.name, %step, "submit");
        command(stack, handle)
            .map_err(|status| vendor_failure(stack, &self.record.name, step, status))?;
        Ok(Pending { request })
    }

    // ─── Commands ───────────────────────────────────────────────────

    /// Connect to the axis by name and read its drive.
    ///
    /// An already connected axis is only re-read. When the read fails the
    /// axis stays connected so tear-down can still release it.
    pub fn connect(&mut self, stack: &mut dyn MotionStack) -> Result<DriveStatus, SequenceError> {
        if !self.record.connected {
            debug!(axis = %self.record.name, "connect");
            let handle = stack.axis_connect(&self.record.name).map_err(|status| {
                vendor_failure(stack, &self.record.name, Step::AxisConnect, status)
            })?;
            self.record.handle = Some(handle);
            self.record.connected = true;
            info!(axis = %self.record.name, %handle, "Axis connected");
        }
        self.read_drive(stack)
    }

    /// Read the drive and refresh the record.
    pub fn read_drive(&mut self, stack: &mut dyn MotionStack) -> Result<DriveStatus, SequenceError> {
        let handle = self.connected_handle(Step::AxisReadState)?;
        let status = stack
            .axis_read_state(handle)
            .map_err(|status| vendor_failure(stack, &self.record.name, Step::AxisReadState, status))?;
        self.record.drive = Some(status);
        self.record.last_state = AxisState::from_drive(status);
        Ok(status)
    }

    /// Current lifecycle phase; `Disconnected` without touching the drive
    /// when the axis is not connected.
    pub fn read_state(&mut self, stack: &mut dyn MotionStack) -> Result<AxisState, SequenceError> {
        if !self.record.connected {
            return Ok(AxisState::Disconnected);
        }
        self.read_drive(stack)?;
        Ok(self.record.last_state)
    }

    /// Load parameters from flash. Only legal from `Idle`.
    pub fn initialize(&mut self, stack: &mut dyn MotionStack) -> Result<Pending, SequenceError> {
        if self.record.last_state != AxisState::Idle {
            return Err(self.fail(
                ErrorKind::CommandRejected,
                Step::AxisInitialize,
                format!("initialize needs Idle, axis is {}", self.record.last_state),
            ));
        }
        self.submit(stack, Step::AxisInitialize, SyncRequest::Initialize, |s, h| {
            s.axis_initialize(h, ParameterSource::Flash)
        })
    }

    /// Read the motor type from the axis configuration.
    pub fn read_configuration(
        &mut self,
        stack: &mut dyn MotionStack,
    ) -> Result<MotorType, SequenceError> {
        let handle = self.live_handle(Step::AxisConfiguration)?;
        let config = stack.axis_configuration(handle).map_err(|status| {
            vendor_failure(stack, &self.record.name, Step::AxisConfiguration, status)
        })?;
        self.record.motor_type = Some(config.motor_type);
        Ok(config.motor_type)
    }

    /// Align the motor if its type needs it.
    ///
    /// Returns `None` when no alignment is required.
    pub fn align_if_required(
        &mut self,
        stack: &mut dyn MotionStack,
    ) -> Result<Option<Pending>, SequenceError> {
        let motor_type = match self.record.motor_type {
            Some(motor_type) => motor_type,
            None => self.read_configuration(stack)?,
        };
        if !motor_type.requires_alignment() {
            debug!(axis = %self.record.name, ?motor_type, "No alignment required");
            return Ok(None);
        }
        self.submit(stack, Step::AxisAlignMotor, SyncRequest::AlignMotor, |s, h| {
            s.axis_align_motor(h)
        })
        .map(Some)
    }

    pub fn lock(&mut self, stack: &mut dyn MotionStack) -> Result<Pending, SequenceError> {
        self.submit(stack, Step::AxisLock, SyncRequest::Lock, |s, h| s.axis_lock(h))
    }

    pub fn home(&mut self, stack: &mut dyn MotionStack) -> Result<Pending, SequenceError> {
        self.submit(stack, Step::AxisHome, SyncRequest::HomingCompleted, |s, h| {
            s.axis_home(h)
        })
    }

    /// Abrupt halt of in-progress motion. Only legal from `Moving`.
    pub fn quick_stop(&mut self, stack: &mut dyn MotionStack) -> Result<Pending, SequenceError> {
        if self.record.last_state != AxisState::Moving {
            return Err(self.fail(
                ErrorKind::CommandRejected,
                Step::AxisQuickStop,
                format!("quick-stop needs Moving, axis is {}", self.record.last_state),
            ));
        }
        self.submit(stack, Step::AxisQuickStop, SyncRequest::MotionStopped, |s, h| {
            s.axis_quick_stop(h)
        })
    }

    /// Token for waiting on an axis that is already moving to stop by itself.
    pub fn observe_motion_stop(&self) -> Pending {
        Pending {
            request: SyncRequest::MotionStopped,
        }
    }

    /// Clear a fault. Allowed once per run.
    pub fn reset(&mut self, stack: &mut dyn MotionStack) -> Result<Pending, SequenceError> {
        if self.reset_used {
            return Err(self.fail(
                ErrorKind::CommandRejected,
                Step::AxisReset,
                "reset already used this run",
            ));
        }
        let pending = self.submit(stack, Step::AxisReset, SyncRequest::Reset, |s, h| {
            s.axis_reset(h)
        })?;
        self.reset_used = true;
        Ok(pending)
    }

    /// Power the axis down. Still attempted on an out-of-service axis.
    pub fn shutdown(&mut self, stack: &mut dyn MotionStack) -> Result<Pending, SequenceError> {
        let handle = self.connected_handle(Step::AxisShutdown)?;
        debug!(axis = %self.record.name, "shutdown");
        stack
            .axis_shutdown(handle)
            .map_err(|status| vendor_failure(stack, &self.record.name, Step::AxisShutdown, status))?;
        Ok(Pending {
            request: SyncRequest::Shutdown,
        })
    }

    /// Release the axis.
    ///
    /// A no-op on a disconnected axis. Refused while a live mechanism
    /// references the axis. On failure the axis stays connected.
    pub fn disconnect(&mut self, stack: &mut dyn MotionStack) -> Result<(), SequenceError> {
        if !self.record.connected {
            return Ok(());
        }
        if self.bound {
            return Err(self.fail(
                ErrorKind::CommandRejected,
                Step::AxisDisconnect,
                "axis is bound to a live mechanism",
            ));
        }
        let handle = self.connected_handle(Step::AxisDisconnect)?;
        debug!(axis = %self.record.name, "disconnect");
        stack.axis_disconnect(handle).map_err(|status| {
            vendor_failure(stack, &self.record.name, Step::AxisDisconnect, status)
        })?;
        self.record.connected = false;
        self.record.handle = None;
        self.record.drive = None;
        self.record.last_state = AxisState::Disconnected;
        info!(axis = %self.record.name, "Axis disconnected");
        Ok(())
    }

    /// Wait for a submitted request to complete, then re-read the drive.
    ///
    /// A timeout leaves the axis `Faulted`; a timed-out reset also takes
    /// the axis out of service for the rest of the run.
    pub fn wait(
        &mut self,
        stack: &mut dyn MotionStack,
        pending: Pending,
        timeout: WaitTimeout,
    ) -> Result<(), SequenceError> {
        let step = Step::Wait(pending.request);
        let handle = self.connected_handle(step)?;
        debug!(axis = %self.record.name, request = pending.request.as_str(), %timeout, "wait");
        match stack.axis_synchronize(handle, pending.request, timeout) {
            Ok(()) => {
                self.read_drive(stack)?;
                Ok(())
            }
            Err(status) => {
                if status.kind == StatusKind::Timeout {
                    self.record.last_state = AxisState::Faulted;
                    if pending.request == SyncRequest::Reset {
                        warn!(axis = %self.record.name, "Reset timed out, axis out of service");
                        self.terminal = true;
                    }
                }
                Err(vendor_failure(stack, &self.record.name, step, status))
            }
        }
    }

    /// Submit through `command` and wait for it.
    pub fn run(
        &mut self,
        stack: &mut dyn MotionStack,
        command: fn(&mut Self, &mut dyn MotionStack) -> Result<Pending, SequenceError>,
        timeout: WaitTimeout,
    ) -> Result<(), SequenceError> {
        let pending = command(self, stack)?;
        self.wait(stack, pending, timeout)
    }
}
