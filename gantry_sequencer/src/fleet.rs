//! Axis fleet: bring-up and tear-down across all axes.
//!
//! Bring-up is all-or-nothing: the first axis that fails aborts the fleet
//! and every axis connected so far is torn down again. Tear-down never
//! stops early: each axis gets its own outcome slot and the fleet result
//! is only aggregated after every axis has been attempted.

use crate::axis::{AxisController, AxisState};
use crate::error::{local_failure, ErrorKind, SequenceError, Step};
use crate::outcome::SequenceOutcome;
use gantry_common::motion::{AxisHandle, DriveState, DriveStatus, WaitTimeout};
use gantry_common::stack::MotionStack;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

// ─── Bring-up paths ─────────────────────────────────────────────────

/// What to do with an axis found moving at bring-up, once it has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MovingAxisPolicy {
    /// Only wait for the stop; the axis must then already be Ready.
    #[default]
    WaitOnly,
    /// Wait for the stop, then follow the path of the settled state.
    /// An axis that settles Ready is homed again.
    WaitThenRehome,
}

/// Bring-up path selected from the drive state found after connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BringUpPath {
    /// Idle: initialize, align when the motor needs it, lock, home.
    InitializeAlignLockHome,
    /// Initialized or aligned: lock, home.
    LockHome,
    /// Locked: home.
    HomeOnly,
    /// Moving: wait for the stop, then apply the [`MovingAxisPolicy`].
    AwaitStop,
    /// Ready: nothing to do.
    AlreadyReady,
    /// Faulted, stopping, or a request still in flight.
    Unsupported,
}

impl BringUpPath {
    pub const fn select(status: DriveStatus) -> Self {
        if status.pending.is_some() {
            return Self::Unsupported;
        }
        match status.state {
            DriveState::Idle => Self::InitializeAlignLockHome,
            DriveState::Inactive | DriveState::Free => Self::LockHome,
            DriveState::Locked => Self::HomeOnly,
            DriveState::Moving => Self::AwaitStop,
            DriveState::Ready => Self::AlreadyReady,
            DriveState::Stopping | DriveState::Error => Self::Unsupported,
        }
    }
}

/// Timeouts and policies applied by the fleet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FleetOptions {
    /// Bound for initialize, align, lock, home, reset and shutdown waits.
    pub lifecycle: WaitTimeout,
    /// Bound for motion-stopped waits.
    pub motion_stop: WaitTimeout,
    pub moving_axis_policy: MovingAxisPolicy,
    /// Pause after a successful bring-up.
    pub settle: Duration,
}

impl Default for FleetOptions {
    fn default() -> Self {
        Self {
            lifecycle: WaitTimeout::seconds(gantry_common::consts::DEFAULT_LIFECYCLE_TIMEOUT_S),
            motion_stop: WaitTimeout::seconds(gantry_common::consts::DEFAULT_MOTION_STOP_TIMEOUT_S),
            moving_axis_policy: MovingAxisPolicy::default(),
            settle: Duration::ZERO,
        }
    }
}

// ─── Tear-down report ───────────────────────────────────────────────

/// Tear-down outcome of one axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTearDown {
    pub axis: String,
    /// Phase read at the start of tear-down.
    pub observed: Option<AxisState>,
    /// Quick-stop and wait, when the axis was moving.
    pub quick_stop: Option<Result<(), SequenceError>>,
    /// Reset and wait, when the quick-stop wait timed out.
    pub reset: Option<Result<(), SequenceError>>,
    /// Shutdown, wait and disconnect.
    pub result: Result<(), SequenceError>,
}

impl AxisTearDown {
    fn new(axis: &str) -> Self {
        Self {
            axis: axis.to_string(),
            observed: None,
            quick_stop: None,
            reset: None,
            result: Ok(()),
        }
    }

    /// First failure of this axis, in execution order.
    pub fn first_error(&self) -> Option<&SequenceError> {
        [&self.quick_stop, &self.reset]
            .into_iter()
            .flatten()
            .chain(std::iter::once(&self.result))
            .find_map(|r| r.as_ref().err())
    }

    pub fn is_ok(&self) -> bool {
        self.first_error().is_none()
    }
}

/// Tear-down outcome of the whole fleet, one entry per axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TearDownReport {
    pub axes: Vec<AxisTearDown>,
}

impl TearDownReport {
    pub fn is_ok(&self) -> bool {
        self.axes.iter().all(AxisTearDown::is_ok)
    }

    pub fn first_error(&self) -> Option<&SequenceError> {
        self.axes.iter().find_map(AxisTearDown::first_error)
    }

    /// Names of the axes whose tear-down failed.
    pub fn failed_axes(&self) -> Vec<&str> {
        self.axes
            .iter()
            .filter(|a| !a.is_ok())
            .map(|a| a.axis.as_str())
            .collect()
    }
}

// ─── Fleet ──────────────────────────────────────────────────────────

/// All axes of one run, in a fixed order.
#[derive(Debug, Clone)]
pub struct AxisFleet {
    axes: Vec<AxisController>,
    options: FleetOptions,
    /// Tear-down done by the last aborted bring-up.
    abort_report: Option<TearDownReport>,
}

impl AxisFleet {
    pub fn new<S: AsRef<str>>(names: &[S], options: FleetOptions) -> Self {
        Self {
            axes: names.iter().map(|n| AxisController::new(n.as_ref())).collect(),
            options,
            abort_report: None,
        }
    }

    pub fn axes(&self) -> &[AxisController] {
        &self.axes
    }

    pub fn axes_mut(&mut self) -> &mut [AxisController] {
        &mut self.axes
    }

    pub fn axis(&self, name: &str) -> Option<&AxisController> {
        self.axes.iter().find(|a| a.name() == name)
    }

    pub fn options(&self) -> &FleetOptions {
        &self.options
    }

    /// Handles of every connected axis, in fleet order.
    pub fn handles(&self) -> Vec<AxisHandle> {
        self.axes.iter().filter_map(AxisController::handle).collect()
    }

    pub fn all_in(&self, state: AxisState) -> bool {
        self.axes.iter().all(|a| a.state() == state)
    }

    /// Tear-down report of the last aborted bring-up, if any.
    pub fn take_abort_report(&mut self) -> Option<TearDownReport> {
        self.abort_report.take()
    }

    /// Bring every axis to Ready, or leave every axis torn down.
    pub fn bring_up_all(&mut self, stack: &mut dyn MotionStack) -> Result<(), SequenceError> {
        info!(axes = self.axes.len(), "Bringing up axes");
        for index in 0..self.axes.len() {
            if let Err(err) = bring_up_axis(&mut self.axes[index], stack, &self.options) {
                warn!(
                    axis = %self.axes[index].name(),
                    "Bring-up aborted, tearing down connected axes"
                );
                let report = self.tear_down_all(stack);
                if !report.is_ok() {
                    warn!(failed = ?report.failed_axes(), "Tear-down after aborted bring-up incomplete");
                }
                self.abort_report = Some(report);
                return Err(err);
            }
        }
        if !self.options.settle.is_zero() {
            debug!(settle_ms = self.options.settle.as_millis() as u64, "Settling");
            std::thread::sleep(self.options.settle);
        }
        info!("All axes ready");
        Ok(())
    }

    /// Tear down every connected axis, each independently of the others.
    pub fn tear_down_all(&mut self, stack: &mut dyn MotionStack) -> TearDownReport {
        let axes = self
            .axes
            .iter_mut()
            .map(|axis| tear_down_axis(axis, stack, &self.options))
            .collect();
        let report = TearDownReport { axes };
        if report.is_ok() {
            info!("Axes torn down");
        } else {
            warn!(failed = ?report.failed_axes(), "Axis tear-down incomplete");
        }
        report
    }
}

fn bring_up_axis(
    axis: &mut AxisController,
    stack: &mut dyn MotionStack,
    options: &FleetOptions,
) -> Result<(), SequenceError> {
    let status = axis.connect(stack)?;
    let path = BringUpPath::select(status);
    info!(axis = %axis.name(), ?path, state = ?status.state, "Bring-up path");

    let follow_up = match path {
        BringUpPath::AwaitStop => {
            let pending = axis.observe_motion_stop();
            axis.wait(stack, pending, options.motion_stop)?;
            match options.moving_axis_policy {
                MovingAxisPolicy::WaitOnly => None,
                MovingAxisPolicy::WaitThenRehome => {
                    let settled = axis.read_drive(stack)?;
                    Some(match BringUpPath::select(settled) {
                        BringUpPath::AlreadyReady => BringUpPath::HomeOnly,
                        BringUpPath::AwaitStop => BringUpPath::Unsupported,
                        other => other,
                    })
                }
            }
        }
        other => Some(other),
    };

    if let Some(path) = follow_up {
        follow_path(axis, stack, path, options.lifecycle)?;
    }

    let state = axis.read_state(stack)?;
    if state != AxisState::Ready {
        return Err(local_failure(
            ErrorKind::CommandRejected,
            axis.name(),
            Step::BringUpCheck,
            format!("axis ended bring-up {state}, expected Ready"),
        ));
    }
    Ok(())
}

fn follow_path(
    axis: &mut AxisController,
    stack: &mut dyn MotionStack,
    path: BringUpPath,
    lifecycle: WaitTimeout,
) -> Result<(), SequenceError> {
    match path {
        BringUpPath::InitializeAlignLockHome => {
            axis.run(stack, AxisController::initialize, lifecycle)?;
            if let Some(pending) = axis.align_if_required(stack)? {
                axis.wait(stack, pending, lifecycle)?;
            }
            axis.run(stack, AxisController::lock, lifecycle)?;
            axis.run(stack, AxisController::home, lifecycle)
        }
        BringUpPath::LockHome => {
            axis.run(stack, AxisController::lock, lifecycle)?;
            axis.run(stack, AxisController::home, lifecycle)
        }
        BringUpPath::HomeOnly => axis.run(stack, AxisController::home, lifecycle),
        BringUpPath::AlreadyReady => Ok(()),
        BringUpPath::AwaitStop | BringUpPath::Unsupported => Err(local_failure(
            ErrorKind::CommandRejected,
            axis.name(),
            Step::BringUpCheck,
            format!("no bring-up path from {}", axis.state()),
        )),
    }
}

fn tear_down_axis(
    axis: &mut AxisController,
    stack: &mut dyn MotionStack,
    options: &FleetOptions,
) -> AxisTearDown {
    let mut entry = AxisTearDown::new(axis.name());
    if !axis.is_connected() {
        debug!(axis = %axis.name(), "Not connected, nothing to tear down");
        entry.observed = Some(AxisState::Disconnected);
        return entry;
    }

    let read = axis.read_state(stack);
    if matches!(read, Ok(AxisState::Moving)) {
        warn!(axis = %axis.name(), "Axis moving at tear-down, quick-stopping");
        let stop = axis.run(stack, AxisController::quick_stop, options.motion_stop);
        if matches!(&stop, Err(e) if e.kind() == ErrorKind::Timeout) {
            warn!(axis = %axis.name(), "Quick-stop timed out, resetting");
            entry.reset = Some(axis.run(stack, AxisController::reset, options.lifecycle));
        }
        entry.quick_stop = Some(stop);
    }

    let mut outcome = SequenceOutcome::new();
    outcome.step("shutdown", || {
        axis.run(stack, AxisController::shutdown, options.lifecycle)
    });
    outcome.step("disconnect", || axis.disconnect(stack));
    match read {
        Ok(state) => entry.observed = Some(state),
        Err(err) => outcome.record(Err(err)),
    }
    entry.result = outcome.into_result();
    entry
}
