//! Simulation stack implementation.
//!
//! The `SimulationStack` implements the `MotionStack` trait with
//! deterministic in-process drives, nodes and kinematics. Every call is
//! recorded so tests can assert on the exact command sequence.

use super::axis::{SimAxis, SimAxisSetup};
use super::faults::{Fault, FaultPlan, FaultPoint};
use super::kinematics;
use super::status;
use gantry_common::mechanism::{KinematicModel, MechanismId, MechanismSpec, Pose};
use gantry_common::motion::{
    AxisConfiguration, AxisHandle, DriveState, DriveStatus, HostMode, NodeHandle,
    ParameterSource, SyncRequest, WaitTimeout,
};
use gantry_common::stack::{MotionStack, StatusKind, VendorStatus};
use gantry_common::trajectory::{
    CircleTrajectory, InverseKinematicsRequest, JointMotionBuffers, PathSplines,
};
use std::collections::HashMap;
use tracing::{debug, info};

/// One recorded vendor call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimCall {
    pub op: &'static str,
    /// Axis or node name, or "host"/"mechanism".
    pub target: String,
}

#[derive(Debug, Clone)]
struct SimNode {
    name: String,
    handle: Option<NodeHandle>,
}

#[derive(Debug, Clone)]
struct SimMechanism {
    spec: MechanismSpec,
    model_defined: bool,
    /// Sample period of the last planned path [s].
    spline_time: f64,
    streamed: Option<JointMotionBuffers>,
}

/// Simulation stack implementing the MotionStack trait.
pub struct SimulationStack {
    host: Option<HostMode>,
    nodes: Vec<SimNode>,
    axes: Vec<SimAxis>,
    mechanisms: HashMap<MechanismId, SimMechanism>,
    next_handle: u32,
    faults: FaultPlan,
    calls: Vec<SimCall>,
}

fn rejected(code: u32) -> VendorStatus {
    VendorStatus::new(StatusKind::Rejected, code)
}

impl SimulationStack {
    /// Empty stack with no drives or nodes on the bus.
    pub fn empty() -> Self {
        Self {
            host: None,
            nodes: Vec::new(),
            axes: Vec::new(),
            mechanisms: HashMap::new(),
            next_handle: 1,
            faults: FaultPlan::default(),
            calls: Vec::new(),
        }
    }

    /// The reference cell: node `NY4112_node` and four idle brushless-AC axes
    /// `DEF_AXIS_1`..`DEF_AXIS_4`.
    pub fn new() -> Self {
        let mut stack = Self::empty().with_node("NY4112_node");
        for n in 1..=4 {
            stack = stack.with_axis(SimAxisSetup::new(format!("DEF_AXIS_{n}")));
        }
        stack
    }

    pub fn with_node(mut self, name: impl Into<String>) -> Self {
        self.nodes.push(SimNode {
            name: name.into(),
            handle: None,
        });
        self
    }

    /// Add a drive, replacing any drive with the same name.
    pub fn with_axis(mut self, setup: SimAxisSetup) -> Self {
        self.axes.retain(|a| a.name() != setup.name);
        self.axes.push(SimAxis::new(&setup));
        self
    }

    /// Arm a persistent fault.
    pub fn inject(&mut self, target: Option<&str>, point: FaultPoint) {
        self.faults.arm(Fault {
            target: target.map(str::to_string),
            point,
            remaining: None,
        });
    }

    /// Arm a fault that fires once.
    pub fn inject_once(&mut self, target: Option<&str>, point: FaultPoint) {
        self.faults.arm(Fault {
            target: target.map(str::to_string),
            point,
            remaining: Some(1),
        });
    }

    pub fn clear_faults(&mut self) {
        self.faults.clear();
    }

    // ─── Inspection ─────────────────────────────────────────────────

    pub fn calls(&self) -> &[SimCall] {
        &self.calls
    }

    /// Operations issued against one target, in order.
    pub fn calls_for(&self, target: &str) -> Vec<&'static str> {
        self.calls
            .iter()
            .filter(|c| c.target == target)
            .map(|c| c.op)
            .collect()
    }

    pub fn host_initialized(&self) -> bool {
        self.host.is_some()
    }

    pub fn axis_state(&self, name: &str) -> Option<DriveState> {
        self.axes.iter().find(|a| a.name() == name).map(SimAxis::state)
    }

    pub fn is_axis_connected(&self, name: &str) -> bool {
        self.axes
            .iter()
            .any(|a| a.name() == name && a.handle().is_some())
    }

    pub fn is_node_connected(&self, name: &str) -> bool {
        self.nodes
            .iter()
            .any(|n| n.name == name && n.handle.is_some())
    }

    pub fn live_mechanisms(&self) -> usize {
        self.mechanisms.len()
    }

    // ─── Internals ──────────────────────────────────────────────────

    fn record(&mut self, op: &'static str, target: &str) {
        debug!(op, target, "sim call");
        self.calls.push(SimCall {
            op,
            target: target.to_string(),
        });
    }

    fn require_host(&self) -> Result<(), VendorStatus> {
        match self.host {
            Some(_) => Ok(()),
            None => Err(rejected(status::HOST_NOT_INITIALIZED)),
        }
    }

    fn allocate_handle(&mut self) -> u32 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }

    fn axis_index(&self, handle: AxisHandle) -> Result<usize, VendorStatus> {
        self.axes
            .iter()
            .position(|a| a.handle() == Some(handle))
            .ok_or_else(|| rejected(status::INVALID_HANDLE))
    }

    /// Record the call, check host and handle, and trip any armed fault.
    fn axis_call(
        &mut self,
        op: &'static str,
        axis: AxisHandle,
        point: FaultPoint,
    ) -> Result<usize, VendorStatus> {
        let index = self.axis_index(axis);
        let name = match &index {
            Ok(i) => self.axes[*i].name().to_string(),
            Err(_) => axis.to_string(),
        };
        self.record(op, &name);
        self.require_host()?;
        let index = index?;
        if let Some(status) = self.faults.trip(point, Some(&name)) {
            return Err(status);
        }
        Ok(index)
    }

    fn mechanism_call(
        &mut self,
        op: &'static str,
        mechanism: MechanismId,
        point: FaultPoint,
    ) -> Result<(), VendorStatus> {
        self.record(op, "mechanism");
        self.require_host()?;
        if !self.mechanisms.contains_key(&mechanism) {
            return Err(rejected(status::INVALID_HANDLE));
        }
        match self.faults.trip(point, None) {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }

    fn joint_indices(&self, spec: &MechanismSpec) -> Result<Vec<usize>, VendorStatus> {
        spec.joints.iter().map(|&h| self.axis_index(h)).collect()
    }
}

impl Default for SimulationStack {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionStack for SimulationStack {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn init_host(&mut self, mode: HostMode) -> Result<(), VendorStatus> {
        self.record("init_host", "host");
        if let Some(status) = self.faults.trip(FaultPoint::InitHost, None) {
            return Err(status);
        }
        if self.host.is_some() {
            return Err(rejected(status::HOST_ALREADY_INITIALIZED));
        }
        info!(?mode, axes = self.axes.len(), nodes = self.nodes.len(), "Simulation host up");
        self.host = Some(mode);
        Ok(())
    }

    fn term_host(&mut self) -> Result<(), VendorStatus> {
        self.record("term_host", "host");
        self.require_host()?;
        if let Some(status) = self.faults.trip(FaultPoint::TermHost, None) {
            return Err(status);
        }
        self.host = None;
        Ok(())
    }

    fn status_string(&self, status: &VendorStatus) -> String {
        format!("{} (0x{:08X})", status::describe(status.code), status.code)
    }

    fn node_connect(&mut self, name: &str) -> Result<NodeHandle, VendorStatus> {
        self.record("node_connect", name);
        self.require_host()?;
        if let Some(status) = self.faults.trip(FaultPoint::NodeConnect, Some(name)) {
            return Err(status);
        }
        let index = self
            .nodes
            .iter()
            .position(|n| n.name == name)
            .ok_or(VendorStatus::new(StatusKind::Unavailable, status::NOT_FOUND))?;
        if self.nodes[index].handle.is_some() {
            return Err(rejected(status::ALREADY_CONNECTED));
        }
        let handle = NodeHandle(self.allocate_handle());
        self.nodes[index].handle = Some(handle);
        Ok(handle)
    }

    fn node_disconnect(&mut self, node: NodeHandle) -> Result<(), VendorStatus> {
        let index = self.nodes.iter().position(|n| n.handle == Some(node));
        let name = index.map_or_else(|| node.to_string(), |i| self.nodes[i].name.clone());
        self.record("node_disconnect", &name);
        self.require_host()?;
        let index = index.ok_or(rejected(status::INVALID_HANDLE))?;
        if let Some(status) = self.faults.trip(FaultPoint::NodeDisconnect, Some(&name)) {
            return Err(status);
        }
        self.nodes[index].handle = None;
        Ok(())
    }

    fn axis_connect(&mut self, name: &str) -> Result<AxisHandle, VendorStatus> {
        self.record("axis_connect", name);
        self.require_host()?;
        if let Some(status) = self.faults.trip(FaultPoint::AxisConnect, Some(name)) {
            return Err(status);
        }
        let index = self
            .axes
            .iter()
            .position(|a| a.name() == name)
            .ok_or(VendorStatus::new(StatusKind::Unavailable, status::NOT_FOUND))?;
        if self.axes[index].handle().is_some() {
            return Err(rejected(status::ALREADY_CONNECTED));
        }
        let handle = AxisHandle(self.allocate_handle());
        self.axes[index].set_handle(Some(handle));
        Ok(handle)
    }

    fn axis_initialize(
        &mut self,
        axis: AxisHandle,
        _source: ParameterSource,
    ) -> Result<(), VendorStatus> {
        let i = self.axis_call("axis_initialize", axis, FaultPoint::AxisInitialize)?;
        self.axes[i].initialize()
    }

    fn axis_synchronize(
        &mut self,
        axis: AxisHandle,
        request: SyncRequest,
        _timeout: WaitTimeout,
    ) -> Result<(), VendorStatus> {
        let index = self.axis_index(axis);
        let name = match &index {
            Ok(i) => self.axes[*i].name().to_string(),
            Err(_) => axis.to_string(),
        };
        self.record(sync_op(request), &name);
        self.require_host()?;
        let i = index?;
        let stalled = self
            .faults
            .trip(FaultPoint::Stall(request), Some(&name))
            .is_some();
        self.axes[i].synchronize(request, stalled)
    }

    fn axis_configuration(&mut self, axis: AxisHandle) -> Result<AxisConfiguration, VendorStatus> {
        let i = self.axis_call("axis_configuration", axis, FaultPoint::AxisConfiguration)?;
        Ok(AxisConfiguration {
            motor_type: self.axes[i].motor_type(),
        })
    }

    fn axis_align_motor(&mut self, axis: AxisHandle) -> Result<(), VendorStatus> {
        let i = self.axis_call("axis_align_motor", axis, FaultPoint::AxisAlignMotor)?;
        self.axes[i].align_motor()
    }

    fn axis_lock(&mut self, axis: AxisHandle) -> Result<(), VendorStatus> {
        let i = self.axis_call("axis_lock", axis, FaultPoint::AxisLock)?;
        self.axes[i].lock()
    }

    fn axis_home(&mut self, axis: AxisHandle) -> Result<(), VendorStatus> {
        let i = self.axis_call("axis_home", axis, FaultPoint::AxisHome)?;
        self.axes[i].home()
    }

    fn axis_read_state(&mut self, axis: AxisHandle) -> Result<DriveStatus, VendorStatus> {
        let i = self.axis_call("axis_read_state", axis, FaultPoint::AxisReadState)?;
        Ok(self.axes[i].status())
    }

    fn axis_quick_stop(&mut self, axis: AxisHandle) -> Result<(), VendorStatus> {
        let i = self.axis_call("axis_quick_stop", axis, FaultPoint::AxisQuickStop)?;
        self.axes[i].quick_stop()
    }

    fn axis_reset(&mut self, axis: AxisHandle) -> Result<(), VendorStatus> {
        let i = self.axis_call("axis_reset", axis, FaultPoint::AxisReset)?;
        self.axes[i].reset()
    }

    fn axis_shutdown(&mut self, axis: AxisHandle) -> Result<(), VendorStatus> {
        let i = self.axis_call("axis_shutdown", axis, FaultPoint::AxisShutdown)?;
        self.axes[i].shutdown()
    }

    fn axis_disconnect(&mut self, axis: AxisHandle) -> Result<(), VendorStatus> {
        let i = self.axis_call("axis_disconnect", axis, FaultPoint::AxisDisconnect)?;
        self.axes[i].set_handle(None);
        Ok(())
    }

    fn mechanism_create(&mut self, spec: &MechanismSpec) -> Result<MechanismId, VendorStatus> {
        self.record("mechanism_create", "mechanism");
        self.require_host()?;
        if let Some(status) = self.faults.trip(FaultPoint::MechanismCreate, None) {
            return Err(status);
        }
        let joints = self.joint_indices(spec)?;
        if joints.iter().any(|&i| self.axes[i].state() != DriveState::Ready) {
            return Err(rejected(status::WRONG_STATE));
        }
        if spec.model.check_binding(spec.dof, spec.joints.len()).is_err() {
            return Err(VendorStatus::new(StatusKind::Mismatch, status::BINDING_MISMATCH));
        }
        let id = MechanismId(self.allocate_handle());
        self.mechanisms.insert(
            id,
            SimMechanism {
                spec: spec.clone(),
                model_defined: false,
                spline_time: 0.0,
                streamed: None,
            },
        );
        Ok(id)
    }

    fn mechanism_delete(&mut self, mechanism: MechanismId) -> Result<(), VendorStatus> {
        self.mechanism_call("mechanism_delete", mechanism, FaultPoint::MechanismDelete)?;
        self.mechanisms.remove(&mechanism);
        Ok(())
    }

    fn define_kinematic_model(
        &mut self,
        mechanism: MechanismId,
        model: KinematicModel,
    ) -> Result<(), VendorStatus> {
        self.mechanism_call(
            "define_kinematic_model",
            mechanism,
            FaultPoint::DefineKinematicModel,
        )?;
        let mech = self
            .mechanisms
            .get_mut(&mechanism)
            .ok_or(rejected(status::INVALID_HANDLE))?;
        if mech.spec.model != model {
            return Err(VendorStatus::new(StatusKind::Mismatch, status::BINDING_MISMATCH));
        }
        mech.model_defined = true;
        Ok(())
    }

    fn current_position(&mut self, mechanism: MechanismId) -> Result<Pose, VendorStatus> {
        self.mechanism_call("current_position", mechanism, FaultPoint::CurrentPosition)?;
        let spec = self
            .mechanisms
            .get(&mechanism)
            .map(|m| m.spec.clone())
            .ok_or(rejected(status::INVALID_HANDLE))?;
        let joints: Vec<f64> = self
            .joint_indices(&spec)?
            .into_iter()
            .map(|i| self.axes[i].position())
            .collect();
        Ok(kinematics::forward(spec.model, spec.dof, &joints))
    }

    fn plan_circle(
        &mut self,
        mechanism: MechanismId,
        params: &CircleTrajectory,
    ) -> Result<PathSplines, VendorStatus> {
        self.mechanism_call("plan_circle", mechanism, FaultPoint::PlanTrajectory)?;
        let path = kinematics::plan_circle(params)?;
        debug!(
            samples = path.len(),
            duration_s = kinematics::path_duration(&path),
            "Circle planned"
        );
        if let Some(mech) = self.mechanisms.get_mut(&mechanism) {
            mech.spline_time = path.spline_time;
        }
        Ok(path)
    }

    fn solve_inverse_kinematics(
        &mut self,
        mechanism: MechanismId,
        path: &PathSplines,
        request: &InverseKinematicsRequest,
    ) -> Result<JointMotionBuffers, VendorStatus> {
        self.mechanism_call(
            "solve_inverse_kinematics",
            mechanism,
            FaultPoint::InverseKinematics,
        )?;
        let mech = self
            .mechanisms
            .get(&mechanism)
            .ok_or(rejected(status::INVALID_HANDLE))?;
        if !mech.model_defined {
            return Err(rejected(status::WRONG_STATE));
        }
        kinematics::inverse(mech.spec.model, mech.spec.dof, path, request)
    }

    fn stream_motion(
        &mut self,
        mechanism: MechanismId,
        buffers: &JointMotionBuffers,
    ) -> Result<(), VendorStatus> {
        self.mechanism_call("stream_motion", mechanism, FaultPoint::StreamMotion)?;
        let spec = self
            .mechanisms
            .get(&mechanism)
            .map(|m| m.spec.clone())
            .ok_or(rejected(status::INVALID_HANDLE))?;
        if buffers.joints.len() != spec.joints.len() {
            return Err(VendorStatus::new(StatusKind::Mismatch, status::BINDING_MISMATCH));
        }
        let joints = self.joint_indices(&spec)?;
        if joints.iter().any(|&i| self.axes[i].state() != DriveState::Ready) {
            return Err(rejected(status::WRONG_STATE));
        }
        for &i in &joints {
            self.axes[i].begin_motion()?;
        }
        if let Some(mech) = self.mechanisms.get_mut(&mechanism) {
            mech.streamed = Some(buffers.clone());
        }
        Ok(())
    }

    fn stream_synchronize(
        &mut self,
        mechanism: MechanismId,
        timeout: WaitTimeout,
    ) -> Result<(), VendorStatus> {
        self.mechanism_call(
            "stream_synchronize",
            mechanism,
            FaultPoint::StreamSynchronize,
        )?;
        let (spec, spline_time, streamed) = match self.mechanisms.get(&mechanism) {
            Some(m) => (m.spec.clone(), m.spline_time, m.streamed.clone()),
            None => return Err(rejected(status::INVALID_HANDLE)),
        };
        let buffers = streamed.ok_or(rejected(status::NO_TRAJECTORY))?;

        let samples = buffers.joints.first().map_or(0, |j| j.positions.len());
        let duration = samples.saturating_sub(1) as f64 * spline_time;
        if let Some(limit) = timeout.as_secs_f64() {
            if limit < duration {
                return Err(VendorStatus::new(StatusKind::Timeout, status::SYNC_TIMEOUT));
            }
        }

        let joints = self.joint_indices(&spec)?;
        for (&i, samples) in joints.iter().zip(&buffers.joints) {
            let end = samples.positions.last().copied().unwrap_or(0.0);
            self.axes[i].end_motion(end);
        }
        if let Some(mech) = self.mechanisms.get_mut(&mechanism) {
            mech.streamed = None;
        }
        Ok(())
    }
}

fn sync_op(request: SyncRequest) -> &'static str {
    match request {
        SyncRequest::Initialize => "sync_initialize",
        SyncRequest::AlignMotor => "sync_align_motor",
        SyncRequest::Lock => "sync_lock",
        SyncRequest::HomingCompleted => "sync_homing_completed",
        SyncRequest::MotionStopped => "sync_motion_stopped",
        SyncRequest::Reset => "sync_reset",
        SyncRequest::Shutdown => "sync_shutdown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calls_require_initialized_host() {
        let mut sim = SimulationStack::new();
        let err = sim.axis_connect("DEF_AXIS_1").unwrap_err();
        assert_eq!(err.code, status::HOST_NOT_INITIALIZED);
        sim.init_host(HostMode::Simulation).unwrap();
        assert!(sim.axis_connect("DEF_AXIS_1").is_ok());
        assert!(sim.is_axis_connected("DEF_AXIS_1"));
    }

    #[test]
    fn unknown_axis_is_unavailable() {
        let mut sim = SimulationStack::new();
        sim.init_host(HostMode::Simulation).unwrap();
        let err = sim.axis_connect("NO_SUCH_AXIS").unwrap_err();
        assert_eq!(err.kind, StatusKind::Unavailable);
    }

    #[test]
    fn double_connect_is_rejected() {
        let mut sim = SimulationStack::new();
        sim.init_host(HostMode::Simulation).unwrap();
        sim.node_connect("NY4112_node").unwrap();
        let err = sim.node_connect("NY4112_node").unwrap_err();
        assert_eq!(err.code, status::ALREADY_CONNECTED);
    }

    #[test]
    fn calls_are_recorded_per_target() {
        let mut sim = SimulationStack::new();
        sim.init_host(HostMode::Simulation).unwrap();
        let ax = sim.axis_connect("DEF_AXIS_2").unwrap();
        sim.axis_read_state(ax).unwrap();
        assert_eq!(sim.calls_for("DEF_AXIS_2"), vec!["axis_connect", "axis_read_state"]);
        assert_eq!(sim.calls_for("host"), vec!["init_host"]);
    }

    #[test]
    fn status_string_describes_code() {
        let sim = SimulationStack::new();
        let text = sim.status_string(&VendorStatus::new(StatusKind::Timeout, status::SYNC_TIMEOUT));
        assert!(text.contains("synchronization timed out"));
    }
}
