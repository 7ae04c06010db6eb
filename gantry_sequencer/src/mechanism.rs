//! Mechanism controller.
//!
//! Binds the fleet's axes into one kinematic unit and issues the motion
//! calls of the kinematics layer against it. While the mechanism is live
//! its joint axes refuse to disconnect.

use crate::axis::{AxisController, AxisState};
use crate::error::{local_failure, vendor_failure, ErrorKind, SequenceError, Step};
use gantry_common::mechanism::{DofMask, KinematicModel, MechanismId, MechanismSpec, Pose};
use gantry_common::stack::MotionStack;
use gantry_common::motion::WaitTimeout;
use gantry_common::trajectory::{
    CircleTrajectory, InverseKinematicsRequest, JointMotionBuffers, PathSplines,
};
use tracing::{debug, info};

const ENTITY: &str = "mechanism";

/// Controller for the single mechanism of a run.
#[derive(Debug, Clone, Default)]
pub struct MechanismController {
    id: Option<MechanismId>,
    spec: Option<MechanismSpec>,
}

impl MechanismController {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.id.is_some()
    }

    pub fn spec(&self) -> Option<&MechanismSpec> {
        self.spec.as_ref()
    }

    fn live_id(&self, step: Step) -> Result<MechanismId, SequenceError> {
        self.id.ok_or_else(|| {
            local_failure(ErrorKind::CommandRejected, ENTITY, step, "no live mechanism")
        })
    }

    /// Bind `joints` into a mechanism and select its kinematic model.
    ///
    /// Fails before reaching the vendor when the joint count does not fit
    /// the model or any joint is not Ready on a fresh read.
    pub fn create(
        &mut self,
        stack: &mut dyn MotionStack,
        joints: &mut [AxisController],
        dof: DofMask,
        model: KinematicModel,
    ) -> Result<(), SequenceError> {
        if self.id.is_some() {
            return Err(local_failure(
                ErrorKind::CommandRejected,
                ENTITY,
                Step::MechanismCreate,
                "mechanism already created",
            ));
        }
        model.check_binding(dof, joints.len()).map_err(|reason| {
            local_failure(ErrorKind::ConfigurationMismatch, ENTITY, Step::MechanismCreate, reason)
        })?;

        let mut handles = heapless::Vec::new();
        for axis in joints.iter_mut() {
            let state = axis.read_state(stack)?;
            let handle = match (state, axis.handle()) {
                (AxisState::Ready, Some(handle)) => handle,
                _ => {
                    return Err(local_failure(
                        ErrorKind::CommandRejected,
                        ENTITY,
                        Step::MechanismCreate,
                        format!("joint {} is {state}, expected Ready", axis.name()),
                    ));
                }
            };
            handles.push(handle).map_err(|_| {
                local_failure(
                    ErrorKind::ConfigurationMismatch,
                    ENTITY,
                    Step::MechanismCreate,
                    "too many joints",
                )
            })?;
        }

        let spec = MechanismSpec {
            joints: handles,
            dof,
            model,
        };
        debug!(joints = spec.joints.len(), %model, ?dof, "create mechanism");
        let id = stack
            .mechanism_create(&spec)
            .map_err(|status| vendor_failure(stack, ENTITY, Step::MechanismCreate, status))?;
        self.id = Some(id);
        self.spec = Some(spec);
        for axis in joints.iter_mut() {
            axis.set_bound(true);
        }
        info!(%model, joints = joints.len(), "Mechanism created");

        stack
            .define_kinematic_model(id, model)
            .map_err(|status| vendor_failure(stack, ENTITY, Step::DefineKinematicModel, status))
    }

    /// Release the binding. A no-op when nothing is live.
    ///
    /// On failure the mechanism stays live and its joints stay bound.
    pub fn delete(
        &mut self,
        stack: &mut dyn MotionStack,
        joints: &mut [AxisController],
    ) -> Result<(), SequenceError> {
        let Some(id) = self.id else {
            return Ok(());
        };
        stack
            .mechanism_delete(id)
            .map_err(|status| vendor_failure(stack, ENTITY, Step::MechanismDelete, status))?;
        self.id = None;
        self.spec = None;
        for axis in joints.iter_mut() {
            axis.set_bound(false);
        }
        info!("Mechanism deleted");
        Ok(())
    }

    pub fn current_position(&mut self, stack: &mut dyn MotionStack) -> Result<Pose, SequenceError> {
        let id = self.live_id(Step::CurrentPosition)?;
        stack
            .current_position(id)
            .map_err(|status| vendor_failure(stack, ENTITY, Step::CurrentPosition, status))
    }

    /// Plan a circle starting at `start`.
    pub fn plan_circle(
        &mut self,
        stack: &mut dyn MotionStack,
        trajectory: &CircleTrajectory,
        start: Pose,
    ) -> Result<PathSplines, SequenceError> {
        let id = self.live_id(Step::PlanTrajectory)?;
        let params = CircleTrajectory {
            start,
            ..trajectory.clone()
        };
        let path = stack
            .plan_circle(id, &params)
            .map_err(|status| vendor_failure(stack, ENTITY, Step::PlanTrajectory, status))?;
        info!(samples = path.len(), "Trajectory planned");
        Ok(path)
    }

    /// Split a planned path into joint samples. No partial output on failure.
    pub fn solve_inverse_kinematics(
        &mut self,
        stack: &mut dyn MotionStack,
        path: &PathSplines,
        request: &InverseKinematicsRequest,
    ) -> Result<JointMotionBuffers, SequenceError> {
        let id = self.live_id(Step::InverseKinematics)?;
        stack
            .solve_inverse_kinematics(id, path, request)
            .map_err(|status| vendor_failure(stack, ENTITY, Step::InverseKinematics, status))
    }

    pub fn stream_motion(
        &mut self,
        stack: &mut dyn MotionStack,
        buffers: &JointMotionBuffers,
    ) -> Result<(), SequenceError> {
        let id = self.live_id(Step::StreamMotion)?;
        stack
            .stream_motion(id, buffers)
            .map_err(|status| vendor_failure(stack, ENTITY, Step::StreamMotion, status))?;
        info!("Motion streaming");
        Ok(())
    }

    /// Wait for the streamed motion to complete.
    pub fn wait_motion_complete(
        &mut self,
        stack: &mut dyn MotionStack,
        timeout: WaitTimeout,
    ) -> Result<(), SequenceError> {
        let id = self.live_id(Step::StreamSynchronize)?;
        debug!(%timeout, "wait motion complete");
        stack
            .stream_synchronize(id, timeout)
            .map_err(|status| vendor_failure(stack, ENTITY, Step::StreamSynchronize, status))?;
        info!("Motion complete");
        Ok(())
    }
}
