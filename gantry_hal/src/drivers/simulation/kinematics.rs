//! Kinematics used by the simulation stack.
//!
//! Forward/inverse maps for the gantry and cartesian models, and a
//! sine-acceleration circle planner.
//!
//! The circle uses the profile `s(t) = L·(t/T − sin(2πt/T)/2π)`, whose peak
//! velocity is `2L/T` and peak acceleration `2πL/T²`. `T` is the smallest
//! duration keeping both under the configured limits.

use gantry_common::consts::DOF_COUNT;
use gantry_common::mechanism::{DofMask, GantryAxis, KinematicModel, Pose};
use gantry_common::stack::{StatusKind, VendorStatus};
use gantry_common::trajectory::{
    CircleTrajectory, InverseKinematicsRequest, JointMotionBuffers, JointSamples, PathSplines,
};
use std::f64::consts::TAU;

use super::status;

fn invalid_parameter() -> VendorStatus {
    VendorStatus::new(StatusKind::Rejected, status::INVALID_PARAMETER)
}

fn buffer_too_small() -> VendorStatus {
    VendorStatus::new(StatusKind::Rejected, status::BUFFER_TOO_SMALL)
}

/// Pose coordinate driven by each joint.
pub fn joint_coordinates(model: KinematicModel, dof: DofMask) -> Vec<usize> {
    match model {
        KinematicModel::Gantry(GantryAxis::X) => vec![0, 0, 1, 2],
        KinematicModel::Gantry(GantryAxis::Y) => vec![1, 1, 0, 2],
        KinematicModel::Cartesian => dof
            .as_array()
            .iter()
            .enumerate()
            .filter_map(|(i, &on)| on.then_some(i))
            .collect(),
    }
}

/// Forward kinematics: joint positions to a pose.
///
/// Dual-driven gantry joints are averaged.
pub fn forward(model: KinematicModel, dof: DofMask, joints: &[f64]) -> Pose {
    let mut pose = [0.0; DOF_COUNT];
    let mut count = [0u32; DOF_COUNT];
    for (&coord, &value) in joint_coordinates(model, dof).iter().zip(joints) {
        pose[coord] += value;
        count[coord] += 1;
    }
    for (p, &n) in pose.iter_mut().zip(count.iter()) {
        if n > 1 {
            *p /= n as f64;
        }
    }
    pose
}

/// Plan a sine-acceleration circle from `params.start`.
pub fn plan_circle(params: &CircleTrajectory) -> Result<PathSplines, VendorStatus> {
    if !(params.max_velocity > 0.0 && params.max_acceleration > 0.0 && params.spline_time > 0.0) {
        return Err(invalid_parameter());
    }

    let (u, v) = params.plane.coordinates();
    let du = params.start[u] - params.center[0];
    let dv = params.start[v] - params.center[1];
    let radius = du.hypot(dv);
    let sweep = params.angle_deg.to_radians();
    if radius <= f64::EPSILON || sweep == 0.0 {
        return Err(invalid_parameter());
    }

    let length = radius * sweep.abs();
    let duration = (2.0 * length / params.max_velocity)
        .max((TAU * length / params.max_acceleration).sqrt());
    let samples = (duration / params.spline_time).ceil() as usize + 1;

    let mut positions = params
        .position_buffer
        .allocate::<Pose>(samples)
        .ok_or_else(buffer_too_small)?;
    let mut velocities = params
        .velocity_buffer
        .allocate::<Pose>(samples)
        .ok_or_else(buffer_too_small)?;

    let start_angle = dv.atan2(du);
    let direction = sweep.signum();
    for i in 0..samples {
        let t = (i as f64 * params.spline_time).min(duration);
        let phase = TAU * t / duration;
        let s = length * (t / duration - phase.sin() / TAU);
        let speed = length / duration * (1.0 - phase.cos());
        let angle = start_angle + direction * s / radius;

        let mut pose = params.start;
        pose[u] = params.center[0] + radius * angle.cos();
        pose[v] = params.center[1] + radius * angle.sin();
        positions.push(pose);

        let mut vel = [0.0; DOF_COUNT];
        vel[u] = -direction * speed * angle.sin();
        vel[v] = direction * speed * angle.cos();
        velocities.push(vel);
    }

    Ok(PathSplines {
        spline_time: params.spline_time,
        positions,
        velocities,
    })
}

/// Inverse kinematics: split the planned path into joint samples.
pub fn inverse(
    model: KinematicModel,
    dof: DofMask,
    path: &PathSplines,
    request: &InverseKinematicsRequest,
) -> Result<JointMotionBuffers, VendorStatus> {
    if path.is_empty() {
        return Err(VendorStatus::new(StatusKind::Rejected, status::NO_TRAJECTORY));
    }

    let mut joints = Vec::new();
    for (index, &coord) in joint_coordinates(model, dof).iter().enumerate() {
        let mut positions = request
            .position_buffer(index)
            .allocate::<f64>(path.len())
            .ok_or_else(buffer_too_small)?;
        let mut velocities = request
            .velocity_buffer(index)
            .allocate::<f64>(path.len())
            .ok_or_else(buffer_too_small)?;
        positions.extend(path.positions.iter().map(|p| p[coord]));
        velocities.extend(path.velocities.iter().map(|p| p[coord]));
        if positions.iter().any(|p| !p.is_finite()) {
            return Err(VendorStatus::new(StatusKind::Mismatch, status::KINEMATICS_FAILED));
        }
        joints.push(JointSamples {
            positions,
            velocities,
        });
    }
    Ok(JointMotionBuffers { joints })
}

/// Duration of a planned path [s].
pub fn path_duration(path: &PathSplines) -> f64 {
    path.len().saturating_sub(1) as f64 * path.spline_time
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_common::trajectory::SampleBuffer;

    fn reference_circle() -> CircleTrajectory {
        CircleTrajectory::default()
    }

    #[test]
    fn full_circle_returns_to_start() {
        let path = plan_circle(&reference_circle()).unwrap();
        let first = path.positions.first().unwrap();
        let last = path.positions.last().unwrap();
        assert!((first[0] - last[0]).abs() < 1e-6);
        assert!((first[1] - last[1]).abs() < 1e-6);
        // Opposite side of the circle is reached half-way.
        let far = path.positions.iter().map(|p| p[0]).fold(f64::MIN, f64::max);
        assert!((far - 600.0).abs() < 1.0);
    }

    #[test]
    fn velocity_limit_respected() {
        let path = plan_circle(&reference_circle()).unwrap();
        let peak = path
            .velocities
            .iter()
            .map(|v| v[0].hypot(v[1]))
            .fold(0.0, f64::max);
        assert!(peak <= 500.0 + 1e-6);
    }

    #[test]
    fn caller_buffer_too_small_is_rejected() {
        let mut params = reference_circle();
        params.position_buffer = SampleBuffer::CallerOwned { capacity: 10 };
        let err = plan_circle(&params).unwrap_err();
        assert_eq!(err.code, status::BUFFER_TOO_SMALL);
    }

    #[test]
    fn zero_radius_is_rejected() {
        let mut params = reference_circle();
        params.center = [0.0, 0.0];
        assert!(plan_circle(&params).is_err());
    }

    #[test]
    fn gantry_inverse_duplicates_long_axis() {
        let path = plan_circle(&reference_circle()).unwrap();
        let model = KinematicModel::Gantry(GantryAxis::X);
        let buffers = inverse(
            model,
            DofMask::TRANSLATION,
            &path,
            &InverseKinematicsRequest::planner_allocated(4),
        )
        .unwrap();
        assert_eq!(buffers.joints.len(), 4);
        assert_eq!(buffers.joints[0].positions, buffers.joints[1].positions);
        assert_eq!(buffers.joints[2].positions.len(), path.len());
    }

    #[test]
    fn forward_averages_dual_drive() {
        let model = KinematicModel::Gantry(GantryAxis::X);
        let pose = forward(model, DofMask::TRANSLATION, &[10.0, 12.0, 5.0, -1.0]);
        assert_eq!(pose[0], 11.0);
        assert_eq!(pose[1], 5.0);
        assert_eq!(pose[2], -1.0);
    }
}
