//! Trajectory parameters and spline sample buffers.
//!
//! Output storage is an explicit choice: either the planner allocates and
//! owns the samples, or the caller declares a fixed capacity up front.

use crate::mechanism::Pose;
use serde::{Deserialize, Serialize};

/// Plane a circular path is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Plane {
    #[default]
    Xy,
    Yz,
    Zx,
}

impl Plane {
    /// Indices of the two pose coordinates spanning the plane.
    pub const fn coordinates(&self) -> (usize, usize) {
        match self {
            Self::Xy => (0, 1),
            Self::Yz => (1, 2),
            Self::Zx => (2, 0),
        }
    }
}

/// Storage contract for one sample sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SampleBuffer {
    /// Let the planner allocate and own the samples.
    #[default]
    PlannerAllocated,
    /// Caller-owned storage holding at most `capacity` samples.
    CallerOwned { capacity: usize },
}

impl SampleBuffer {
    /// Allocate storage for `needed` samples.
    ///
    /// Returns `None` when caller-owned storage is too small.
    pub fn allocate<T>(&self, needed: usize) -> Option<Vec<T>> {
        match *self {
            Self::PlannerAllocated => Some(Vec::with_capacity(needed)),
            Self::CallerOwned { capacity } if needed <= capacity => {
                Some(Vec::with_capacity(capacity))
            }
            Self::CallerOwned { .. } => None,
        }
    }
}

/// Circular path with a sine-shaped acceleration profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CircleTrajectory {
    /// Path velocity limit [mm/s].
    pub max_velocity: f64,
    /// Path acceleration limit [mm/s²].
    pub max_acceleration: f64,
    /// Spline sample period [s].
    pub spline_time: f64,
    /// Circle centre in plane coordinates.
    pub center: [f64; 2],
    /// Sweep angle [deg]; the sign selects the direction.
    pub angle_deg: f64,
    pub plane: Plane,
    /// Start pose; filled from the mechanism's current position before planning.
    #[serde(skip)]
    pub start: Pose,
    pub position_buffer: SampleBuffer,
    pub velocity_buffer: SampleBuffer,
}

impl Default for CircleTrajectory {
    fn default() -> Self {
        Self {
            max_velocity: 500.0,
            max_acceleration: 5000.0,
            spline_time: 0.01,
            center: [300.0, 0.0],
            angle_deg: 360.0,
            plane: Plane::Xy,
            start: [0.0; 6],
            position_buffer: SampleBuffer::PlannerAllocated,
            velocity_buffer: SampleBuffer::PlannerAllocated,
        }
    }
}

/// Planned Cartesian path: one pose and one velocity vector per spline sample.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathSplines {
    pub spline_time: f64,
    pub positions: Vec<Pose>,
    pub velocities: Vec<Pose>,
}

impl PathSplines {
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Storage requested for each joint's inverse-kinematics output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InverseKinematicsRequest {
    /// One entry per joint; missing entries default to planner-allocated.
    pub position_buffers: Vec<SampleBuffer>,
    pub velocity_buffers: Vec<SampleBuffer>,
}

impl InverseKinematicsRequest {
    /// Planner-allocated storage for every joint.
    pub fn planner_allocated(joints: usize) -> Self {
        Self {
            position_buffers: vec![SampleBuffer::PlannerAllocated; joints],
            velocity_buffers: vec![SampleBuffer::PlannerAllocated; joints],
        }
    }

    /// Storage contract for joint `index` positions.
    pub fn position_buffer(&self, index: usize) -> SampleBuffer {
        self.position_buffers.get(index).copied().unwrap_or_default()
    }

    /// Storage contract for joint `index` velocities.
    pub fn velocity_buffer(&self, index: usize) -> SampleBuffer {
        self.velocity_buffers.get(index).copied().unwrap_or_default()
    }
}

/// Per-joint sample sequences.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JointSamples {
    pub positions: Vec<f64>,
    pub velocities: Vec<f64>,
}

/// Inverse-kinematics output, one entry per joint in joint order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JointMotionBuffers {
    pub joints: Vec<JointSamples>,
}
