//! Mechanism model: joints bound into one kinematic unit.

use crate::consts::{DOF_COUNT, GANTRY_JOINTS, MAX_JOINTS};
use crate::motion::AxisHandle;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Cartesian degrees of freedom a mechanism exposes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DofMask: u8 {
        const X  = 0x01;
        const Y  = 0x02;
        const Z  = 0x04;
        const RX = 0x08;
        const RY = 0x10;
        const RZ = 0x20;
    }
}

impl DofMask {
    /// Translational degrees of freedom only.
    pub const TRANSLATION: Self =
        Self::from_bits_truncate(Self::X.bits() | Self::Y.bits() | Self::Z.bits());

    /// Number of enabled degrees of freedom.
    #[inline]
    pub const fn cardinality(&self) -> usize {
        self.bits().count_ones() as usize
    }

    /// Mask as the six-boolean array the kinematics layer expects (X, Y, Z, Rx, Ry, Rz).
    pub fn as_array(&self) -> [bool; DOF_COUNT] {
        [
            self.contains(Self::X),
            self.contains(Self::Y),
            self.contains(Self::Z),
            self.contains(Self::RX),
            self.contains(Self::RY),
            self.contains(Self::RZ),
        ]
    }
}

impl Default for DofMask {
    fn default() -> Self {
        Self::TRANSLATION
    }
}

/// One named degree of freedom, as written in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dof {
    X,
    Y,
    Z,
    Rx,
    Ry,
    Rz,
}

impl From<Dof> for DofMask {
    fn from(dof: Dof) -> Self {
        match dof {
            Dof::X => DofMask::X,
            Dof::Y => DofMask::Y,
            Dof::Z => DofMask::Z,
            Dof::Rx => DofMask::RX,
            Dof::Ry => DofMask::RY,
            Dof::Rz => DofMask::RZ,
        }
    }
}

impl FromIterator<Dof> for DofMask {
    fn from_iter<I: IntoIterator<Item = Dof>>(iter: I) -> Self {
        iter.into_iter()
            .fold(DofMask::empty(), |mask, dof| mask | DofMask::from(dof))
    }
}

/// Which Cartesian axis of a gantry is driven by two motors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GantryAxis {
    X,
    Y,
}

/// Kinematic model selected for a mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KinematicModel {
    /// H-gantry with a dual-driven long axis: joints X1, X2, Y, Z.
    Gantry(GantryAxis),
    /// One joint per translational degree of freedom.
    Cartesian,
}

impl Default for KinematicModel {
    fn default() -> Self {
        Self::Gantry(GantryAxis::X)
    }
}

impl fmt::Display for KinematicModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gantry(GantryAxis::X) => f.write_str("gantry_x"),
            Self::Gantry(GantryAxis::Y) => f.write_str("gantry_y"),
            Self::Cartesian => f.write_str("cartesian"),
        }
    }
}

impl KinematicModel {
    /// Number of joints the model needs for the given degrees of freedom.
    pub const fn required_joints(&self, dof: DofMask) -> usize {
        match self {
            Self::Gantry(_) => GANTRY_JOINTS,
            Self::Cartesian => dof.cardinality(),
        }
    }

    /// Check that `dof` and `joint_count` fit this model.
    ///
    /// Returns a human-readable reason on mismatch.
    pub fn check_binding(&self, dof: DofMask, joint_count: usize) -> Result<(), String> {
        if joint_count == 0 || joint_count > MAX_JOINTS {
            return Err(format!(
                "joint count {joint_count} outside 1..={MAX_JOINTS}"
            ));
        }
        match self {
            Self::Gantry(_) if dof != DofMask::TRANSLATION => {
                return Err(format!(
                    "{self} requires degrees of freedom X|Y|Z, got {dof:?}"
                ));
            }
            Self::Cartesian if !DofMask::TRANSLATION.contains(dof) || dof.is_empty() => {
                return Err(format!(
                    "{self} supports translational degrees of freedom only, got {dof:?}"
                ));
            }
            _ => {}
        }
        let required = self.required_joints(dof);
        if joint_count != required {
            return Err(format!(
                "{self} with {} degrees of freedom needs {required} joints, got {joint_count}",
                dof.cardinality()
            ));
        }
        Ok(())
    }
}

/// Identifier of a mechanism created in the kinematics layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MechanismId(pub u32);

/// Everything the kinematics layer needs to create a mechanism.
#[derive(Debug, Clone, PartialEq)]
pub struct MechanismSpec {
    /// Joint axes, in joint order.
    pub joints: heapless::Vec<AxisHandle, MAX_JOINTS>,
    pub dof: DofMask,
    pub model: KinematicModel,
}

/// Tool-centre-point position in mechanism coordinates (X, Y, Z, Rx, Ry, Rz).
pub type Pose = [f64; DOF_COUNT];
