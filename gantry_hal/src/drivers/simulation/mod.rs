//! Simulation stack module.
//!
//! Deterministic drives, nodes and kinematics for running the sequencer
//! without a control bus. Faults can be armed per call and per axis.

mod axis;
mod faults;
mod kinematics;
mod stack;
pub mod status;

pub use axis::{SimAxis, SimAxisSetup};
pub use faults::{Fault, FaultPlan, FaultPoint};
pub use kinematics::{forward, joint_coordinates, path_duration};
pub use stack::{SimCall, SimulationStack};

use gantry_common::stack::MotionStack;

/// Factory function to create the reference simulation cell.
pub fn create_stack() -> Box<dyn MotionStack> {
    Box::new(SimulationStack::new())
}
