//! Motion stack implementations.
//!
//! - [`simulation`] - In-process stack for development and testing
//!
//! # Adding New Stacks
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `MotionStack` trait from `gantry_common::stack`
//! 3. Register its factory in [`register_all_stacks`]

pub mod simulation;

use crate::stack_registry::StackRegistry;

/// Register all built-in stacks.
pub fn register_all_stacks(registry: &mut StackRegistry) {
    registry.register("simulation", simulation::create_stack);
}
