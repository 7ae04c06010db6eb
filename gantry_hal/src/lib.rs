//! # Gantry HAL Library
//!
//! Motion stack backends with a pluggable registry.
//!
//! Backends implement the `MotionStack` trait defined in
//! `gantry_common::stack`. The sequencer picks one by name at startup.
//!
//! # Module Structure
//!
//! - [`stack_registry`] - Stack factory registration
//! - [`drivers`] - Motion stack implementations
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      gantry_hal                            │
//! │  ┌─────────────────┐         ┌──────────────────────────┐  │
//! │  │  StackRegistry  │────────►│  MotionStack             │  │
//! │  │  name → factory │         │  (trait object)          │  │
//! │  └─────────────────┘         └────────────┬─────────────┘  │
//! │                                           │                │
//! │                                           ▼                │
//! │                              ┌──────────────────────────┐  │
//! │                              │  SimulationStack         │  │
//! │                              │  drives, faults, splines │  │
//! │                              └──────────────────────────┘  │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod drivers;
pub mod stack_registry;

pub use crate::drivers::register_all_stacks;
pub use crate::stack_registry::{RegistryError, StackRegistry};
