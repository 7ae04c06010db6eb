//! Gantry Common Library
//!
//! Shared types for every crate in the gantry workspace.
//!
//! # Module Structure
//!
//! - [`stack`] - The `MotionStack` trait: the vendor motion-control boundary
//! - [`motion`] - Axis/node handles, drive states and wait requests
//! - [`mechanism`] - Degree-of-freedom masks, kinematic models, mechanism specs
//! - [`trajectory`] - Trajectory parameters and spline sample buffers
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Workspace-wide constants
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```toml
//! [dependencies]
//! gantry_common = { path = "../gantry_common" }
//! ```
//!
//! ```rust
//! use gantry_common::prelude::*;
//! ```

pub mod config;
pub mod consts;
pub mod mechanism;
pub mod motion;
pub mod prelude;
pub mod stack;
pub mod trajectory;
