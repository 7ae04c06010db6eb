//! # Gantry Sequencer Library
//!
//! Drives a vendor motion stack through one complete motion cycle: host and
//! node up, axes up, mechanism bound, circle planned and streamed, then an
//! unconditional cleanup back to a disconnected bus.
//!
//! # Module Structure
//!
//! - [`error`] - Failure taxonomy and failure locations
//! - [`outcome`] - Sticky first-error accumulator for the forward chain
//! - [`axis`] - `AxisController`: one axis, its record and lifecycle commands
//! - [`node`] - `NodeController`: one communication node
//! - [`fleet`] - `AxisFleet`: all-or-nothing bring-up, per-axis tear-down
//! - [`mechanism`] - `MechanismController`: kinematic binding and motion calls
//! - [`sequencer`] - `MotionSequencer`: the end-to-end protocol
//! - [`report`] - Run and cleanup reports, exit codes
//! - [`config`] - Sequencer configuration
//!
//! # Control Flow
//!
//! ```text
//! MotionSequencer ──► NodeController (×N)
//!        │
//!        ├──────────► AxisFleet ──► AxisController (×N)
//!        │
//!        └──────────► MechanismController
//!                              │
//!                              ▼
//!                     dyn MotionStack (vendor)
//! ```

pub mod axis;
pub mod config;
pub mod error;
pub mod fleet;
pub mod mechanism;
pub mod node;
pub mod outcome;
pub mod report;
pub mod sequencer;

pub use crate::config::SequencerConfig;
pub use crate::error::{ErrorKind, FailurePoint, SequenceError, Step};
pub use crate::report::{CleanupReport, RunReport};
pub use crate::sequencer::MotionSequencer;
