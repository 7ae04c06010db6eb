//! Integration tests for the gantry sequencer.
//!
//! These tests drive the sequencer end to end against the simulation
//! stack, using its fault injection and call log to check bring-up,
//! tear-down and the complete motion cycle.

mod integration;
