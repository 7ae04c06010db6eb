//! Integration test: mechanism binding and the kinematics pipeline.

use gantry_common::mechanism::{Dof, KinematicModel};
use gantry_common::trajectory::SampleBuffer;
use gantry_hal::drivers::simulation::{FaultPoint, SimulationStack};
use gantry_sequencer::report::EXIT_FORWARD_FAILURE;
use gantry_sequencer::{ErrorKind, SequencerConfig, Step};

use super::{all_released, run, run_with, AXES};

#[test]
fn dof_mismatch_fails_mechanism_creation() {
    let mut sim = SimulationStack::new();
    let mut config = SequencerConfig::default();
    config.mechanism.dof = vec![Dof::X, Dof::Y];
    let report = run_with(config, &mut sim);

    let err = report.primary.as_ref().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigurationMismatch);
    assert_eq!(err.location().to_string(), "mechanism.mechanism_create");
    assert_eq!(report.exit_code(), EXIT_FORWARD_FAILURE);

    // Rejected before reaching the vendor; the axes were still released.
    assert!(sim.calls_for("mechanism").is_empty());
    assert!(all_released(&sim, &AXES));
}

#[test]
fn joint_count_mismatch_fails_mechanism_creation() {
    let mut sim = SimulationStack::new();
    let mut config = SequencerConfig::default();
    config.mechanism.kinematics = KinematicModel::Cartesian;
    let report = run_with(config, &mut sim);

    let err = report.primary.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigurationMismatch);
    assert!(err.description().contains("needs 3 joints"), "{}", err.description());
}

#[test]
fn kinematics_failure_streams_nothing() {
    let mut sim = SimulationStack::new();
    sim.inject_once(None, FaultPoint::InverseKinematics);
    let report = run(&mut sim);

    let err = report.primary.as_ref().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigurationMismatch);
    assert_eq!(err.location().step, Step::InverseKinematics);
    assert!(report.samples.is_none());
    assert!(!sim.calls_for("mechanism").contains(&"stream_motion"));

    // The mechanism is still deleted by cleanup.
    assert_eq!(report.cleanup.mechanism, Some(Ok(())));
    assert_eq!(sim.live_mechanisms(), 0);
    assert!(all_released(&sim, &AXES));
}

#[test]
fn failed_delete_in_cleanup_keeps_axes_bound() {
    let mut sim = SimulationStack::new();
    sim.inject_once(None, FaultPoint::PlanTrajectory);
    sim.inject(None, FaultPoint::MechanismDelete);
    let report = run(&mut sim);

    assert_eq!(report.primary.as_ref().unwrap_err().location().step, Step::PlanTrajectory);
    let delete = report.cleanup.mechanism.as_ref().unwrap().as_ref().unwrap_err();
    assert_eq!(delete.location().step, Step::MechanismDelete);

    // Bound axes refuse to disconnect, but every axis was still attempted.
    assert_eq!(report.cleanup.axes.failed_axes(), AXES.to_vec());
    assert_eq!(sim.live_mechanisms(), 1);
    assert!(AXES.iter().all(|name| sim.is_axis_connected(name)));
}

#[test]
fn caller_owned_joint_buffers_too_small_fail() {
    let mut sim = SimulationStack::new();
    let mut config = SequencerConfig::default();
    config.mechanism.joint_buffer = SampleBuffer::CallerOwned { capacity: 4 };
    let report = run_with(config, &mut sim);

    let err = report.primary.unwrap_err();
    assert_eq!(err.location().step, Step::InverseKinematics);
    assert!(all_released(&sim, &AXES));
}
