//! Integration test: complete motion cycles.
//!
//! 1. Four axes, every vendor call succeeds → full cycle, clean bus
//! 2. Axis 2 fails lock → bring-up aborts, axis 1 torn down
//! 3. Axes moving at tear-down, one quick-stop stalls → reset, then release

use gantry_common::motion::SyncRequest;
use gantry_hal::drivers::simulation::{FaultPoint, SimulationStack};
use gantry_sequencer::axis::AxisState;
use gantry_sequencer::report::{EXIT_FORWARD_FAILURE, EXIT_SUCCESS};
use gantry_sequencer::{ErrorKind, SequencerConfig, Step};

use super::{all_released, run, run_with, AXES, NODE};

// ── Full success ────────────────────────────────────────────────────

#[test]
fn four_axis_circle_completes_and_releases_everything() {
    let mut sim = SimulationStack::new();
    let report = run(&mut sim);

    assert_eq!(report.primary, Ok(()));
    assert!(report.cleanup.is_ok());
    assert_eq!(report.exit_code(), EXIT_SUCCESS);
    assert!(report.samples.is_some_and(|n| n > 1));

    // Mechanism deleted, every axis and the node released, host down.
    assert_eq!(sim.live_mechanisms(), 0);
    assert!(all_released(&sim, &AXES));
    assert!(!sim.is_node_connected(NODE));
    assert!(!sim.host_initialized());

    // Deleted in the forward chain, so cleanup had nothing left to delete.
    assert!(report.cleanup.mechanism.is_none());
    assert!(report.cleanup.aborted_bring_up.is_none());
    assert_eq!(report.cleanup.axes.axes.len(), AXES.len());
    for entry in &report.cleanup.axes.axes {
        assert_eq!(entry.observed, Some(AxisState::Ready), "{}", entry.axis);
        assert!(entry.quick_stop.is_none());
    }
}

#[test]
fn mechanism_calls_follow_the_motion_pipeline() {
    let mut sim = SimulationStack::new();
    let report = run(&mut sim);
    assert!(report.is_success());
    assert_eq!(
        sim.calls_for("mechanism"),
        vec![
            "mechanism_create",
            "define_kinematic_model",
            "current_position",
            "plan_circle",
            "solve_inverse_kinematics",
            "stream_motion",
            "stream_synchronize",
            "mechanism_delete",
        ]
    );
}

#[test]
fn host_calls_bracket_the_run() {
    let mut sim = SimulationStack::new();
    let _ = run(&mut sim);
    let calls = sim.calls();
    assert_eq!(calls.first().map(|c| c.op), Some("init_host"));
    assert_eq!(calls.last().map(|c| c.op), Some("term_host"));
}

#[test]
fn short_motion_complete_timeout_fails_forward_chain() {
    let mut sim = SimulationStack::new();
    let mut config = SequencerConfig::default();
    config.timeouts.motion_complete_s = Some(0.001);
    let report = run_with(config, &mut sim);

    let err = report.primary.as_ref().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(err.location().step, Step::StreamSynchronize);
    assert_eq!(report.exit_code(), EXIT_FORWARD_FAILURE);

    // Cleanup still deleted the mechanism and released every axis.
    assert_eq!(report.cleanup.mechanism, Some(Ok(())));
    assert_eq!(sim.live_mechanisms(), 0);
    assert!(all_released(&sim, &AXES));
}

// ── Lock failure on axis 2 ──────────────────────────────────────────

#[test]
fn lock_failure_on_second_axis_aborts_bring_up() {
    let mut sim = SimulationStack::new();
    sim.inject(Some("DEF_AXIS_2"), FaultPoint::AxisLock);
    let report = run(&mut sim);

    let err = report.primary.as_ref().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CommandRejected);
    assert_eq!(err.location().entity, "DEF_AXIS_2");
    assert_eq!(err.location().step, Step::AxisLock);
    assert_eq!(err.location().to_string(), "DEF_AXIS_2.lock");
    assert_eq!(report.exit_code(), EXIT_FORWARD_FAILURE);

    // Axis 1 completed bring-up and was torn down again.
    let axis_1 = sim.calls_for("DEF_AXIS_1");
    assert!(axis_1.contains(&"axis_home"));
    assert!(axis_1.contains(&"axis_shutdown"));
    assert!(axis_1.contains(&"axis_disconnect"));

    // Axes 3 and 4 were never touched.
    assert!(sim.calls_for("DEF_AXIS_3").is_empty());
    assert!(sim.calls_for("DEF_AXIS_4").is_empty());

    // The abort tear-down is kept for diagnostics.
    let aborted = report.cleanup.aborted_bring_up.as_ref().unwrap();
    assert!(aborted.is_ok());
    assert_eq!(aborted.axes[0].observed, Some(AxisState::Ready));
    assert_eq!(aborted.axes[3].observed, Some(AxisState::Disconnected));

    // No mechanism was ever created.
    assert!(sim.calls_for("mechanism").is_empty());
    assert!(all_released(&sim, &AXES));
    assert!(!sim.host_initialized());
}

// ── Moving at tear-down ─────────────────────────────────────────────

/// Streaming starts but never completes: every joint is still moving
/// when cleanup starts.
fn moving_at_tear_down() -> SimulationStack {
    let mut sim = SimulationStack::new();
    sim.inject_once(None, FaultPoint::StreamSynchronize);
    sim
}

#[test]
fn moving_axes_are_quick_stopped_before_shutdown() {
    let mut sim = moving_at_tear_down();
    let report = run(&mut sim);

    let err = report.primary.as_ref().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(err.location().entity, "mechanism");
    assert!(report.cleanup.is_ok());

    for entry in &report.cleanup.axes.axes {
        assert_eq!(entry.observed, Some(AxisState::Moving), "{}", entry.axis);
        assert_eq!(entry.quick_stop, Some(Ok(())));
        assert!(entry.reset.is_none());
    }
    assert!(all_released(&sim, &AXES));
}

#[test]
fn stalled_quick_stop_is_reset_then_released() {
    let mut sim = moving_at_tear_down();
    sim.inject_once(Some("DEF_AXIS_2"), FaultPoint::Stall(SyncRequest::MotionStopped));
    let report = run(&mut sim);

    // The primary cause is still the forward-chain failure.
    assert_eq!(report.primary.as_ref().unwrap_err().location().step, Step::StreamSynchronize);
    assert_eq!(report.exit_code(), EXIT_FORWARD_FAILURE);

    let entry = &report.cleanup.axes.axes[1];
    assert_eq!(entry.axis, "DEF_AXIS_2");
    let stop = entry.quick_stop.as_ref().unwrap().as_ref().unwrap_err();
    assert_eq!(stop.kind(), ErrorKind::Timeout);
    assert_eq!(stop.location().step, Step::Wait(SyncRequest::MotionStopped));
    assert_eq!(entry.reset, Some(Ok(())));
    assert_eq!(entry.result, Ok(()));

    // Shutdown and disconnect still ran after the reset.
    let ops = sim.calls_for("DEF_AXIS_2");
    let reset = ops.iter().position(|op| *op == "axis_reset").unwrap();
    let shutdown = ops.iter().position(|op| *op == "axis_shutdown").unwrap();
    assert!(reset < shutdown);
    assert!(ops.contains(&"axis_disconnect"));

    // The other axes were unaffected.
    assert!(report.cleanup.axes.axes.iter().filter(|e| e.axis != "DEF_AXIS_2").all(|e| e.is_ok()));
    assert_eq!(report.cleanup.axes.failed_axes(), vec!["DEF_AXIS_2"]);
    assert!(all_released(&sim, &AXES));
}

#[test]
fn stalled_reset_is_recorded_and_axis_still_released() {
    let mut sim = moving_at_tear_down();
    sim.inject_once(Some("DEF_AXIS_3"), FaultPoint::Stall(SyncRequest::MotionStopped));
    sim.inject_once(Some("DEF_AXIS_3"), FaultPoint::Stall(SyncRequest::Reset));
    let report = run(&mut sim);

    let entry = &report.cleanup.axes.axes[2];
    let reset = entry.reset.as_ref().unwrap().as_ref().unwrap_err();
    assert_eq!(reset.kind(), ErrorKind::Timeout);
    assert_eq!(reset.location().step, Step::Wait(SyncRequest::Reset));
    assert_eq!(entry.result, Ok(()));
    assert!(!sim.is_axis_connected("DEF_AXIS_3"));
}
