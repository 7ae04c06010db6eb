//! Integration test: tear-down independence and idempotence.

use gantry_hal::drivers::simulation::{FaultPoint, SimulationStack};
use gantry_sequencer::axis::AxisState;
use gantry_sequencer::report::EXIT_CLEANUP_FAILURE;
use gantry_sequencer::{ErrorKind, Step};

use super::{all_released, fleet, host_up, run, AXES};

#[test]
fn tear_down_of_disconnected_fleet_is_a_no_op() {
    let mut sim = host_up(SimulationStack::new());
    let mut fleet = fleet(&AXES);
    let calls = sim.calls().len();

    let report = fleet.tear_down_all(&mut sim);
    assert!(report.is_ok());
    assert!(report.axes.iter().all(|a| a.observed == Some(AxisState::Disconnected)));
    assert_eq!(sim.calls().len(), calls);
}

#[test]
fn tear_down_twice_is_idempotent() {
    let mut sim = host_up(SimulationStack::new());
    let mut fleet = fleet(&AXES);
    fleet.bring_up_all(&mut sim).unwrap();

    assert!(fleet.tear_down_all(&mut sim).is_ok());
    assert!(fleet.all_in(AxisState::Disconnected));
    let calls = sim.calls().len();

    let again = fleet.tear_down_all(&mut sim);
    assert!(again.is_ok());
    assert_eq!(sim.calls().len(), calls, "second tear-down must not reach the stack");
}

#[test]
fn shutdown_failure_does_not_stop_other_axes() {
    let mut sim = SimulationStack::new();
    sim.inject(Some("DEF_AXIS_2"), FaultPoint::AxisShutdown);
    let report = run(&mut sim);

    // Forward chain succeeded; only cleanup failed.
    assert_eq!(report.primary, Ok(()));
    assert_eq!(report.exit_code(), EXIT_CLEANUP_FAILURE);

    let err = report.cleanup_error().unwrap();
    assert_eq!(err.kind(), ErrorKind::CommandRejected);
    assert_eq!(err.location().to_string(), "DEF_AXIS_2.shutdown");
    assert_eq!(report.cleanup.axes.failed_axes(), vec!["DEF_AXIS_2"]);

    // Every other axis was torn down, including the ones after axis 2.
    for name in ["DEF_AXIS_1", "DEF_AXIS_3", "DEF_AXIS_4"] {
        assert!(!sim.is_axis_connected(name), "{name}");
        assert!(sim.calls_for(name).contains(&"axis_disconnect"));
    }

    // Axis 2 was not disconnected and stays discoverable.
    assert!(sim.is_axis_connected("DEF_AXIS_2"));
    assert!(!sim.calls_for("DEF_AXIS_2").contains(&"axis_disconnect"));

    // Later cleanup steps still ran.
    assert!(report.cleanup.nodes.iter().all(|n| n.result.is_ok()));
    assert_eq!(report.cleanup.host, Some(Ok(())));
}

#[test]
fn failed_disconnect_is_reported_per_axis() {
    let mut sim = SimulationStack::new();
    sim.inject_once(Some("DEF_AXIS_4"), FaultPoint::AxisDisconnect);
    sim.inject_once(Some("DEF_AXIS_1"), FaultPoint::AxisDisconnect);
    let report = run(&mut sim);

    assert_eq!(report.exit_code(), EXIT_CLEANUP_FAILURE);
    assert_eq!(report.cleanup.axes.failed_axes(), vec!["DEF_AXIS_1", "DEF_AXIS_4"]);
    // The first failure in cleanup order is the secondary status.
    assert_eq!(report.cleanup_error().unwrap().location().entity, "DEF_AXIS_1");
    assert!(sim.is_axis_connected("DEF_AXIS_1"));
    assert!(sim.is_axis_connected("DEF_AXIS_4"));
}

#[test]
fn read_failure_still_shuts_down_and_disconnects() {
    let mut sim = host_up(SimulationStack::new());
    let mut fleet = fleet(&AXES);
    fleet.bring_up_all(&mut sim).unwrap();
    sim.inject_once(Some("DEF_AXIS_3"), FaultPoint::AxisReadState);

    let report = fleet.tear_down_all(&mut sim);
    let entry = &report.axes[2];
    assert_eq!(entry.observed, None);
    let err = entry.result.as_ref().unwrap_err();
    assert_eq!(err.location().step, Step::AxisReadState);
    assert!(all_released(&sim, &AXES));
}
