//! Integration test: node and host handling.

use gantry_hal::drivers::simulation::{FaultPoint, SimulationStack};
use gantry_sequencer::report::{EXIT_CLEANUP_FAILURE, EXIT_FORWARD_FAILURE};
use gantry_sequencer::{ErrorKind, SequencerConfig, Step};

use super::{all_released, run, run_with, AXES, NODE};

#[test]
fn node_connect_failure_skips_axes_and_stops_host() {
    let mut sim = SimulationStack::new();
    sim.inject(Some(NODE), FaultPoint::NodeConnect);
    let report = run(&mut sim);

    let err = report.primary.as_ref().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceUnavailable);
    assert_eq!(err.location().to_string(), "NY4112_node.node_connect");
    assert_eq!(report.exit_code(), EXIT_FORWARD_FAILURE);

    assert!(AXES.iter().all(|name| sim.calls_for(name).is_empty()));
    assert!(report.cleanup.nodes.is_empty());
    assert_eq!(report.cleanup.host, Some(Ok(())));
    assert!(!sim.host_initialized());
}

#[test]
fn second_node_failure_releases_the_first() {
    let mut sim = SimulationStack::new().with_node("NY4112_node_2");
    sim.inject(Some("NY4112_node_2"), FaultPoint::NodeConnect);
    let mut config = SequencerConfig::default();
    config.nodes.push("NY4112_node_2".to_string());
    let report = run_with(config, &mut sim);

    assert_eq!(report.primary.unwrap_err().location().entity, "NY4112_node_2");
    assert_eq!(report.cleanup.nodes.len(), 1);
    assert_eq!(report.cleanup.nodes[0].node, NODE);
    assert!(!sim.is_node_connected(NODE));
}

#[test]
fn node_disconnect_failure_is_cleanup_only() {
    let mut sim = SimulationStack::new();
    sim.inject(Some(NODE), FaultPoint::NodeDisconnect);
    let report = run(&mut sim);

    assert_eq!(report.primary, Ok(()));
    assert_eq!(report.exit_code(), EXIT_CLEANUP_FAILURE);
    assert_eq!(report.cleanup_error().unwrap().location().step, Step::NodeDisconnect);
    // Host termination is still attempted after the failed release.
    assert_eq!(report.cleanup.host, Some(Ok(())));
    assert!(all_released(&sim, &AXES));
}

#[test]
fn init_host_failure_runs_nothing_else() {
    let mut sim = SimulationStack::new();
    sim.inject(None, FaultPoint::InitHost);
    let report = run(&mut sim);

    assert_eq!(report.primary.as_ref().unwrap_err().location().step, Step::InitHost);
    assert!(report.cleanup.host.is_none());
    assert_eq!(sim.calls().len(), 1);
}

#[test]
fn term_host_failure_is_cleanup_only() {
    let mut sim = SimulationStack::new();
    sim.inject(None, FaultPoint::TermHost);
    let report = run(&mut sim);

    assert_eq!(report.exit_code(), EXIT_CLEANUP_FAILURE);
    assert_eq!(report.cleanup_error().unwrap().location().to_string(), "host.term_host");
}
