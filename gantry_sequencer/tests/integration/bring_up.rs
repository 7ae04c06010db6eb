//! Integration test: fleet bring-up.
//!
//! Bring-up is all-or-nothing: for any fleet size and any failing axis
//! the fleet ends either all Ready or all Disconnected.

use gantry_common::motion::{DriveState, MotorType, SyncRequest};
use gantry_hal::drivers::simulation::{FaultPoint, SimAxisSetup, SimulationStack};
use gantry_sequencer::axis::AxisState;
use gantry_sequencer::fleet::MovingAxisPolicy;
use gantry_sequencer::{ErrorKind, SequencerConfig, Step};

use super::{all_released, fleet, host_up, run_with, AXES};

// ── Helpers ─────────────────────────────────────────────────────────

const FAULTS: [FaultPoint; 6] = [
    FaultPoint::AxisConnect,
    FaultPoint::AxisInitialize,
    FaultPoint::AxisAlignMotor,
    FaultPoint::AxisLock,
    FaultPoint::AxisHome,
    FaultPoint::Stall(SyncRequest::Lock),
];

fn moving_axis(policy: MovingAxisPolicy) -> (SimulationStack, SequencerConfig) {
    let sim =
        SimulationStack::new().with_axis(SimAxisSetup::new("DEF_AXIS_1").initial_state(DriveState::Moving));
    let mut config = SequencerConfig::default();
    config.bring_up.moving_axis_policy = policy;
    (sim, config)
}

// ── All-or-nothing ──────────────────────────────────────────────────

#[test]
fn clean_bring_up_leaves_every_axis_ready() {
    for n in 1..=AXES.len() {
        let names = &AXES[..n];
        let mut sim = host_up(SimulationStack::new());
        let mut fleet = fleet(names);
        fleet.bring_up_all(&mut sim).unwrap();
        assert!(fleet.all_in(AxisState::Ready), "n = {n}");
        for name in names {
            assert_eq!(sim.axis_state(name), Some(DriveState::Ready));
        }
        assert_eq!(fleet.handles().len(), n);
    }
}

#[test]
fn any_failure_leaves_every_axis_disconnected() {
    for n in 1..=AXES.len() {
        let names = &AXES[..n];
        for failing in names {
            for point in FAULTS {
                let mut sim = host_up(SimulationStack::new());
                sim.inject(Some(*failing), point);
                let mut fleet = fleet(names);

                let err = fleet.bring_up_all(&mut sim).unwrap_err();
                assert_eq!(err.location().entity, *failing, "{point:?}");
                assert!(
                    fleet.all_in(AxisState::Disconnected),
                    "n = {n}, failing = {failing}, {point:?}"
                );
                assert!(all_released(&sim, names));
                assert!(fleet.take_abort_report().is_some_and(|r| r.is_ok()));
            }
        }
    }
}

#[test]
fn connect_failure_is_resource_unavailable() {
    let mut sim = SimulationStack::new();
    sim.inject(Some("DEF_AXIS_4"), FaultPoint::AxisConnect);
    let report = run_with(SequencerConfig::default(), &mut sim);
    let err = report.primary.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceUnavailable);
    assert_eq!(err.location().to_string(), "DEF_AXIS_4.connect");
    assert!(all_released(&sim, &AXES));
}

#[test]
fn unknown_axis_is_resource_unavailable() {
    let mut sim = SimulationStack::new();
    let mut config = SequencerConfig::default();
    config.axes[3] = "DEF_AXIS_9".to_string();
    let report = run_with(config, &mut sim);
    let err = report.primary.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceUnavailable);
    assert_eq!(err.location().entity, "DEF_AXIS_9");
    assert!(all_released(&sim, &AXES));
}

// ── Timeouts ────────────────────────────────────────────────────────

#[test]
fn wait_timeout_faults_the_axis_never_ready() {
    let mut sim = host_up(SimulationStack::new());
    sim.inject_once(Some("DEF_AXIS_3"), FaultPoint::Stall(SyncRequest::HomingCompleted));
    let mut fleet = fleet(&AXES);

    let err = fleet.bring_up_all(&mut sim).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(err.location().step, Step::Wait(SyncRequest::HomingCompleted));

    // Tear-down found the axis faulted and released it anyway.
    let report = fleet.take_abort_report().unwrap();
    assert_eq!(report.axes[2].observed, Some(AxisState::Faulted));
    assert!(report.is_ok());
    assert!(all_released(&sim, &AXES));
}

// ── Bring-up paths ──────────────────────────────────────────────────

#[test]
fn stepper_axis_skips_alignment() {
    let mut sim = host_up(
        SimulationStack::new().with_axis(SimAxisSetup::new("DEF_AXIS_2").motor_type(MotorType::Stepper)),
    );
    let mut fleet = fleet(&AXES);
    fleet.bring_up_all(&mut sim).unwrap();
    assert!(!sim.calls_for("DEF_AXIS_2").contains(&"axis_align_motor"));
    assert!(sim.calls_for("DEF_AXIS_1").contains(&"axis_align_motor"));
}

#[test]
fn locked_axis_is_only_homed() {
    let mut sim = host_up(
        SimulationStack::new().with_axis(SimAxisSetup::new("DEF_AXIS_1").initial_state(DriveState::Locked)),
    );
    let mut fleet = fleet(&AXES);
    fleet.bring_up_all(&mut sim).unwrap();
    let ops = sim.calls_for("DEF_AXIS_1");
    assert!(ops.contains(&"axis_home"));
    assert!(!ops.contains(&"axis_initialize"));
    assert!(!ops.contains(&"axis_lock"));
}

#[test]
fn ready_axis_needs_no_commands() {
    let mut sim = host_up(
        SimulationStack::new().with_axis(SimAxisSetup::new("DEF_AXIS_4").initial_state(DriveState::Ready)),
    );
    let mut fleet = fleet(&AXES);
    fleet.bring_up_all(&mut sim).unwrap();
    assert_eq!(
        sim.calls_for("DEF_AXIS_4"),
        vec!["axis_connect", "axis_read_state", "axis_read_state"]
    );
}

#[test]
fn faulted_axis_has_no_bring_up_path() {
    let mut sim = host_up(
        SimulationStack::new().with_axis(SimAxisSetup::new("DEF_AXIS_2").initial_state(DriveState::Error)),
    );
    let mut fleet = fleet(&AXES);
    let err = fleet.bring_up_all(&mut sim).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CommandRejected);
    assert_eq!(err.location().step, Step::BringUpCheck);
    assert!(fleet.all_in(AxisState::Disconnected));
}

#[test]
fn moving_axis_wait_only_skips_lock_and_home() {
    let (mut sim, config) = moving_axis(MovingAxisPolicy::WaitOnly);
    let report = run_with(config, &mut sim);
    assert!(report.is_success(), "{:?}", report.primary);
    let ops = sim.calls_for("DEF_AXIS_1");
    assert!(ops.contains(&"sync_motion_stopped"));
    assert!(!ops.contains(&"axis_lock"));
    assert!(!ops.contains(&"axis_home"));
}

#[test]
fn moving_axis_wait_then_rehome_homes_again() {
    let (mut sim, config) = moving_axis(MovingAxisPolicy::WaitThenRehome);
    let report = run_with(config, &mut sim);
    assert!(report.is_success(), "{:?}", report.primary);
    let ops = sim.calls_for("DEF_AXIS_1");
    let stopped = ops.iter().position(|op| *op == "sync_motion_stopped").unwrap();
    let home = ops.iter().position(|op| *op == "axis_home").unwrap();
    assert!(stopped < home);
    assert!(!ops.contains(&"axis_lock"));
}

#[test]
fn moving_axis_that_never_stops_times_out() {
    let (mut sim, config) = moving_axis(MovingAxisPolicy::WaitOnly);
    sim.inject_once(Some("DEF_AXIS_1"), FaultPoint::Stall(SyncRequest::MotionStopped));
    let report = run_with(config, &mut sim);
    let err = report.primary.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(err.location().to_string(), "DEF_AXIS_1.wait_motion_stopped");
    assert!(all_released(&sim, &AXES));
}
