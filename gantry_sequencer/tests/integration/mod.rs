//! Shared helpers for the sequencer integration tests.

mod bring_up;
mod mechanism;
mod nodes;
mod scenarios;
mod tear_down;

use gantry_common::motion::{HostMode, WaitTimeout};
use gantry_common::stack::MotionStack;
use gantry_hal::drivers::simulation::SimulationStack;
use gantry_sequencer::fleet::{AxisFleet, FleetOptions};
use gantry_sequencer::{MotionSequencer, RunReport, SequencerConfig};

pub const AXES: [&str; 4] = ["DEF_AXIS_1", "DEF_AXIS_2", "DEF_AXIS_3", "DEF_AXIS_4"];
pub const NODE: &str = "NY4112_node";

/// Run one full cycle with `config` against `sim`.
pub fn run_with(config: SequencerConfig, sim: &mut SimulationStack) -> RunReport {
    MotionSequencer::new(config).run(sim)
}

/// Run one full cycle with the built-in configuration.
pub fn run(sim: &mut SimulationStack) -> RunReport {
    run_with(SequencerConfig::default(), sim)
}

/// Simulation stack with the host already up.
pub fn host_up(mut sim: SimulationStack) -> SimulationStack {
    sim.init_host(HostMode::Simulation).unwrap();
    sim
}

pub fn fleet(names: &[&str]) -> AxisFleet {
    AxisFleet::new(
        names,
        FleetOptions {
            lifecycle: WaitTimeout::seconds(10.0),
            motion_stop: WaitTimeout::seconds(30.0),
            ..FleetOptions::default()
        },
    )
}

/// True when no configured axis is still connected on the stack.
pub fn all_released(sim: &SimulationStack, names: &[&str]) -> bool {
    names.iter().all(|name| !sim.is_axis_connected(name))
}
