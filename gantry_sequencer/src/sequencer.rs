//! Top-level motion sequence.
//!
//! Forward chain, with sticky first-error semantics:
//!
//! ```text
//! init_host → connect_nodes → bring_up_axes → create_mechanism
//!   → current_position → plan_trajectory → solve_inverse_kinematics
//!   → stream_motion → wait_motion_complete → delete_mechanism
//! ```
//!
//! Cleanup chain, always run and never short-circuited:
//!
//! ```text
//! delete_mechanism (if live) → tear_down_axes → disconnect_nodes → term_host (if up)
//! ```

use crate::config::SequencerConfig;
use crate::error::{vendor_failure, SequenceError, Step};
use crate::fleet::AxisFleet;
use crate::mechanism::MechanismController;
use crate::node::NodeController;
use crate::outcome::SequenceOutcome;
use crate::report::{CleanupReport, NodeRelease, RunReport};
use gantry_common::stack::MotionStack;
use tracing::{error, info, warn};

const HOST: &str = "host";

/// Runs one complete motion cycle against a motion stack.
#[derive(Debug, Clone)]
pub struct MotionSequencer {
    config: SequencerConfig,
}

/// Everything owned for the duration of one run.
struct RunState {
    host_up: bool,
    nodes: Vec<NodeController>,
    fleet: AxisFleet,
    mechanism: MechanismController,
}

impl MotionSequencer {
    /// The configuration is used as given; call
    /// [`SequencerConfig::validate`] beforehand to reject bad files early.
    pub fn new(config: SequencerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Run the forward chain, then the cleanup chain.
    pub fn run(&self, stack: &mut dyn MotionStack) -> RunReport {
        info!(
            service = %self.config.shared.service_name,
            stack = stack.name(),
            axes = self.config.axes.len(),
            "Motion sequence starting"
        );
        let mut run = RunState {
            host_up: false,
            nodes: self.config.nodes.iter().map(NodeController::new).collect(),
            fleet: AxisFleet::new(self.config.axes.as_slice(), self.config.fleet_options()),
            mechanism: MechanismController::new(),
        };

        let (primary, samples) = self.forward(stack, &mut run);
        let cleanup = self.cleanup(stack, &mut run);

        let report = RunReport {
            primary,
            cleanup,
            samples,
        };
        match (&report.primary, report.cleanup_error()) {
            (Ok(()), None) => info!("Motion sequence complete"),
            (Err(err), _) => error!(location = %err.location(), "Motion sequence failed: {err}"),
            (Ok(()), Some(err)) => {
                warn!(location = %err.location(), "Motion sequence complete, cleanup failed: {err}")
            }
        }
        report
    }

    fn forward(
        &self,
        stack: &mut dyn MotionStack,
        run: &mut RunState,
    ) -> (Result<(), SequenceError>, Option<usize>) {
        let config = &self.config;
        let mut outcome = SequenceOutcome::new();

        outcome.step("init_host", || {
            stack
                .init_host(config.host.mode)
                .map_err(|status| vendor_failure(stack, HOST, Step::InitHost, status))
        });
        run.host_up = outcome.is_ok();

        for node in &mut run.nodes {
            outcome.step("connect_node", || node.connect(stack));
        }

        outcome.step("bring_up_axes", || run.fleet.bring_up_all(stack));

        outcome.step("create_mechanism", || {
            run.mechanism.create(
                stack,
                run.fleet.axes_mut(),
                config.mechanism.dof_mask(),
                config.mechanism.kinematics,
            )
        });

        let start = outcome.step("current_position", || run.mechanism.current_position(stack));
        let path = outcome.step_with("plan_trajectory", start, |start| {
            run.mechanism.plan_circle(stack, &config.trajectory, start)
        });
        let buffers = outcome.step_with("solve_inverse_kinematics", path, |path| {
            run.mechanism
                .solve_inverse_kinematics(stack, &path, &config.joint_buffers())
        });
        let samples = outcome.step_with("stream_motion", buffers, |buffers| {
            run.mechanism.stream_motion(stack, &buffers)?;
            Ok(buffers.joints.first().map_or(0, |j| j.positions.len()))
        });
        outcome.step("wait_motion_complete", || {
            run.mechanism
                .wait_motion_complete(stack, config.timeouts.motion_complete())
        });

        outcome.step("delete_mechanism", || {
            run.mechanism.delete(stack, run.fleet.axes_mut())
        });

        (outcome.into_result(), samples)
    }

    fn cleanup(&self, stack: &mut dyn MotionStack, run: &mut RunState) -> CleanupReport {
        let mut report = CleanupReport {
            aborted_bring_up: run.fleet.take_abort_report(),
            ..CleanupReport::default()
        };

        if run.mechanism.is_live() {
            report.mechanism = Some(run.mechanism.delete(stack, run.fleet.axes_mut()));
        }

        report.axes = run.fleet.tear_down_all(stack);

        // Nodes are released in reverse connect order.
        for node in run.nodes.iter_mut().rev().filter(|n| n.is_connected()) {
            let result = node.disconnect(stack);
            report.nodes.push(NodeRelease {
                node: node.name().to_string(),
                result,
            });
        }

        if run.host_up {
            let result = stack
                .term_host()
                .map_err(|status| vendor_failure(stack, HOST, Step::TermHost, status));
            if result.is_ok() {
                run.host_up = false;
            }
            report.host = Some(result);
        }
        report
    }
}
