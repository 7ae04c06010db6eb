//! Communication node controller.

use crate::error::{vendor_failure, SequenceError, Step};
use gantry_common::motion::NodeHandle;
use gantry_common::stack::MotionStack;
use tracing::info;

/// One node on the control bus: connected or not.
#[derive(Debug, Clone)]
pub struct NodeController {
    name: String,
    handle: Option<NodeHandle>,
}

impl NodeController {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handle: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Connect by name. A no-op when already connected.
    pub fn connect(&mut self, stack: &mut dyn MotionStack) -> Result<(), SequenceError> {
        if self.handle.is_some() {
            return Ok(());
        }
        let handle = stack
            .node_connect(&self.name)
            .map_err(|status| vendor_failure(stack, &self.name, Step::NodeConnect, status))?;
        self.handle = Some(handle);
        info!(node = %self.name, %handle, "Node connected");
        Ok(())
    }

    /// Disconnect. On failure the node is still reported connected.
    pub fn disconnect(&mut self, stack: &mut dyn MotionStack) -> Result<(), SequenceError> {
        let Some(handle) = self.handle else {
            return Ok(());
        };
        stack
            .node_disconnect(handle)
            .map_err(|status| vendor_failure(stack, &self.name, Step::NodeDisconnect, status))?;
        self.handle = None;
        info!(node = %self.name, "Node disconnected");
        Ok(())
    }
}
