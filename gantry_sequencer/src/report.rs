//! Run and cleanup reports.
//!
//! The primary status is the first forward-chain failure. Cleanup failures
//! are reported beside it and never replace it.

use crate::error::SequenceError;
use crate::fleet::TearDownReport;
use serde::Serialize;

/// Process exit code: full success.
pub const EXIT_SUCCESS: i32 = 0;
/// Process exit code: the forward chain failed.
pub const EXIT_FORWARD_FAILURE: i32 = 1;
/// Process exit code: the forward chain succeeded but cleanup did not.
pub const EXIT_CLEANUP_FAILURE: i32 = 2;

/// Release outcome of one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRelease {
    pub node: String,
    pub result: Result<(), SequenceError>,
}

/// Outcome of the cleanup chain. Every entry was attempted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanupReport {
    /// Mechanism delete, when a mechanism was live.
    pub mechanism: Option<Result<(), SequenceError>>,
    /// Tear-down done when bring-up aborted, kept for diagnostics.
    pub aborted_bring_up: Option<TearDownReport>,
    pub axes: TearDownReport,
    pub nodes: Vec<NodeRelease>,
    /// Host termination, when the host was up.
    pub host: Option<Result<(), SequenceError>>,
}

impl CleanupReport {
    /// First cleanup failure, in cleanup order.
    pub fn first_error(&self) -> Option<&SequenceError> {
        let mechanism = self.mechanism.as_ref().and_then(|r| r.as_ref().err());
        let nodes = self.nodes.iter().find_map(|n| n.result.as_ref().err());
        let host = self.host.as_ref().and_then(|r| r.as_ref().err());
        mechanism
            .or_else(|| self.axes.first_error())
            .or(nodes)
            .or(host)
    }

    pub fn is_ok(&self) -> bool {
        self.first_error().is_none()
    }
}

/// Complete outcome of one motion cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// First forward-chain failure.
    pub primary: Result<(), SequenceError>,
    pub cleanup: CleanupReport,
    /// Spline samples streamed, when motion was streamed.
    pub samples: Option<usize>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.primary.is_ok() && self.cleanup.is_ok()
    }

    /// 0 on full success, 1 on a forward-chain failure, 2 on a
    /// cleanup-only failure.
    pub fn exit_code(&self) -> i32 {
        match (&self.primary, self.cleanup.is_ok()) {
            (Err(_), _) => EXIT_FORWARD_FAILURE,
            (Ok(()), false) => EXIT_CLEANUP_FAILURE,
            (Ok(()), true) => EXIT_SUCCESS,
        }
    }

    /// Secondary status: the first cleanup failure.
    pub fn cleanup_error(&self) -> Option<&SequenceError> {
        self.cleanup.first_error()
    }

    /// Report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
