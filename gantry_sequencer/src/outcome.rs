//! Sticky first-error accumulator.
//!
//! Threaded through the forward chain: once a step fails, the error is
//! kept and every later step is skipped, but the chain itself still runs
//! to its end so the caller reaches its cleanup code.

use crate::error::SequenceError;
use tracing::debug;

/// First error of an ordered chain of steps.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct SequenceOutcome {
    error: Option<SequenceError>,
}

impl SequenceOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn error(&self) -> Option<&SequenceError> {
        self.error.as_ref()
    }

    /// Run `f` if no step has failed yet.
    ///
    /// Returns the step's value, or `None` when it failed or was skipped.
    pub fn step<T>(
        &mut self,
        name: &str,
        f: impl FnOnce() -> Result<T, SequenceError>,
    ) -> Option<T> {
        if let Some(err) = &self.error {
            debug!(step = name, cause = %err.location(), "Skipped");
            return None;
        }
        match f() {
            Ok(value) => Some(value),
            Err(err) => {
                self.error = Some(err);
                None
            }
        }
    }

    /// Like [`step`](Self::step), feeding it the value of an earlier step.
    ///
    /// A missing input means an earlier step failed, so `f` is skipped.
    pub fn step_with<A, T>(
        &mut self,
        name: &str,
        input: Option<A>,
        f: impl FnOnce(A) -> Result<T, SequenceError>,
    ) -> Option<T> {
        match input {
            Some(input) => self.step(name, || f(input)),
            None => {
                debug!(step = name, "Skipped");
                None
            }
        }
    }

    /// Keep `result`'s error unless an earlier one is already held.
    pub fn record(&mut self, result: Result<(), SequenceError>) {
        if self.error.is_none() {
            self.error = result.err();
        }
    }

    pub fn into_result(self) -> Result<(), SequenceError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
