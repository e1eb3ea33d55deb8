//! Progress reporting seam.
//!
//! Background work reports free-text phase names; there is no percentage granularity.
//! Every sink handed to an invocation is closed exactly once via `ProgressGuard`,
//! whether the invocation succeeds, fails or is cancelled.

use std::sync::Arc;

/// UI-facing progress sink (a progress dialog, a terminal spinner, a log line).
pub trait ProgressSink: Send + Sync {
    /// Set the headline task name.
    fn set_task_name(&self, name: &str);
    /// Report a sub-phase under the current task.
    fn report(&self, message: &str);
    /// Close the sink. Called once per invocation.
    fn finished(&self);
}

/// A sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn set_task_name(&self, _name: &str) {}
    fn report(&self, _message: &str) {}
    fn finished(&self) {}
}

/// Closes the wrapped sink when dropped.
pub struct ProgressGuard {
    sink: Arc<dyn ProgressSink>,
}

impl ProgressGuard {
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &dyn ProgressSink {
        self.sink.as_ref()
    }
}

impl Drop for ProgressGuard {
    fn drop(&mut self) {
        self.sink.finished();
    }
}
