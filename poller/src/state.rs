//! Scheduler state definitions.

/// Poll scheduler lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Created, loop not entered yet.
    Starting,
    /// Loop is ticking.
    Running,
    /// Stop requested; the current tick finishes first.
    Stopping,
    /// Loop has exited.
    Stopped,
}

impl SchedulerState {
    /// Check if a stop was requested or completed.
    pub fn is_shutting_down(&self) -> bool {
        matches!(self, SchedulerState::Stopping | SchedulerState::Stopped)
    }
}
