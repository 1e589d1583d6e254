/// Recording session state machine.
///
/// ```text
/// idle --start--> listening --stop--> idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Listening,
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_listening(&self) -> bool {
        matches!(self, Self::Listening)
    }
}

/// Lifecycle of a single capture source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Stopped,
    Running,
}

impl SourceState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}
