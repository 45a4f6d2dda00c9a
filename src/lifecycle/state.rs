// ABOUTME: Container session state owned by a ContainerManager.
// ABOUTME: Idle -> Starting -> Running -> Stopping -> Stopped, with Failed on unexpected exit.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerState {
    /// No session has run yet.
    #[default]
    Idle,
    /// Process spawned, ready marker not seen yet.
    Starting,
    /// Ready marker seen.
    Running,
    /// Stop requested, exit not confirmed yet.
    Stopping,
    /// Exited normally or after a requested stop.
    Stopped,
    /// Exited on its own with a failure status, or never spawned.
    Failed,
}

impl ContainerState {
    /// Whether a new session may be started from this state.
    pub fn accepts_start(self) -> bool {
        matches!(
            self,
            ContainerState::Idle | ContainerState::Stopped | ContainerState::Failed
        )
    }

    /// Whether a process may still be alive.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ContainerState::Starting | ContainerState::Running | ContainerState::Stopping
        )
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContainerState::Idle => "idle",
            ContainerState::Starting => "starting",
            ContainerState::Running => "running",
            ContainerState::Stopping => "stopping",
            ContainerState::Stopped => "stopped",
            ContainerState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_idle_and_terminal_states_accept_start() {
        assert!(ContainerState::Idle.accepts_start());
        assert!(ContainerState::Stopped.accepts_start());
        assert!(ContainerState::Failed.accepts_start());
        assert!(!ContainerState::Starting.accepts_start());
        assert!(!ContainerState::Running.accepts_start());
        assert!(!ContainerState::Stopping.accepts_start());
    }

    #[test]
    fn active_states_are_the_complement() {
        for state in [
            ContainerState::Idle,
            ContainerState::Starting,
            ContainerState::Running,
            ContainerState::Stopping,
            ContainerState::Stopped,
            ContainerState::Failed,
        ] {
            assert_eq!(state.is_active(), !state.accepts_start(), "{state}");
        }
    }
}
