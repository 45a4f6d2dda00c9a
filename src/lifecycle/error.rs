// ABOUTME: Start rejection error with SNAFU pattern.
// ABOUTME: Spawn failures are not errors here; they arrive as Completed { success: false }.

use snafu::Snafu;

use super::state::ContainerState;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StartError {
    #[snafu(display("a container session is already active (state: {state})"))]
    AlreadyActive { state: ContainerState },
}

impl StartError {
    /// State the manager was in when the start was rejected.
    pub fn state(&self) -> ContainerState {
        match self {
            StartError::AlreadyActive { state } => *state,
        }
    }
}
