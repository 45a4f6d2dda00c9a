// ABOUTME: Asynchronous lifecycle management of the launcher container process.
// ABOUTME: Exports the manager, its state machine, event stream and spawning seam.

mod error;
mod events;
mod manager;
mod process;
mod state;

pub use error::StartError;
pub use events::{LifecycleEvent, LifecycleEvents};
pub use manager::{ContainerManager, ManagerTimeouts};
pub use process::{CommandSpawner, OutputLines, ProcessExit, ProcessHandle, Spawner};
pub use state::ContainerState;
