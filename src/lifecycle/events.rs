// ABOUTME: Typed lifecycle events streamed from a container session.
// ABOUTME: Output lines in order, at most one Started, exactly one Completed last.

use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// One line of combined stdout/stderr, without its line terminator.
    Output(String),
    /// The ready pattern matched for the first time.
    Started,
    /// The process is gone. Always the final event of a session.
    Completed { success: bool },
}

/// Event stream for one session. Ends after `Completed`.
#[derive(Debug)]
pub struct LifecycleEvents {
    rx: mpsc::UnboundedReceiver<LifecycleEvent>,
}

impl LifecycleEvents {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<LifecycleEvent>) -> Self {
        Self { rx }
    }
}

impl Stream for LifecycleEvents {
    type Item = LifecycleEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
