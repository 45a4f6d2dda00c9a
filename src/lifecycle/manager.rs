// ABOUTME: ContainerManager owns one container session: start, stop, restart.
// ABOUTME: A tokio task owns the child; state and session control sit behind one mutex.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::{Notify, mpsc, watch};

use crate::compose::{Action, Invocation, compose};
use crate::config::ResolvedConfig;
use crate::types::ReadyPattern;

use super::error::{AlreadyActiveSnafu, StartError};
use super::events::{LifecycleEvent, LifecycleEvents};
use super::process::{CommandSpawner, OutputLines, ProcessExit, Spawner};
use super::state::ContainerState;

/// Timeouts that are not part of the user config.
#[derive(Debug, Clone, Copy)]
pub struct ManagerTimeouts {
    /// How long to wait for exit after a forced kill.
    pub kill: Duration,
    /// How long to keep reading buffered output once the process has exited.
    pub drain: Duration,
}

impl Default for ManagerTimeouts {
    fn default() -> Self {
        Self {
            kill: Duration::from_secs(5),
            drain: Duration::from_secs(1),
        }
    }
}

/// Manages at most one container session at a time.
///
/// Cloning is cheap and every clone controls the same session, so a UI can
/// start from one context and stop from another.
#[derive(Clone)]
pub struct ContainerManager {
    inner: Arc<Inner>,
}

struct Inner {
    spawner: Arc<dyn Spawner>,
    timeouts: ManagerTimeouts,
    shared: Mutex<Shared>,
}

struct Shared {
    state: ContainerState,
    /// Config of the most recent start, reused by restart.
    config: ResolvedConfig,
    session: Option<SessionControl>,
    next_session: u64,
}

/// Handles stop() needs to reach the worker of the current session.
#[derive(Clone)]
struct SessionControl {
    id: u64,
    kill: Arc<Notify>,
    exited: watch::Receiver<bool>,
}

impl std::fmt::Debug for ContainerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerManager")
            .field("state", &self.state())
            .finish()
    }
}

impl ContainerManager {
    pub fn new(config: ResolvedConfig) -> Self {
        Self::with_spawner(config, Arc::new(CommandSpawner))
    }

    pub fn with_spawner(config: ResolvedConfig, spawner: Arc<dyn Spawner>) -> Self {
        Self::with_timeouts(config, spawner, ManagerTimeouts::default())
    }

    pub fn with_timeouts(
        config: ResolvedConfig,
        spawner: Arc<dyn Spawner>,
        timeouts: ManagerTimeouts,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                spawner,
                timeouts,
                shared: Mutex::new(Shared {
                    state: ContainerState::Idle,
                    config,
                    session: None,
                    next_session: 0,
                }),
            }),
        }
    }

    pub fn state(&self) -> ContainerState {
        self.inner.shared.lock().state
    }

    /// Config of the most recent start (or the one given at construction).
    pub fn config(&self) -> ResolvedConfig {
        self.inner.shared.lock().config.clone()
    }

    /// Start a session running the composed `up` invocation.
    ///
    /// Rejected without spawning anything unless the manager is idle or the
    /// previous session has ended. Spawn failures are not errors: the stream
    /// yields `Completed { success: false }` instead.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        &self,
        config: ResolvedConfig,
        detached: bool,
    ) -> Result<LifecycleEvents, StartError> {
        let invocation = compose(&config, Action::Up { detached });
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (exited_tx, exited_rx) = watch::channel(false);
        let kill = Arc::new(Notify::new());

        let id = {
            let mut shared = self.inner.shared.lock();
            if !shared.state.accepts_start() {
                return AlreadyActiveSnafu {
                    state: shared.state,
                }
                .fail();
            }
            shared.next_session += 1;
            let id = shared.next_session;
            shared.state = ContainerState::Starting;
            shared.config = config.clone();
            shared.session = Some(SessionControl {
                id,
                kill: Arc::clone(&kill),
                exited: exited_rx,
            });
            id
        };

        tracing::info!(session = id, "starting container: {}", invocation);

        let worker = Worker {
            inner: Arc::clone(&self.inner),
            id,
            invocation,
            spawnable: !config.runtime.is_none(),
            ready: config.launch.ready_pattern,
            events: events_tx,
            kill,
            exited: exited_tx,
        };
        tokio::spawn(worker.run());

        Ok(LifecycleEvents::new(events_rx))
    }

    /// Callback form of [`start`](Self::start).
    ///
    /// `on_output` receives every line in order, `on_started` runs at most
    /// once, and `on_completed` runs exactly once, after `on_started`. All
    /// three run on a tokio task; marshalling onto a UI thread is up to the
    /// caller.
    pub fn start_async<O, S, C>(
        &self,
        config: ResolvedConfig,
        detached: bool,
        mut on_output: O,
        on_started: S,
        on_completed: C,
    ) -> Result<(), StartError>
    where
        O: FnMut(String) + Send + 'static,
        S: FnOnce() + Send + 'static,
        C: FnOnce(bool) + Send + 'static,
    {
        let mut events = self.start(config, detached)?;
        tokio::spawn(async move {
            let mut on_started = Some(on_started);
            while let Some(event) = events.next().await {
                match event {
                    LifecycleEvent::Output(line) => on_output(line),
                    LifecycleEvent::Started => {
                        if let Some(started) = on_started.take() {
                            started();
                        }
                    }
                    LifecycleEvent::Completed { success } => {
                        on_completed(success);
                        return;
                    }
                }
            }
        });
        Ok(())
    }

    /// Stop the current session.
    ///
    /// Asks the runtime to stop the container, waits up to the configured
    /// stop timeout, then kills the process. Returns `true` once exit is
    /// confirmed, or immediately when nothing is running.
    pub async fn stop(&self) -> bool {
        let (control, config) = {
            let mut shared = self.inner.shared.lock();
            match shared.state {
                ContainerState::Idle | ContainerState::Stopped | ContainerState::Failed => {
                    return true;
                }
                ContainerState::Starting | ContainerState::Running => {
                    shared.state = ContainerState::Stopping;
                }
                // Another stop is in flight; wait on the same session.
                ContainerState::Stopping => {}
            }
            match shared.session.clone() {
                Some(control) => (control, shared.config.clone()),
                None => return true,
            }
        };

        let grace = config.launch.stop_timeout;
        let mut exited = control.exited;
        tracing::info!(session = control.id, "stopping container {}", config.launch.container_name);

        if !*exited.borrow() {
            self.request_graceful_stop(&config, grace).await;
        }
        if wait_for_exit(&mut exited, grace).await {
            return true;
        }

        tracing::warn!(
            session = control.id,
            "container did not exit within {:?}, killing it",
            grace
        );
        control.kill.notify_one();
        if wait_for_exit(&mut exited, self.inner.timeouts.kill).await {
            return true;
        }

        tracing::error!(session = control.id, "could not confirm container termination");
        false
    }

    async fn request_graceful_stop(&self, config: &ResolvedConfig, grace: Duration) {
        let down = compose(config, Action::Down);
        tracing::debug!("running {}", down);
        match tokio::time::timeout(grace, self.inner.spawner.run(&down)).await {
            Ok(Ok(exit)) if exit.success() => {}
            Ok(Ok(exit)) => tracing::warn!("{} exited with {:?}", down.program, exit.code),
            Ok(Err(e)) => tracing::warn!("failed to run {}: {}", down.program, e),
            Err(_) => tracing::warn!("{} did not finish within {:?}", down.program, grace),
        }
    }

    /// Stop, then start in the foreground with the last config and wait until
    /// the launcher is ready.
    ///
    /// Returns `false` without starting when the stop could not be confirmed.
    /// Otherwise returns `true` once the ready marker is seen, or the exit
    /// status if the process ends first. Output keeps flowing to `on_output`
    /// after this returns.
    pub async fn restart<F>(&self, mut on_output: F) -> bool
    where
        F: FnMut(String) + Send + 'static,
    {
        if !self.stop().await {
            tracing::error!("restart aborted: previous session did not stop");
            return false;
        }

        let config = self.config();
        let mut events = match self.start(config, false) {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!("restart could not start: {}", e);
                return false;
            }
        };

        while let Some(event) = events.next().await {
            match event {
                LifecycleEvent::Output(line) => on_output(line),
                LifecycleEvent::Started => {
                    tokio::spawn(async move {
                        while let Some(event) = events.next().await {
                            if let LifecycleEvent::Output(line) = event {
                                on_output(line);
                            }
                        }
                    });
                    return true;
                }
                LifecycleEvent::Completed { success } => return success,
            }
        }
        false
    }
}

async fn wait_for_exit(exited: &mut watch::Receiver<bool>, limit: Duration) -> bool {
    matches!(
        tokio::time::timeout(limit, exited.wait_for(|done| *done)).await,
        Ok(Ok(_))
    )
}

/// Owns the child process for one session.
struct Worker {
    inner: Arc<Inner>,
    id: u64,
    invocation: Invocation,
    spawnable: bool,
    ready: ReadyPattern,
    events: mpsc::UnboundedSender<LifecycleEvent>,
    kill: Arc<Notify>,
    exited: watch::Sender<bool>,
}

impl Worker {
    async fn run(self) {
        let spawned = if self.spawnable {
            self.inner.spawner.spawn(&self.invocation)
        } else {
            Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no container runtime configured",
            ))
        };
        let mut process = match spawned {
            Ok(process) => process,
            Err(e) => {
                tracing::error!(session = self.id, "failed to spawn {}: {}", self.invocation.program, e);
                self.finish(None);
                return;
            }
        };

        let mut output: OutputLines = process
            .take_output()
            .unwrap_or_else(|| Box::pin(futures::stream::empty()));
        let mut output_open = true;
        let mut ready_seen = false;

        let exit = loop {
            let mut kill_now = false;
            tokio::select! {
                line = output.next(), if output_open => match line {
                    Some(line) => self.deliver(line, &mut ready_seen),
                    None => output_open = false,
                },
                _ = self.kill.notified() => kill_now = true,
                status = process.wait() => break status,
            }
            if kill_now && let Err(e) = process.start_kill() {
                tracing::warn!(session = self.id, "kill failed: {}", e);
            }
        };

        if output_open {
            let drain = async {
                while let Some(line) = output.next().await {
                    self.deliver(line, &mut ready_seen);
                }
            };
            if tokio::time::timeout(self.inner.timeouts.drain, drain).await.is_err() {
                tracing::debug!(session = self.id, "output still open after exit, dropping the rest");
            }
        }

        let exit = match exit {
            Ok(exit) => Some(exit),
            Err(e) => {
                tracing::error!(session = self.id, "failed to wait for container process: {}", e);
                None
            }
        };
        self.finish(exit);
    }

    /// Forward a line, then fire `Started` if it is the first ready match.
    fn deliver(&self, line: String, ready_seen: &mut bool) {
        let matched = !*ready_seen && self.ready.is_match(&line);
        let _ = self.events.send(LifecycleEvent::Output(line));
        if matched {
            *ready_seen = true;
            if self.mark_running() {
                tracing::info!(session = self.id, "launcher is ready");
                let _ = self.events.send(LifecycleEvent::Started);
            }
        }
    }

    fn mark_running(&self) -> bool {
        let mut shared = self.inner.shared.lock();
        let current = shared.session.as_ref().is_some_and(|s| s.id == self.id);
        if current && shared.state == ContainerState::Starting {
            shared.state = ContainerState::Running;
            true
        } else {
            false
        }
    }

    /// Record the final state and emit the single `Completed` event.
    fn finish(self, exit: Option<ProcessExit>) {
        let success = exit.is_some_and(|e| e.success());
        {
            let mut shared = self.inner.shared.lock();
            if shared.session.as_ref().is_some_and(|s| s.id == self.id) {
                let stop_requested = shared.state == ContainerState::Stopping;
                shared.state = if stop_requested || success {
                    ContainerState::Stopped
                } else {
                    ContainerState::Failed
                };
                shared.session = None;
                tracing::info!(
                    session = self.id,
                    exit_code = ?exit.and_then(|e| e.code),
                    "container exited, now {}",
                    shared.state
                );
            }
        }
        self.exited.send_replace(true);
        let _ = self.events.send(LifecycleEvent::Completed { success });
    }
}
