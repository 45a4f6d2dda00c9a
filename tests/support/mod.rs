// ABOUTME: Test support utilities.
// ABOUTME: Provides a scripted fake spawner, fake runtime scripts, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use craftpod::compose::Invocation;
use craftpod::config::{LaunchSettings, ResolvedConfig};
use craftpod::host::{AudioServer, DisplayServer, GpuVendor, Runtime};
use craftpod::lifecycle::{OutputLines, ProcessExit, ProcessHandle, Spawner};
use parking_lot::Mutex;
use tokio::sync::watch;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("craftpod=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Resolved config for a headless session with a short stop timeout.
#[allow(dead_code)]
pub fn test_config(runtime: Runtime) -> ResolvedConfig {
    let launch = LaunchSettings {
        stop_timeout: Duration::from_millis(200),
        ..LaunchSettings::default()
    };
    ResolvedConfig::new(runtime, GpuVendor::None, DisplayServer::None, AudioServer::None)
        .with_launch(launch)
}

/// Write an executable shell script to `dir/name`.
#[allow(dead_code)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let path = dir.join(name);
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .mode(0o755)
        .open(&path)
        .unwrap();
    writeln!(file, "#!/bin/sh").unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file.sync_all().unwrap();
    drop(file);
    path
}

/// How a fake container process behaves.
#[derive(Debug, Clone, Default)]
#[allow(dead_code)]
pub struct FakeBehavior {
    /// Lines written before anything else happens.
    pub lines: Vec<String>,
    /// Exit code reported right after the lines; `None` runs until stopped.
    pub exit_code: Option<i32>,
    /// The runtime's `stop` command ends the process.
    pub graceful_stop: bool,
    /// Forced kills are ignored.
    pub ignore_kill: bool,
    /// `spawn` itself fails.
    pub fail_spawn: bool,
}

#[allow(dead_code)]
impl FakeBehavior {
    pub fn lines(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn exits_with(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    pub fn stops_gracefully(mut self) -> Self {
        self.graceful_stop = true;
        self
    }

    pub fn ignores_kill(mut self) -> Self {
        self.ignore_kill = true;
        self
    }
}

/// Spawner that fakes processes and counts what it was asked to do.
#[derive(Default)]
#[allow(dead_code)]
pub struct FakeSpawner {
    behavior: FakeBehavior,
    spawned: AtomicUsize,
    ran: Mutex<Vec<Invocation>>,
    current: Mutex<Option<Arc<watch::Sender<Option<ProcessExit>>>>>,
}

#[allow(dead_code)]
impl FakeSpawner {
    pub fn new(behavior: FakeBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            ..Self::default()
        })
    }

    pub fn spawn_count(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }

    /// Short commands run so far, such as `stop`.
    pub fn runs(&self) -> Vec<Invocation> {
        self.ran.lock().clone()
    }
}

#[async_trait]
impl Spawner for FakeSpawner {
    fn spawn(&self, _invocation: &Invocation) -> std::io::Result<Box<dyn ProcessHandle>> {
        self.spawned.fetch_add(1, Ordering::SeqCst);
        if self.behavior.fail_spawn {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "fake spawn failure",
            ));
        }

        let initial = self
            .behavior
            .exit_code
            .map(|code| ProcessExit { code: Some(code) });
        let (exit_tx, exit_rx) = watch::channel(initial);
        let exit_tx = Arc::new(exit_tx);
        *self.current.lock() = Some(Arc::clone(&exit_tx));

        let output: OutputLines = Box::pin(futures::stream::iter(self.behavior.lines.clone()));
        Ok(Box::new(FakeProcess {
            output: Some(output),
            exit_rx,
            exit_tx,
            ignore_kill: self.behavior.ignore_kill,
        }))
    }

    async fn run(&self, invocation: &Invocation) -> std::io::Result<ProcessExit> {
        self.ran.lock().push(invocation.clone());
        let stopping = invocation.args.first().is_some_and(|a| a == "stop");
        if stopping
            && self.behavior.graceful_stop
            && let Some(exit) = self.current.lock().as_ref()
        {
            exit.send_replace(Some(ProcessExit { code: Some(0) }));
        }
        Ok(ProcessExit { code: Some(0) })
    }
}

#[allow(dead_code)]
struct FakeProcess {
    output: Option<OutputLines>,
    exit_rx: watch::Receiver<Option<ProcessExit>>,
    exit_tx: Arc<watch::Sender<Option<ProcessExit>>>,
    ignore_kill: bool,
}

#[async_trait]
impl ProcessHandle for FakeProcess {
    fn take_output(&mut self) -> Option<OutputLines> {
        self.output.take()
    }

    async fn wait(&mut self) -> std::io::Result<ProcessExit> {
        let exit = *self
            .exit_rx
            .wait_for(|exit| exit.is_some())
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(exit.unwrap_or(ProcessExit { code: None }))
    }

    fn start_kill(&mut self) -> std::io::Result<()> {
        if !self.ignore_kill {
            self.exit_tx.send_replace(Some(ProcessExit { code: None }));
        }
        Ok(())
    }
}
