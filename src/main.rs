// ABOUTME: Entry point for the craftpod CLI application.
// ABOUTME: Parses arguments, resolves config against the host, and dispatches commands.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use craftpod::compose::{Action, compose, get_command_preview};
use craftpod::config::{self, Config, ResolvedConfig};
use craftpod::error::{Error, Result};
use craftpod::host::{DetectionResult, DisplayServer, detect_system, get_detection_details};
use craftpod::lifecycle::{CommandSpawner, ContainerManager, LifecycleEvent, Spawner};
use craftpod::output::{Output, OutputMode};
use craftpod::preflight::{ValidationReport, run_xhost_if_needed, validate_system};
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let mut output = Output::new(mode);

    if let Err(e) = run(cli, &mut output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &mut Output) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_config_path()?,
    };

    if let Commands::Init { force } = cli.command {
        config::init_config(&config_path, force)?;
        output.success(&format!("Created {}", config_path.display()));
        return Ok(());
    }

    let config = Config::discover(&config_path)?.with_overrides(cli.overrides.into_overrides());
    let detected = detect_system();
    let resolved = config.resolve(&detected);

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Detect => detect(&config, &detected, output),
        Commands::Doctor => doctor(&resolved, output),
        Commands::Preview { action, detach } => {
            let action = match action {
                Action::Up { .. } => Action::Up { detached: detach },
                other => other,
            };
            println!("{}", get_command_preview(&resolved, action));
            Ok(())
        }
        Commands::Up { detach } => up(resolved, detach, output).await,
        Commands::Down => run_action(&resolved, Action::Down, output).await,
        Commands::Restart => run_action(&resolved, Action::Restart, output).await,
    }
}

/// Print detected values next to the configured choice.
fn detect(config: &Config, detected: &DetectionResult, output: &Output) -> Result<()> {
    if output.mode() == OutputMode::Json {
        let details = get_detection_details();
        println!("{}", serde_json::to_string_pretty(&details)?);
        return Ok(());
    }

    println!("Runtime: {:<10} (config: {})", detected.runtime.to_string(), config.runtime);
    println!("GPU:     {:<10} (config: {})", detected.gpu.to_string(), config.gpu);
    println!("Display: {:<10} (config: {})", detected.display.to_string(), config.display);
    println!("Audio:   {:<10} (config: {})", detected.audio.to_string(), config.audio);
    Ok(())
}

/// Detection details plus a validation run.
fn doctor(resolved: &ResolvedConfig, output: &Output) -> Result<()> {
    let details = get_detection_details();
    output.progress("Running system diagnostics...\n");
    output.progress(&format!(
        "Runtime: {} ({})",
        details.runtime.value, details.runtime.path
    ));
    output.progress(&format!("GPU: {}", details.gpu.details));
    output.progress(&format!(
        "Display: {} (session: {})",
        details.display.value, details.display.session_type
    ));
    output.progress(&format!("Audio: {}", details.audio.details));

    output.progress("\nValidation:");
    let report = validate_system(resolved);
    if report.issues().is_empty() {
        output.progress("✓ No issues found");
    }
    print_issues(&report, output);

    if report.is_valid() {
        output.success("System ready!");
        Ok(())
    } else {
        Err(Error::ValidationFailed(report.blocking_count()))
    }
}

fn print_issues(report: &ValidationReport, output: &Output) {
    for issue in report.issues() {
        if issue.is_blocking() {
            output.blocking(&issue.to_string());
        } else {
            output.warning(&issue.to_string());
        }
    }
}

/// Validate, grant X access, then run the container until it exits.
/// Ctrl-C requests a stop; the session still ends through its completion event.
/// A detached run completes once the runtime has created the container.
async fn up(resolved: ResolvedConfig, detach: bool, output: &mut Output) -> Result<()> {
    output.progress("Validating system...");
    let report = validate_system(&resolved);
    print_issues(&report, output);
    if !report.is_valid() {
        return Err(Error::ValidationFailed(report.blocking_count()));
    }
    output.progress("✓ Validation passed");

    if resolved.display == DisplayServer::X11 && resolved.auto_xhost {
        output.progress("Setting X11 permissions...");
        if run_xhost_if_needed(&resolved) {
            output.progress("✓ X11 permissions set");
        } else {
            output.warning("Could not set X11 permissions automatically");
        }
    }

    output.progress(&format!(
        "\nCommand: {}\n",
        get_command_preview(&resolved, Action::Up { detached: detach })
    ));

    let manager = ContainerManager::new(resolved.clone());
    let mut events = manager.start(resolved, detach)?;
    output.start_timer();

    let mut stop_requested = false;
    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(LifecycleEvent::Output(line)) => output.container_line(&line),
                Some(LifecycleEvent::Started) => output.success("Launcher is running"),
                Some(LifecycleEvent::Completed { success: true }) if detach => {
                    output.success(
                        "Launcher container started in the background; use `craftpod down` to stop it",
                    );
                    return Ok(());
                }
                Some(LifecycleEvent::Completed { success }) if success || stop_requested => {
                    output.success("Container stopped");
                    return Ok(());
                }
                Some(LifecycleEvent::Completed { .. }) => return Err(Error::ContainerFailed),
                None => return Ok(()),
            },
            _ = tokio::signal::ctrl_c(), if !stop_requested => {
                stop_requested = true;
                output.progress("\nStopping container...");
                let manager = manager.clone();
                tokio::spawn(async move {
                    if !manager.stop().await {
                        tracing::error!("failed to stop container");
                    }
                });
            }
        }
    }
}

/// Run a short runtime command such as `down` or `restart`.
async fn run_action(resolved: &ResolvedConfig, action: Action, output: &Output) -> Result<()> {
    let invocation = compose(resolved, action);
    output.progress(&format!("Command: {invocation}"));

    let exit = CommandSpawner.run(&invocation).await?;
    if exit.success() {
        output.success(&format!("{action} complete"));
        Ok(())
    } else {
        Err(Error::CommandFailed {
            program: invocation.program,
            code: exit.code,
        })
    }
}
