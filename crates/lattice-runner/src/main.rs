//! Headless driver for the lattice gas automaton.
//!
//! Interactive mode renders text frames to stdout and reads control commands
//! (`start`, `pause`, `step`, `reset`, `speed <n>`, ...) from stdin.

mod controller;
mod render;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use controller::{log_stats, Command, Controller, Outcome, Tick};
use lattice_core::RunnerConfig;
use lattice_world::BatchRun;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tokio::signal;
use tokio::sync::mpsc;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "lattice-runner",
    version,
    about = "Run the hexagonal lattice gas automaton in the terminal"
)]
struct Args {
    /// JSON runner configuration. Built-in defaults are used when omitted.
    config: Option<PathBuf>,

    /// Run this many steps without a driver loop and print the summary as JSON.
    #[arg(long, value_name = "STEPS")]
    batch: Option<u64>,
}

fn load_config(path: Option<&Path>) -> Result<RunnerConfig> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            Ok(RunnerConfig::from_json(&json)?)
        }
        None => Ok(RunnerConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    telemetry::init_telemetry(config.log_json)?;

    info!(
        width = config.lattice.width,
        height = config.lattice.height,
        density = config.lattice.density,
        steps_per_second = config.steps_per_second,
        "Starting lattice runner"
    );

    if let Some(steps) = args.batch {
        let result = BatchRun::new(config.lattice, steps).execute()?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let (tx, rx) = mpsc::channel(32);
    spawn_command_reader(BufReader::new(std::io::stdin()), tx);

    run_interactive(&config, rx).await
}

async fn run_interactive(config: &RunnerConfig, mut rx: mpsc::Receiver<String>) -> Result<()> {
    let mut controller = Controller::new(config)?;

    let mut ticker = cadence(&controller);
    let mut input_open = true;
    draw(&controller)?;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match controller.tick() {
                    Tick::Idle => {}
                    Tick::Stepped => draw(&controller)?,
                    Tick::Finished => {
                        draw(&controller)?;
                        info!("Reached max steps");
                        break;
                    }
                }
            }
            line = rx.recv(), if input_open => {
                let Some(line) = line else {
                    input_open = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }

                let outcome = line
                    .parse::<Command>()
                    .and_then(|command| controller.apply(command));
                match outcome {
                    Ok(Outcome::Redraw) => draw(&controller)?,
                    Ok(Outcome::Retime) => ticker = cadence(&controller),
                    Ok(Outcome::Unchanged) => {}
                    Ok(Outcome::Quit) => break,
                    Err(e) => warn!("Ignoring command '{}': {:#}", line.trim(), e),
                }
            }
            _ = &mut shutdown => break,
        }

        // Nothing can resume a paused run once input is gone
        if !input_open && !controller.is_running() {
            info!("Input closed while paused");
            break;
        }
    }

    info!("Shutting down runner");
    log_stats(&controller.simulation().stats());

    Ok(())
}

fn cadence(controller: &Controller) -> Interval {
    let mut ticker = interval(controller.period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

fn draw(controller: &Controller) -> Result<()> {
    let frame = controller.frame()?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(frame.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Forward input lines to the driver loop from a detached OS thread.
/// A blocking read there never holds up runtime shutdown.
fn spawn_command_reader<R: BufRead + Send + 'static>(reader: R, tx: mpsc::Sender<String>) {
    std::thread::spawn(move || {
        for line in reader.lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read command: {}", e);
                    break;
                }
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_core::LatticeConfig;
    use std::io::Read;
    use std::time::{Duration, Instant};

    /// Blocks every read until the paired sender is dropped, like a terminal
    /// nobody types into.
    struct SilentInput(std::sync::mpsc::Receiver<()>);

    impl Read for SilentInput {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    #[test]
    fn test_args_parsing() {
        let args = Args::try_parse_from(["lattice-runner"]).unwrap();
        assert!(args.config.is_none());
        assert!(args.batch.is_none());

        let args =
            Args::try_parse_from(["lattice-runner", "configs/reflective.json", "--batch", "250"])
                .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("configs/reflective.json")));
        assert_eq!(args.batch, Some(250));

        assert!(Args::try_parse_from(["lattice-runner", "--batch", "many"]).is_err());
        assert!(Args::try_parse_from(["lattice-runner", "--frames", "3"]).is_err());

        let help = Args::try_parse_from(["lattice-runner", "--help"]).unwrap_err();
        assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_load_config() {
        assert_eq!(load_config(None).unwrap().steps_per_second, 10);
        assert!(load_config(Some(Path::new("does/not/exist.json"))).is_err());
    }

    #[test]
    fn test_exits_at_max_steps_while_input_stays_open() {
        let config = RunnerConfig {
            lattice: LatticeConfig {
                width: 8,
                height: 8,
                seed: Some(1),
                ..Default::default()
            },
            steps_per_second: 60,
            autostart: true,
            max_steps: Some(3),
            ..Default::default()
        };

        let (hold_open, pending) = std::sync::mpsc::channel::<()>();
        let (tx, rx) = mpsc::channel(32);
        spawn_command_reader(BufReader::new(SilentInput(pending)), tx);

        let started = Instant::now();
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime
            .block_on(async {
                tokio::time::timeout(Duration::from_secs(5), run_interactive(&config, rx)).await
            })
            .expect("driver loop did not finish")
            .unwrap();
        drop(runtime);

        assert!(started.elapsed() < Duration::from_secs(5));
        drop(hold_open);
    }
}
