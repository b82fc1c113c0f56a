//! Textual control surface: parses commands and applies them to the engine.

use crate::render::render_frame;
use anyhow::{anyhow, bail, Context, Result};
use lattice_core::{validate_speed, BoundaryMode, CollisionRule, LatticeStats, RunnerConfig};
use lattice_world::Simulation;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// A control command read from the operator
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Pause,
    /// Advance exactly one step
    Step,
    Reset,
    Speed(u32),
    Width(usize),
    Height(usize),
    Density(f64),
    Boundary(BoundaryMode),
    Collision(CollisionRule),
    Velocity(bool),
    Stats,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut words = s.split_whitespace();
        let name = words
            .next()
            .ok_or_else(|| anyhow!("empty command"))?
            .to_ascii_lowercase();
        let argument = words.collect::<Vec<_>>().join(" ");

        let command = match name.as_str() {
            "start" => Command::Start,
            "pause" => Command::Pause,
            "step" => Command::Step,
            "reset" => Command::Reset,
            "stats" => Command::Stats,
            "quit" | "exit" => Command::Quit,
            "speed" => Command::Speed(
                argument
                    .parse()
                    .with_context(|| format!("invalid speed '{}'", argument))?,
            ),
            "width" => Command::Width(
                argument
                    .parse()
                    .with_context(|| format!("invalid width '{}'", argument))?,
            ),
            "height" => Command::Height(
                argument
                    .parse()
                    .with_context(|| format!("invalid height '{}'", argument))?,
            ),
            "density" => Command::Density(
                argument
                    .parse()
                    .with_context(|| format!("invalid density '{}'", argument))?,
            ),
            "boundary" => Command::Boundary(argument.parse()?),
            "collision" => Command::Collision(argument.parse()?),
            "velocity" => match argument.to_ascii_lowercase().as_str() {
                "on" => Command::Velocity(true),
                "off" => Command::Velocity(false),
                other => bail!("velocity expects on or off, got '{}'", other),
            },
            other => bail!("unknown command '{}'", other),
        };

        Ok(command)
    }
}

/// What the driver loop should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Lattice or overlay changed; draw a new frame
    Redraw,
    /// Stepping cadence changed
    Retime,
    /// Nothing visible changed
    Unchanged,
    Quit,
}

/// Result of one cadence tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Idle,
    Stepped,
    /// Reached `max_steps`
    Finished,
}

/// Start/pause/step/reset state around one simulation
pub struct Controller {
    simulation: Simulation,
    running: bool,
    steps_per_second: u32,
    show_velocity_field: bool,
    velocity_stride: usize,
    max_steps: Option<u64>,
}

impl Controller {
    pub fn new(config: &RunnerConfig) -> Result<Self> {
        config.validate()?;
        let simulation = Simulation::new(config.lattice.clone())?;

        Ok(Self {
            simulation,
            running: config.autostart,
            steps_per_second: config.steps_per_second,
            show_velocity_field: config.show_velocity_field,
            velocity_stride: config.velocity_stride,
            max_steps: config.max_steps,
        })
    }

    pub fn apply(&mut self, command: Command) -> Result<Outcome> {
        debug!(?command, "Applying command");

        let outcome = match command {
            Command::Start => {
                self.running = true;
                Outcome::Unchanged
            }
            Command::Pause => {
                self.running = false;
                Outcome::Unchanged
            }
            Command::Step => {
                self.simulation.step();
                Outcome::Redraw
            }
            Command::Reset => {
                self.running = false;
                self.simulation.reset();
                Outcome::Redraw
            }
            Command::Speed(steps_per_second) => {
                validate_speed(steps_per_second)?;
                self.steps_per_second = steps_per_second;
                Outcome::Retime
            }
            Command::Width(width) => {
                self.simulation.set_width(width)?;
                Outcome::Redraw
            }
            Command::Height(height) => {
                self.simulation.set_height(height)?;
                Outcome::Redraw
            }
            Command::Density(density) => {
                self.simulation.set_density(density)?;
                Outcome::Redraw
            }
            Command::Boundary(mode) => {
                self.simulation.set_boundary_mode(mode);
                Outcome::Redraw
            }
            Command::Collision(rule) => {
                self.simulation.set_collision_rule(rule);
                Outcome::Redraw
            }
            Command::Velocity(show) => {
                self.show_velocity_field = show;
                Outcome::Redraw
            }
            Command::Stats => {
                log_stats(&self.simulation.stats());
                Outcome::Unchanged
            }
            Command::Quit => Outcome::Quit,
        };

        Ok(outcome)
    }

    /// Step once if running
    pub fn tick(&mut self) -> Tick {
        if !self.running {
            return Tick::Idle;
        }

        self.simulation.step();
        match self.max_steps {
            Some(max) if self.simulation.generation() >= max => {
                self.running = false;
                Tick::Finished
            }
            _ => Tick::Stepped,
        }
    }

    pub fn frame(&self) -> Result<String> {
        let stride = self.show_velocity_field.then_some(self.velocity_stride);
        Ok(render_frame(&self.simulation, stride)?)
    }

    /// Time between automatic steps
    pub fn period(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.steps_per_second as u64)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }
}

pub fn log_stats(stats: &LatticeStats) {
    info!(
        generation = stats.generation,
        particles = stats.particles,
        occupied_cells = stats.occupied_cells,
        mean_density = stats.mean_density,
        momentum_x = stats.momentum.x,
        momentum_y = stats.momentum.y,
        "Lattice stats"
    );
}
