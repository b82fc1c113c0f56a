//! Configuration types for the automaton and its driver.

use crate::{Error, Result, DIRECTION_COUNT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What happens to a particle that streams off the edge of the lattice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoundaryMode {
    /// Edges wrap toroidally
    #[default]
    Periodic,
    /// Edges mirror: the particle stays in its cell with its velocity reversed
    Reflective,
}

impl FromStr for BoundaryMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "periodic" => Ok(BoundaryMode::Periodic),
            "reflective" => Ok(BoundaryMode::Reflective),
            other => Err(Error::InvalidConfig(format!(
                "unrecognized boundary mode '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for BoundaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryMode::Periodic => write!(f, "Periodic"),
            BoundaryMode::Reflective => write!(f, "Reflective"),
        }
    }
}

/// Local interaction applied after streaming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollisionRule {
    /// Frisch-Hasslacher-Pomeau two- and three-body rotations
    #[default]
    #[serde(rename = "FHP")]
    Fhp,
    /// Identity collision: particles pass through each other
    None,
}

impl FromStr for CollisionRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fhp" => Ok(CollisionRule::Fhp),
            "none" | "no collisions" => Ok(CollisionRule::None),
            other => Err(Error::InvalidConfig(format!(
                "unrecognized collision rule '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for CollisionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollisionRule::Fhp => write!(f, "FHP"),
            CollisionRule::None => write!(f, "None"),
        }
    }
}

/// Lattice configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatticeConfig {
    /// Width of the lattice in cells
    pub width: usize,
    /// Height of the lattice in cells
    pub height: usize,
    /// Probability that a given cell-direction slot starts occupied (0.0 to 1.0)
    pub density: f64,
    pub boundary_mode: BoundaryMode,
    pub collision_rule: CollisionRule,
    /// Random seed for reproducibility; None draws one from the OS
    pub seed: Option<u64>,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            width: 50,
            height: 50,
            density: 0.3,
            boundary_mode: BoundaryMode::Periodic,
            collision_rule: CollisionRule::Fhp,
            seed: None,
        }
    }
}

impl LatticeConfig {
    /// Largest accepted width or height; positions are `i32`
    pub const MAX_DIMENSION: usize = i32::MAX as usize;

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if value == 0 {
                return Err(Error::InvalidConfig(format!("{} must be positive", name)));
            }
            if value > Self::MAX_DIMENSION {
                return Err(Error::InvalidConfig(format!(
                    "{} must be at most {}, got {}",
                    name,
                    Self::MAX_DIMENSION,
                    value
                )));
            }
        }
        self.width
            .checked_mul(self.height)
            .and_then(|cells| cells.checked_mul(DIRECTION_COUNT))
            .ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "{}x{} lattice is too large",
                    self.width, self.height
                ))
            })?;
        validate_density(self.density)
    }

    /// Number of cells in the lattice
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }
}

pub fn validate_density(density: f64) -> Result<()> {
    if !density.is_finite() || !(0.0..=1.0).contains(&density) {
        return Err(Error::InvalidConfig(format!(
            "density must be within [0, 1], got {}",
            density
        )));
    }
    Ok(())
}

/// Headless driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub lattice: LatticeConfig,
    /// Automatic stepping cadence (1 to 60)
    pub steps_per_second: u32,
    /// Begin stepping without waiting for a `start` command
    pub autostart: bool,
    /// Stop after this many steps
    pub max_steps: Option<u64>,
    /// Overlay sampled velocity arrows on rendered frames
    pub show_velocity_field: bool,
    /// Sampling stride of the velocity overlay, in cells
    pub velocity_stride: usize,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            lattice: LatticeConfig::default(),
            steps_per_second: 10,
            autostart: false,
            max_steps: None,
            show_velocity_field: false,
            velocity_stride: 5,
            log_json: false,
        }
    }
}

impl RunnerConfig {
    pub const MIN_STEPS_PER_SECOND: u32 = 1;
    pub const MAX_STEPS_PER_SECOND: u32 = 60;

    pub fn validate(&self) -> Result<()> {
        validate_speed(self.steps_per_second)?;
        if self.velocity_stride == 0 {
            return Err(Error::InvalidConfig(
                "velocity_stride must be positive".to_string(),
            ));
        }
        self.lattice.validate()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: RunnerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

pub fn validate_speed(steps_per_second: u32) -> Result<()> {
    let range = RunnerConfig::MIN_STEPS_PER_SECOND..=RunnerConfig::MAX_STEPS_PER_SECOND;
    if !range.contains(&steps_per_second) {
        return Err(Error::InvalidConfig(format!(
            "steps_per_second must be within [{}, {}], got {}",
            range.start(),
            range.end(),
            steps_per_second
        )));
    }
    Ok(())
}
