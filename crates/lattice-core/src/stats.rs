//! Whole-lattice statistics.

use crate::{Velocity, DIRECTION_COUNT};
use serde::{Deserialize, Serialize};

/// Aggregate observables of one lattice state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatticeStats {
    /// Steps taken since the last initialization
    pub generation: u64,
    /// Total number of particles (conserved by every step)
    pub particles: u64,
    /// Cells holding at least one particle
    pub occupied_cells: u64,
    /// Fraction of all cell-direction slots that are occupied
    pub mean_density: f64,
    /// Sum of all particle velocity vectors
    pub momentum: Velocity,
}

impl LatticeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mean particles per cell
    pub fn mean_particles_per_cell(&self) -> f64 {
        self.mean_density * DIRECTION_COUNT as f64
    }
}
