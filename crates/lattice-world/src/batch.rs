//! Headless batch runs: step a lattice a fixed number of times and summarize.

use crate::simulation::Simulation;
use lattice_core::{Error, LatticeConfig, LatticeStats, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// A fixed-length run that needs no driver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRun {
    pub config: LatticeConfig,
    pub steps: u64,
}

impl BatchRun {
    /// Longest run accepted; one particle count is recorded per step
    pub const MAX_STEPS: u64 = 10_000_000;

    pub fn new(config: LatticeConfig, steps: u64) -> Self {
        Self { config, steps }
    }

    /// Execute this run
    #[instrument(skip(self), fields(steps = self.steps))]
    pub fn execute(self) -> Result<BatchResult> {
        if self.steps > Self::MAX_STEPS {
            return Err(Error::InvalidConfig(format!(
                "batch runs are limited to {} steps, got {}",
                Self::MAX_STEPS,
                self.steps
            )));
        }

        let mut simulation = Simulation::new(self.config.clone())?;
        let initial = simulation.stats();
        let mut particle_counts = Vec::with_capacity(self.steps as usize);

        for step in 1..=self.steps {
            simulation.step();
            let stats = simulation.stats();
            particle_counts.push(stats.particles);

            if step % 1000 == 0 {
                info!(
                    "Step {}/{}: {} particles in {} cells",
                    step, self.steps, stats.particles, stats.occupied_cells
                );
            }
        }

        let result = BatchResult {
            config: self.config,
            initial,
            final_stats: simulation.stats(),
            particle_counts,
        };
        result.emit_summary();

        Ok(result)
    }
}

/// Outcome of a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub config: LatticeConfig,
    pub initial: LatticeStats,
    pub final_stats: LatticeStats,
    /// Total particles after each step
    pub particle_counts: Vec<u64>,
}

impl BatchResult {
    /// True when every step kept the initial particle count
    pub fn mass_conserved(&self) -> bool {
        self.particle_counts
            .iter()
            .all(|&count| count == self.initial.particles)
    }

    fn emit_summary(&self) {
        info!(
            event = "batch_summary",
            width = self.config.width,
            height = self.config.height,
            boundary = %self.config.boundary_mode,
            collision = %self.config.collision_rule,
            generations = self.final_stats.generation,
            particles = self.final_stats.particles,
            occupied_cells_initial = self.initial.occupied_cells,
            occupied_cells_final = self.final_stats.occupied_cells,
            momentum_x = self.final_stats.momentum.x,
            momentum_y = self.final_stats.momentum.y,
            mass_conserved = self.mass_conserved(),
            "Batch run complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_core::BoundaryMode;

    #[test]
    fn test_batch_run() {
        let config = LatticeConfig {
            width: 20,
            height: 20,
            boundary_mode: BoundaryMode::Reflective,
            seed: Some(8),
            ..Default::default()
        };

        let result = BatchRun::new(config, 50).execute().unwrap();
        assert_eq!(result.particle_counts.len(), 50);
        assert_eq!(result.final_stats.generation, 50);
        assert_eq!(result.initial.generation, 0);
        assert!(result.mass_conserved());
    }

    #[test]
    fn test_batch_run_invalid_config() {
        let config = LatticeConfig {
            height: 0,
            ..Default::default()
        };
        assert!(BatchRun::new(config, 10).execute().is_err());
    }

    #[test]
    fn test_batch_run_rejects_excessive_steps() {
        let config = LatticeConfig {
            width: 4,
            height: 4,
            seed: Some(2),
            ..Default::default()
        };
        assert!(matches!(
            BatchRun::new(config.clone(), u64::MAX).execute(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            BatchRun::new(config, BatchRun::MAX_STEPS + 1).execute(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_batch_result_serialization() {
        let config = LatticeConfig {
            width: 5,
            height: 5,
            seed: Some(1),
            ..Default::default()
        };
        let result = BatchRun::new(config, 3).execute().unwrap();
        let json = serde_json::to_string(&result).unwrap();
        let restored: BatchResult = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.particle_counts, result.particle_counts);
        assert_eq!(restored.final_stats, result.final_stats);
    }
}
