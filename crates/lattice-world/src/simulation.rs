//! Simulation engine: streaming, collision and the double-buffer swap.

use crate::collision::collide_cell;
use crate::grid::{Buffer, Grid};
use lattice_core::{
    BoundaryMode, CollisionRule, Error, LatticeConfig, LatticeStats, Position,
    Result, Velocity, DIRECTION_COUNT,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument, trace};

/// Owns both occupancy buffers and the configuration that drives them.
///
/// Queries read the current buffer. A step streams current into next, collides
/// next in place, then swaps the two roles so the collided state becomes current.
/// Reflected particles are written into next at their source cell, so they take
/// part in the collision phase of the same step.
pub struct Simulation {
    config: LatticeConfig,
    buffers: [Grid; 2],
    /// Index of the buffer currently playing `Buffer::Current`
    current: usize,
    rng: ChaCha8Rng,
    generation: u64,
}

impl Simulation {
    /// Create and seed a lattice. A `seed` in the config makes the run reproducible.
    pub fn new(config: LatticeConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    /// Create a lattice seeded from a caller-supplied random source.
    /// `config.seed` is ignored.
    pub fn with_rng(config: LatticeConfig, rng: ChaCha8Rng) -> Result<Self> {
        config.validate()?;

        let mut sim = Self {
            buffers: [
                Grid::new(config.width, config.height),
                Grid::new(config.width, config.height),
            ],
            config,
            current: 0,
            rng,
            generation: 0,
        };
        sim.seed_lattice();

        Ok(sim)
    }

    /// Full reset with a new configuration. All prior state is discarded.
    /// The random source is re-seeded when the config carries a seed and
    /// continues its stream otherwise.
    #[instrument(skip(self, config), fields(width = config.width, height = config.height))]
    pub fn initialize(&mut self, config: LatticeConfig) -> Result<()> {
        config.validate()?;

        if let Some(seed) = config.seed {
            self.rng = ChaCha8Rng::seed_from_u64(seed);
        }
        self.config = config;
        self.seed_lattice();

        Ok(())
    }

    /// Re-seed the lattice with the current configuration, continuing the random stream
    pub fn reset(&mut self) {
        debug!("Resetting lattice");
        self.seed_lattice();
    }

    fn seed_lattice(&mut self) {
        let (width, height) = (self.config.width, self.config.height);
        self.buffers = [Grid::new(width, height), Grid::new(width, height)];
        self.current = 0;
        self.generation = 0;
        self.buffers[0].seed_random(self.config.density, &mut self.rng);

        info!(
            width,
            height,
            density = self.config.density,
            boundary = %self.config.boundary_mode,
            collision = %self.config.collision_rule,
            particles = self.buffers[0].particle_count(),
            "Lattice initialized"
        );
    }

    /// Advance one generation: propagate, collide, swap
    pub fn step(&mut self) {
        self.propagate();
        self.collide();
        self.swap_buffers();
        self.generation += 1;

        trace!(
            generation = self.generation,
            particles = self.grid(Buffer::Current).particle_count(),
            "Step complete"
        );
    }

    /// Run `n` steps
    pub fn step_n(&mut self, n: u64) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Streaming phase: clear next, then move every particle of current one hop
    /// along its direction into next.
    pub fn propagate(&mut self) {
        let (width, height) = (self.config.width, self.config.height);
        let boundary = self.config.boundary_mode;
        let (current, next) = self.split_buffers();

        next.clear();
        for (pos, cell) in current.iter() {
            for d in cell.directions() {
                let dest = pos.step(d);
                match boundary {
                    BoundaryMode::Periodic => next.insert(dest.wrap(width, height), d),
                    BoundaryMode::Reflective if dest.in_bounds(width, height) => {
                        next.insert(dest, d)
                    }
                    BoundaryMode::Reflective => next.insert(pos, d.reversed()),
                }
            }
        }
    }

    /// Collision phase, applied cell by cell to the next buffer
    pub fn collide(&mut self) {
        let rule = self.config.collision_rule;
        for cell in self.grid_mut(Buffer::Next).cells_mut() {
            *cell = collide_cell(*cell, rule);
        }
    }

    fn swap_buffers(&mut self) {
        self.current = 1 - self.current;
    }

    fn split_buffers(&mut self) -> (&Grid, &mut Grid) {
        let [first, second] = &mut self.buffers;
        if self.current == 0 {
            (&*first, second)
        } else {
            (&*second, first)
        }
    }

    fn buffer_index(&self, buffer: Buffer) -> usize {
        match buffer {
            Buffer::Current => self.current,
            Buffer::Next => 1 - self.current,
        }
    }

    pub fn grid(&self, buffer: Buffer) -> &Grid {
        &self.buffers[self.buffer_index(buffer)]
    }

    fn grid_mut(&mut self, buffer: Buffer) -> &mut Grid {
        let index = self.buffer_index(buffer);
        &mut self.buffers[index]
    }

    /// Set every slot of `buffer` to unoccupied
    pub fn clear(&mut self, buffer: Buffer) {
        self.grid_mut(buffer).clear();
    }

    pub fn occupied(&self, x: usize, y: usize, direction: usize) -> Result<bool> {
        self.grid(Buffer::Current).occupied(x, y, direction)
    }

    /// Place or remove a particle in the current buffer
    pub fn set_occupied(
        &mut self,
        x: usize,
        y: usize,
        direction: usize,
        value: bool,
    ) -> Result<()> {
        self.set_in(Buffer::Current, x, y, direction, value)
    }

    pub fn set_in(
        &mut self,
        buffer: Buffer,
        x: usize,
        y: usize,
        direction: usize,
        value: bool,
    ) -> Result<()> {
        self.grid_mut(buffer).set(x, y, direction, value)
    }

    /// Number of occupied directions at a cell (0 to 6)
    pub fn particle_count(&self, x: usize, y: usize) -> Result<u32> {
        Ok(self.grid(Buffer::Current).cell(x, y)?.count())
    }

    /// Vector sum of the occupied direction vectors at a cell
    pub fn net_velocity(&self, x: usize, y: usize) -> Result<Velocity> {
        Ok(self.grid(Buffer::Current).cell(x, y)?.velocity())
    }

    /// Render intensity of a cell: particle count / 6
    pub fn density(&self, x: usize, y: usize) -> Result<f64> {
        Ok(self.particle_count(x, y)? as f64 / DIRECTION_COUNT as f64)
    }

    /// Normalized net velocity at every `stride`-th cell in both axes.
    /// Cells whose velocity cancels to zero are skipped.
    pub fn velocity_field(&self, stride: usize) -> Result<Vec<(Position, Velocity)>> {
        if stride == 0 {
            return Err(Error::InvalidConfig("stride must be positive".to_string()));
        }

        let grid = self.grid(Buffer::Current);
        let mut field = Vec::new();
        for x in (0..self.config.width).step_by(stride) {
            for y in (0..self.config.height).step_by(stride) {
                if let Some(v) = grid.cell(x, y)?.velocity().normalized() {
                    field.push((Position::new(x as i32, y as i32), v));
                }
            }
        }

        Ok(field)
    }

    /// Aggregate observables of the current buffer
    pub fn stats(&self) -> LatticeStats {
        let grid = self.grid(Buffer::Current);
        let mut stats = LatticeStats {
            generation: self.generation,
            ..LatticeStats::new()
        };

        for (_, cell) in grid.iter() {
            if cell.is_empty() {
                continue;
            }
            stats.particles += cell.count() as u64;
            stats.occupied_cells += 1;
            stats.momentum += cell.velocity();
        }

        let slots = (self.config.cell_count() * DIRECTION_COUNT) as f64;
        stats.mean_density = stats.particles as f64 / slots;
        stats
    }

    /// Takes effect on the next step; state is kept
    pub fn set_boundary_mode(&mut self, mode: BoundaryMode) {
        debug!(boundary = %mode, "Boundary mode changed");
        self.config.boundary_mode = mode;
    }

    /// Takes effect on the next step; state is kept
    pub fn set_collision_rule(&mut self, rule: CollisionRule) {
        debug!(collision = %rule, "Collision rule changed");
        self.config.collision_rule = rule;
    }

    /// Resize and re-seed the lattice
    pub fn set_width(&mut self, width: usize) -> Result<()> {
        self.reconfigure(LatticeConfig {
            width,
            ..self.config.clone()
        })
    }

    /// Resize and re-seed the lattice
    pub fn set_height(&mut self, height: usize) -> Result<()> {
        self.reconfigure(LatticeConfig {
            height,
            ..self.config.clone()
        })
    }

    /// Change the seeding density and re-seed the lattice
    pub fn set_density(&mut self, density: f64) -> Result<()> {
        self.reconfigure(LatticeConfig {
            density,
            ..self.config.clone()
        })
    }

    fn reconfigure(&mut self, config: LatticeConfig) -> Result<()> {
        config.validate()?;
        debug!(
            width = config.width,
            height = config.height,
            density = config.density,
            "Reconfiguring lattice"
        );
        self.config = config;
        self.seed_lattice();
        Ok(())
    }

    pub fn config(&self) -> &LatticeConfig {
        &self.config
    }

    pub fn width(&self) -> usize {
        self.config.width
    }

    pub fn height(&self) -> usize {
        self.config.height
    }

    /// Steps taken since the last initialization
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
