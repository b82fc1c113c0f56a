//! Occupancy buffer for one lattice generation.

use lattice_core::{CellState, Direction, Error, Position, Result, DIRECTION_COUNT};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Role of a buffer within the engine's double buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Buffer {
    /// State visible to queries between steps
    Current,
    /// Scratch target of the streaming and collision phases
    Next,
}

impl Buffer {
    pub fn other(self) -> Self {
        match self {
            Buffer::Current => Buffer::Next,
            Buffer::Next => Buffer::Current,
        }
    }
}

/// A width x height x 6 boolean field stored as one `CellState` per cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<CellState>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![CellState::empty(); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Independently occupy every cell-direction slot with probability `density`
    pub fn seed_random<R: Rng + ?Sized>(&mut self, density: f64, rng: &mut R) {
        for x in 0..self.width {
            for y in 0..self.height {
                let index = y * self.width + x;
                let mut cell = CellState::empty();
                for d in Direction::all() {
                    cell.set(d, rng.gen::<f64>() < density);
                }
                self.cells[index] = cell;
            }
        }
    }

    pub fn occupied(&self, x: usize, y: usize, direction: usize) -> Result<bool> {
        let (index, direction) = self.checked_slot(x, y, direction)?;
        Ok(self.cells[index].is_set(direction))
    }

    pub fn set(&mut self, x: usize, y: usize, direction: usize, value: bool) -> Result<()> {
        let (index, direction) = self.checked_slot(x, y, direction)?;
        self.cells[index].set(direction, value);
        Ok(())
    }

    /// All six flags of one cell
    pub fn cell(&self, x: usize, y: usize) -> Result<CellState> {
        let index = self.checked_index(x, y, 0)?;
        Ok(self.cells[index])
    }

    pub fn set_cell(&mut self, x: usize, y: usize, cell: CellState) -> Result<()> {
        let index = self.checked_index(x, y, 0)?;
        self.cells[index] = cell;
        Ok(())
    }

    /// Set every slot to unoccupied
    pub fn clear(&mut self) {
        self.cells.fill(CellState::empty());
    }

    /// Total particles in the buffer
    pub fn particle_count(&self) -> u64 {
        self.cells.iter().map(|c| c.count() as u64).sum()
    }

    /// Iterator over all cells with positions, row by row
    pub fn iter(&self) -> impl Iterator<Item = (Position, CellState)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (self.index_to_pos(i), *cell))
    }

    /// Mark `direction` occupied at an in-bounds position
    pub(crate) fn insert(&mut self, pos: Position, direction: Direction) {
        debug_assert!(pos.in_bounds(self.width, self.height));
        let index = self.pos_to_index(pos);
        self.cells[index].set(direction, true);
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [CellState] {
        &mut self.cells
    }

    fn pos_to_index(&self, pos: Position) -> usize {
        pos.y as usize * self.width + pos.x as usize
    }

    /// Get position from index
    pub fn index_to_pos(&self, index: usize) -> Position {
        let x = (index % self.width) as i32;
        let y = (index / self.width) as i32;
        Position::new(x, y)
    }

    fn checked_slot(&self, x: usize, y: usize, direction: usize) -> Result<(usize, Direction)> {
        let index = self.checked_index(x, y, direction)?;
        let direction = Direction::from_index(direction)
            .ok_or_else(|| self.out_of_bounds(x, y, direction))?;
        Ok((index, direction))
    }

    fn checked_index(&self, x: usize, y: usize, direction: usize) -> Result<usize> {
        if x >= self.width || y >= self.height || direction >= DIRECTION_COUNT {
            return Err(self.out_of_bounds(x, y, direction));
        }
        Ok(y * self.width + x)
    }

    fn out_of_bounds(&self, x: usize, y: usize, direction: usize) -> Error {
        Error::OutOfBounds {
            x,
            y,
            direction,
            width: self.width,
            height: self.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(10, 20);
        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 20);
        assert_eq!(grid.cells.len(), 200);
        assert_eq!(grid.particle_count(), 0);
    }

    #[test]
    fn test_set_and_query() {
        let mut grid = Grid::new(4, 3);
        grid.set(3, 2, 5, true).unwrap();
        assert!(grid.occupied(3, 2, 5).unwrap());
        assert!(!grid.occupied(3, 2, 4).unwrap());
        assert!(!grid.occupied(2, 2, 5).unwrap());
        assert_eq!(grid.cell(3, 2).unwrap().count(), 1);

        grid.set(3, 2, 5, false).unwrap();
        assert_eq!(grid.particle_count(), 0);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut grid = Grid::new(4, 3);
        assert!(matches!(
            grid.occupied(4, 0, 0),
            Err(Error::OutOfBounds { x: 4, width: 4, .. })
        ));
        assert!(grid.occupied(0, 3, 0).is_err());
        assert!(matches!(
            grid.set(0, 0, 6, true),
            Err(Error::OutOfBounds { direction: 6, .. })
        ));
        assert!(grid.cell(9, 9).is_err());
        assert_eq!(grid.particle_count(), 0);
    }

    #[test]
    fn test_clear() {
        let mut grid = Grid::new(5, 5);
        grid.set_cell(1, 1, CellState::full()).unwrap();
        grid.set(4, 4, 0, true).unwrap();
        assert_eq!(grid.particle_count(), 7);
        grid.clear();
        assert_eq!(grid.particle_count(), 0);
    }

    #[test]
    fn test_seed_random_extremes() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let mut grid = Grid::new(8, 8);
        grid.seed_random(0.0, &mut rng);
        assert_eq!(grid.particle_count(), 0);

        grid.seed_random(1.0, &mut rng);
        assert_eq!(grid.particle_count(), 8 * 8 * 6);
    }

    #[test]
    fn test_seed_random_density() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut grid = Grid::new(50, 50);
        grid.seed_random(0.3, &mut rng);

        let fraction = grid.particle_count() as f64 / (50.0 * 50.0 * 6.0);
        assert!((fraction - 0.3).abs() < 0.03, "fraction = {}", fraction);
    }

    #[test]
    fn test_iter_positions() {
        let grid = Grid::new(3, 2);
        let positions: Vec<_> = grid.iter().map(|(p, _)| p).collect();
        assert_eq!(positions.len(), 6);
        assert_eq!(positions[0], Position::new(0, 0));
        assert_eq!(positions[4], Position::new(1, 1));
        assert_eq!(grid.index_to_pos(5), Position::new(2, 1));
    }
}
