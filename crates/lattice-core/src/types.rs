//! Core type definitions for the lattice.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// Number of velocity slots per cell
pub const DIRECTION_COUNT: usize = 6;

/// Unit vectors of the approximately hexagonal neighbourhood, indexed by direction.
/// Screen coordinates: +x is east, +y is south.
pub const DIRECTIONS: [(i32, i32); DIRECTION_COUNT] =
    [(1, 0), (-1, 0), (0, 1), (0, -1), (1, -1), (-1, 1)];

/// 2D cell position on the lattice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Neighbouring position one hop along `direction`
    pub fn step(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.to_delta();
        self.add(dx, dy)
    }

    /// Apply toroidal wrapping for given lattice dimensions
    pub fn wrap(&self, width: usize, height: usize) -> Self {
        let (w, h) = (width as i32, height as i32);
        Self {
            x: ((self.x % w) + w) % w,
            y: ((self.y % h) + h) % h,
        }
    }

    pub fn in_bounds(&self, width: usize, height: usize) -> bool {
        self.x >= 0 && self.y >= 0 && (self.x as usize) < width && (self.y as usize) < height
    }
}

/// One of the six particle velocities. Discriminants match the direction table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    East = 0,
    West = 1,
    South = 2,
    North = 3,
    NorthEast = 4,
    SouthWest = 5,
}

impl Direction {
    pub fn all() -> [Direction; DIRECTION_COUNT] {
        [
            Direction::East,
            Direction::West,
            Direction::South,
            Direction::North,
            Direction::NorthEast,
            Direction::SouthWest,
        ]
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::all().get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn to_delta(self) -> (i32, i32) {
        DIRECTIONS[self.index()]
    }

    /// Index partner `(d + 3) mod 6`. This is the pairing the FHP head-on test uses.
    /// With this table it is not the negated vector; see [`Direction::reversed`].
    pub fn partner(self) -> Self {
        Self::all()[(self.index() + 3) % DIRECTION_COUNT]
    }

    /// Direction whose vector is the negation of this one (wall reflection).
    pub fn reversed(self) -> Self {
        match self {
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::South => Direction::North,
            Direction::North => Direction::South,
            Direction::NorthEast => Direction::SouthWest,
            Direction::SouthWest => Direction::NorthEast,
        }
    }

    /// Next direction index, `(d + 1) mod 6`
    pub fn rotated(self) -> Self {
        Self::all()[(self.index() + 1) % DIRECTION_COUNT]
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.index())
    }
}

/// Occupancy of the six velocity slots of a single cell, one bit per direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellState(u8);

impl CellState {
    const MASK: u8 = (1 << DIRECTION_COUNT) - 1;

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn full() -> Self {
        Self(Self::MASK)
    }

    pub fn from_bits(bits: u8) -> Self {
        Self(bits & Self::MASK)
    }

    pub fn from_directions(directions: &[Direction]) -> Self {
        let mut state = Self::empty();
        for &d in directions {
            state.set(d, true);
        }
        state
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_set(self, direction: Direction) -> bool {
        self.0 & (1 << direction.index()) != 0
    }

    pub fn set(&mut self, direction: Direction, value: bool) {
        if value {
            self.0 |= 1 << direction.index();
        } else {
            self.0 &= !(1 << direction.index());
        }
    }

    /// Number of particles in the cell
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Occupied directions in index order
    pub fn directions(self) -> impl Iterator<Item = Direction> {
        Direction::all().into_iter().filter(move |&d| self.is_set(d))
    }

    /// Every occupied direction moved to `(d + 1) mod 6`
    pub fn rotated(self) -> Self {
        let bits = self.0;
        Self(((bits << 1) | (bits >> (DIRECTION_COUNT - 1))) & Self::MASK)
    }

    /// Vector sum of the occupied direction vectors
    pub fn velocity(self) -> Velocity {
        self.directions().fold(Velocity::zero(), |acc, d| {
            let (dx, dy) = d.to_delta();
            acc + Velocity::new(dx as f64, dy as f64)
        })
    }
}

/// Net particle velocity of a cell or region
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
}

impl Velocity {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in the same direction, or None for a zero vector
    pub fn normalized(&self) -> Option<Velocity> {
        let mag = self.magnitude();
        if mag > 0.0 {
            Some(Velocity::new(self.x / mag, self.y / mag))
        } else {
            None
        }
    }
}

impl Add for Velocity {
    type Output = Velocity;

    fn add(self, other: Velocity) -> Velocity {
        Velocity::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Velocity {
    fn add_assign(&mut self, other: Velocity) {
        self.x += other.x;
        self.y += other.y;
    }
}
