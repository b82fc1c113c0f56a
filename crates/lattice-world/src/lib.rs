//! Lattice gas automaton engine.
//!
//! This module implements the hexagonal lattice where particles stream along
//! six directions and scatter through local collisions.

pub mod grid;
pub mod collision;
pub mod simulation;
pub mod batch;

pub use grid::{Buffer, Grid};
pub use collision::{collide_cell, fhp_collide};
pub use simulation::Simulation;
pub use batch::{BatchResult, BatchRun};
