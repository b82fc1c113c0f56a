//! Text rendering of lattice frames.

use lattice_core::{Result, Velocity};
use lattice_world::{Buffer, Simulation};
use std::f64::consts::FRAC_PI_4;

/// One glyph per particle count, 0 through 6
const DENSITY_RAMP: [char; 7] = [' ', '.', ':', '-', '=', '+', '#'];

/// Eight-way arrows starting east, turning towards +y (south)
const ARROWS: [char; 8] = ['→', '↘', '↓', '↙', '←', '↖', '↑', '↗'];

pub fn density_glyph(count: u32) -> char {
    DENSITY_RAMP[(count as usize).min(DENSITY_RAMP.len() - 1)]
}

pub fn arrow_glyph(velocity: Velocity) -> char {
    let octant = (velocity.y.atan2(velocity.x) / FRAC_PI_4).round() as i32;
    ARROWS[octant.rem_euclid(8) as usize]
}

/// Render the current buffer, one character per cell, with an optional
/// velocity overlay sampled every `velocity_stride` cells.
pub fn render_frame(simulation: &Simulation, velocity_stride: Option<usize>) -> Result<String> {
    let width = simulation.width();
    let grid = simulation.grid(Buffer::Current);
    let mut glyphs: Vec<char> = grid
        .iter()
        .map(|(_, cell)| density_glyph(cell.count()))
        .collect();

    if let Some(stride) = velocity_stride {
        for (pos, velocity) in simulation.velocity_field(stride)? {
            glyphs[pos.y as usize * width + pos.x as usize] = arrow_glyph(velocity);
        }
    }

    let stats = simulation.stats();
    let config = simulation.config();
    let mut frame = format!(
        "gen {:>6} | particles {:>7} | {}x{} | {} | {}\n",
        stats.generation,
        stats.particles,
        config.width,
        config.height,
        config.boundary_mode,
        config.collision_rule
    );
    for row in glyphs.chunks(width) {
        frame.extend(row.iter());
        frame.push('\n');
    }

    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_core::LatticeConfig;

    fn empty_simulation(width: usize, height: usize) -> Simulation {
        let config = LatticeConfig {
            width,
            height,
            density: 0.0,
            seed: Some(0),
            ..Default::default()
        };
        Simulation::new(config).unwrap()
    }

    #[test]
    fn test_density_glyphs() {
        assert_eq!(density_glyph(0), ' ');
        assert_eq!(density_glyph(3), '-');
        assert_eq!(density_glyph(6), '#');
        assert_eq!(density_glyph(9), '#');
    }

    #[test]
    fn test_arrow_glyphs() {
        assert_eq!(arrow_glyph(Velocity::new(1.0, 0.0)), '→');
        assert_eq!(arrow_glyph(Velocity::new(0.0, 1.0)), '↓');
        assert_eq!(arrow_glyph(Velocity::new(-1.0, 0.0)), '←');
        assert_eq!(arrow_glyph(Velocity::new(0.0, -1.0)), '↑');
        assert_eq!(arrow_glyph(Velocity::new(1.0, -1.0)), '↗');
        assert_eq!(arrow_glyph(Velocity::new(-1.0, 1.0)), '↙');
    }

    #[test]
    fn test_frame_layout() {
        let mut sim = empty_simulation(4, 3);
        sim.set_occupied(1, 0, 0, true).unwrap();
        sim.set_occupied(2, 2, 0, true).unwrap();
        sim.set_occupied(2, 2, 1, true).unwrap();

        let frame = render_frame(&sim, None).unwrap();
        let lines: Vec<&str> = frame.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("particles       3"));
        assert_eq!(lines[1], " .  ");
        assert_eq!(lines[2], "    ");
        assert_eq!(lines[3], "  : ");
    }

    #[test]
    fn test_frame_velocity_overlay() {
        let mut sim = empty_simulation(6, 6);
        sim.set_occupied(0, 0, 2, true).unwrap();
        sim.set_occupied(2, 2, 2, true).unwrap();

        let frame = render_frame(&sim, Some(2)).unwrap();
        let lines: Vec<&str> = frame.lines().collect();
        assert!(lines[1].starts_with('↓'));
        assert_eq!(lines[3].chars().nth(2), Some('↓'));
        assert!(render_frame(&sim, Some(0)).is_err());
    }
}
