//! Per-cell collision rules.
//!
//! Collisions are purely local: the output of a cell depends only on its own six
//! flags, so the phase can run in place over a buffer in any order.

use lattice_core::{CellState, CollisionRule, Direction};

/// Apply `rule` to a single post-streaming cell
pub fn collide_cell(cell: CellState, rule: CollisionRule) -> CellState {
    match rule {
        CollisionRule::Fhp => fhp_collide(cell),
        CollisionRule::None => cell,
    }
}

/// FHP scattering.
///
/// - Two particles on a head-on pair `{d, d+3}` (checked for d = 0, 1, 2 in order)
///   rotate to `{d+1, d+4}`.
/// - Three particles all rotate by one direction index.
/// - Every other configuration, including two particles that are not a head-on
///   pair, passes through unchanged.
///
/// Particle count is preserved in every branch.
pub fn fhp_collide(cell: CellState) -> CellState {
    match cell.count() {
        2 => {
            let head_on = [Direction::East, Direction::West, Direction::South]
                .into_iter()
                .find(|&d| cell.is_set(d) && cell.is_set(d.partner()));

            match head_on {
                Some(d) => {
                    CellState::from_directions(&[d.rotated(), d.partner().rotated()])
                }
                None => cell,
            }
        }
        3 => cell.rotated(),
        _ => cell,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cell(indices: &[usize]) -> CellState {
        let directions: Vec<Direction> = indices
            .iter()
            .map(|&i| Direction::from_index(i).unwrap())
            .collect();
        CellState::from_directions(&directions)
    }

    #[test]
    fn test_head_on_pairs_rotate() {
        assert_eq!(fhp_collide(cell(&[0, 3])), cell(&[1, 4]));
        assert_eq!(fhp_collide(cell(&[1, 4])), cell(&[2, 5]));
        assert_eq!(fhp_collide(cell(&[2, 5])), cell(&[3, 0]));
    }

    #[test]
    fn test_non_head_on_pair_unchanged() {
        assert_eq!(fhp_collide(cell(&[0, 1])), cell(&[0, 1]));
        assert_eq!(fhp_collide(cell(&[2, 4])), cell(&[2, 4]));
    }

    #[test]
    fn test_three_body_rotation() {
        assert_eq!(fhp_collide(cell(&[0, 1, 2])), cell(&[1, 2, 3]));
        assert_eq!(fhp_collide(cell(&[0, 2, 5])), cell(&[1, 3, 0]));
    }

    #[test]
    fn test_other_counts_pass_through() {
        let cases: [&[usize]; 5] = [&[], &[4], &[0, 1, 2, 3], &[0, 1, 2, 3, 5], &[0, 1, 2, 3, 4, 5]];
        for indices in cases {
            let c = cell(indices);
            assert_eq!(fhp_collide(c), c);
        }
    }

    #[test]
    fn test_none_rule_is_identity() {
        for bits in 0..64u8 {
            let c = CellState::from_bits(bits);
            assert_eq!(collide_cell(c, CollisionRule::None), c);
        }
    }

    #[test]
    fn test_fhp_conserves_mass_exhaustively() {
        for bits in 0..64u8 {
            let c = CellState::from_bits(bits);
            assert_eq!(fhp_collide(c).count(), c.count(), "cell {:06b}", bits);
        }
    }

    proptest! {
        #[test]
        fn prop_collide_conserves_mass(bits in 0u8..64, fhp in any::<bool>()) {
            let rule = if fhp { CollisionRule::Fhp } else { CollisionRule::None };
            let c = CellState::from_bits(bits);
            prop_assert_eq!(collide_cell(c, rule).count(), c.count());
        }
    }
}
