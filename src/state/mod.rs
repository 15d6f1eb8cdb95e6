//! State-vector layout and DG coefficient storage.

mod field;
mod layout;

pub use field::DGField;
pub use layout::{Block, StateLayout};

use crate::basis::LegendreBasis;
use crate::grid::Grid;

/// Evaluate one interior block of a state vector pointwise.
///
/// Returns NaN when x falls outside the domain.
pub fn eval_state(
    layout: &StateLayout,
    grid: &Grid,
    basis: &LegendreBasis,
    y: &[f64],
    block: Block,
    var: usize,
    x: f64,
) -> f64 {
    match grid.locate(x) {
        Some(cell) => basis.evaluate(&grid.cells[cell], layout.coeffs(y, cell, block, var), x),
        None => f64::NAN,
    }
}

/// Values of every variable of one block at a point inside a known cell.
#[allow(clippy::too_many_arguments)]
pub fn eval_state_vars(
    layout: &StateLayout,
    basis: &LegendreBasis,
    iv: &crate::grid::Interval,
    y: &[f64],
    block: Block,
    cell: usize,
    x: f64,
    out: &mut [f64],
) {
    debug_assert_eq!(out.len(), layout.n_vars);
    for (var, slot) in out.iter_mut().enumerate() {
        *slot = basis.evaluate(iv, layout.coeffs(y, cell, block, var), x);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_state_reads_the_right_block() {
        let layout = StateLayout::new(1, 1, 2);
        let grid = Grid::uniform(0.0, 1.0, 2);
        let basis = LegendreBasis::new(1);
        let mut y = vec![0.0; layout.n_dof()];

        // set u = 1 on cell 0 (constant mode of the orthonormal basis)
        let h: f64 = 0.5;
        layout.coeffs_mut(&mut y, 0, Block::U, 0)[0] = h.sqrt();

        let u = eval_state(&layout, &grid, &basis, &y, Block::U, 0, 0.25);
        assert!((u - 1.0).abs() < 1e-13);
        let s = eval_state(&layout, &grid, &basis, &y, Block::Sigma, 0, 0.25);
        assert!(s.abs() < 1e-13);
        assert!(eval_state(&layout, &grid, &basis, &y, Block::U, 0, 2.0).is_nan());
    }
}
