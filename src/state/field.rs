//! Owned DG coefficient storage.
//!
//! `DGField` is the scratch-side counterpart of the coefficient views into
//! the integrator-owned state vector: one (k+1)-vector per variable per
//! cell, stored variable-major. Fields bound to the state vector never own
//! memory; they are plain slices produced by `StateLayout` on entry to an
//! entrypoint and dropped on exit.

use crate::basis::LegendreBasis;
use crate::grid::Grid;
use crate::state::{Block, StateLayout};

/// Per-variable per-cell polynomial coefficients with owned storage.
#[derive(Clone, Debug)]
pub struct DGField {
    /// Number of variables
    pub n_vars: usize,
    /// Polynomial degree
    pub degree: usize,
    /// Number of cells
    pub n_cells: usize,
    data: Vec<f64>,
}

impl DGField {
    /// Create a zeroed field.
    pub fn new(n_vars: usize, degree: usize, n_cells: usize) -> Self {
        Self {
            n_vars,
            degree,
            n_cells,
            data: vec![0.0; n_vars * n_cells * (degree + 1)],
        }
    }

    fn offset(&self, var: usize, cell: usize) -> usize {
        debug_assert!(var < self.n_vars && cell < self.n_cells);
        (var * self.n_cells + cell) * (self.degree + 1)
    }

    /// Coefficients of (variable, cell).
    pub fn coeffs(&self, var: usize, cell: usize) -> &[f64] {
        let o = self.offset(var, cell);
        &self.data[o..o + self.degree + 1]
    }

    /// Mutable coefficients of (variable, cell).
    pub fn coeffs_mut(&mut self, var: usize, cell: usize) -> &mut [f64] {
        let o = self.offset(var, cell);
        &mut self.data[o..o + self.degree + 1]
    }

    /// Zero all coefficients.
    pub fn zero(&mut self) {
        self.data.fill(0.0);
    }

    /// L² project g(var, x) onto every cell.
    pub fn project<F: Fn(usize, f64) -> f64>(&mut self, grid: &Grid, basis: &LegendreBasis, g: F) {
        for var in 0..self.n_vars {
            for (cell, iv) in grid.cells.iter().enumerate() {
                let coeffs = basis.project(iv, |x| g(var, x));
                self.coeffs_mut(var, cell).copy_from_slice(&coeffs);
            }
        }
    }

    /// Pointwise evaluation; NaN outside [a, b].
    pub fn evaluate(&self, grid: &Grid, basis: &LegendreBasis, var: usize, x: f64) -> f64 {
        match grid.locate(x) {
            Some(cell) => basis.evaluate(&grid.cells[cell], self.coeffs(var, cell), x),
            None => f64::NAN,
        }
    }

    /// Component-wise sum: self = a + b.
    pub fn sum(&mut self, a: &DGField, b: &DGField) {
        assert_eq!(self.data.len(), a.data.len());
        assert_eq!(self.data.len(), b.data.len());
        for (dst, (&x, &y)) in self.data.iter_mut().zip(a.data.iter().zip(b.data.iter())) {
            *dst = x + y;
        }
    }

    /// Copy one interior block out of a state vector.
    pub fn load_block(&mut self, layout: &StateLayout, y: &[f64], block: Block) {
        debug_assert_eq!(self.n_vars, layout.n_vars);
        debug_assert_eq!(self.n_cells, layout.n_cells);
        for var in 0..self.n_vars {
            for cell in 0..self.n_cells {
                self.coeffs_mut(var, cell)
                    .copy_from_slice(layout.coeffs(y, cell, block, var));
            }
        }
    }

    /// ∫ field dx over the domain for one variable.
    pub fn integrate(&self, grid: &Grid, basis: &LegendreBasis, var: usize) -> f64 {
        let mut total = 0.0;
        for (cell, iv) in grid.cells.iter().enumerate() {
            let jac = iv.width() / 2.0;
            let coeffs = self.coeffs(var, cell);
            for (&r, &w) in basis.quad.nodes.iter().zip(basis.quad.weights.iter()) {
                let x = iv.from_reference(r);
                total += w * jac * basis.evaluate(iv, coeffs, x);
            }
        }
        total
    }

    /// L² error of one variable against an exact profile.
    pub fn l2_error<F: Fn(f64) -> f64>(
        &self,
        grid: &Grid,
        basis: &LegendreBasis,
        var: usize,
        exact: F,
    ) -> f64 {
        let mut err_sq = 0.0;
        for (cell, iv) in grid.cells.iter().enumerate() {
            let jac = iv.width() / 2.0;
            let coeffs = self.coeffs(var, cell);
            for (&r, &w) in basis.quad.nodes.iter().zip(basis.quad.weights.iter()) {
                let x = iv.from_reference(r);
                let diff = basis.evaluate(iv, coeffs, x) - exact(x);
                err_sq += w * jac * diff * diff;
            }
        }
        err_sq.sqrt()
    }
}
