//! HDG spatial discretization and its Jacobian-solve substructure.
//!
//! The solver assembles, per cell, the block system coupling the interior
//! unknowns (σ, q, u) to the inter-cell traces λ, evaluates the nonlinear
//! DAE residual, and solves the shifted-Jacobian equation by static
//! condensation onto the trace system.

mod assembler;
mod boundary;
mod jacobian;
mod residual;
mod system;

pub use assembler::SystemMatrices;
pub use boundary::{BoundaryConditions, BoundaryKind, BoundaryValueFn};
pub use system::SystemSolver;

use faer::Mat;
use thiserror::Error;

/// Scalar coefficient function of position, e.g. the stabilization τ(x) or
/// the convection coefficient c(x).
pub type CoeffFn = Box<dyn Fn(f64) -> f64 + Send + Sync>;

/// Forcing term r(var, x, t).
pub type ForcingFn = Box<dyn Fn(usize, f64, f64) -> f64 + Send + Sync>;

/// Errors raised by assembly, residual evaluation, or the linear solve.
#[derive(Debug, Error)]
pub enum SolverError {
    /// A cell-local Jacobian block factored to a singular system.
    #[error("singular cell matrix in cell {cell}")]
    SingularCellMatrix {
        /// Cell index
        cell: usize,
    },

    /// The global trace matrix H is singular at initialization.
    #[error("singular global trace matrix")]
    SingularTraceMatrix,

    /// The condensed trace system K is singular.
    #[error("singular condensed trace system")]
    SingularCondensedSystem,

    /// A provider produced NaN or Inf in the residual.
    #[error("non-finite residual entry at state index {index}")]
    NonFiniteResidual {
        /// Offset into the state vector
        index: usize,
    },
}

/// y[0..nr] += scale · M_block · x, where the block starts at (row0, col0).
/// With `transpose` the block of Mᵀ at (row0, col0) is applied instead.
pub(crate) fn add_matvec(
    y: &mut [f64],
    m: &Mat<f64>,
    row0: usize,
    col0: usize,
    nr: usize,
    nc: usize,
    x: &[f64],
    scale: f64,
    transpose: bool,
) {
    debug_assert!(y.len() >= nr && x.len() >= nc);
    for i in 0..nr {
        let mut acc = 0.0;
        for j in 0..nc {
            let entry = if transpose {
                m[(col0 + j, row0 + i)]
            } else {
                m[(row0 + i, col0 + j)]
            };
            acc += entry * x[j];
        }
        y[i] += scale * acc;
    }
}

/// Dense product C = A · B.
pub(crate) fn mat_mul(a: &Mat<f64>, b: &Mat<f64>) -> Mat<f64> {
    debug_assert_eq!(a.ncols(), b.nrows());
    let mut c = Mat::zeros(a.nrows(), b.ncols());
    for i in 0..a.nrows() {
        for j in 0..b.ncols() {
            let mut acc = 0.0;
            for k in 0..a.ncols() {
                acc += a[(i, k)] * b[(k, j)];
            }
            c[(i, j)] = acc;
        }
    }
    c
}

/// Whether every entry of a matrix is finite.
pub(crate) fn mat_is_finite(m: &Mat<f64>) -> bool {
    for i in 0..m.nrows() {
        for j in 0..m.ncols() {
            if !m[(i, j)].is_finite() {
                return false;
            }
        }
    }
    true
}
