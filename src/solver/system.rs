//! The system solver: discretization state and entry points.
//!
//! A `SystemSolver` owns the grid, basis, boundary data, providers and the
//! assembled matrices. The integrator owns the state vectors Y and Y′; the
//! solver only reads and writes them through slices passed into a single
//! entry point and never retains aliases afterwards.

use std::sync::Arc;

use crate::basis::LegendreBasis;
use crate::grid::Grid;
use crate::physics::{DiffusionModel, InitialProfile, SourceModel};
use crate::solver::{add_matvec, BoundaryConditions, CoeffFn, ForcingFn, SolverError, SystemMatrices};
use crate::state::{Block, StateLayout};

/// HDG discretization of one PDE system on one grid.
pub struct SystemSolver {
    pub(crate) grid: Grid,
    pub(crate) basis: LegendreBasis,
    pub(crate) layout: StateLayout,
    pub(crate) bcs: BoundaryConditions,
    pub(crate) tau: CoeffFn,
    pub(crate) conv: CoeffFn,
    pub(crate) forcing: ForcingFn,
    pub(crate) diffusion: Arc<dyn DiffusionModel>,
    pub(crate) source: Arc<dyn SourceModel>,
    pub(crate) matrices: SystemMatrices,
}

impl SystemSolver {
    /// Build the solver and run the one-time assembly.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        grid: Grid,
        degree: usize,
        n_vars: usize,
        bcs: BoundaryConditions,
        tau: CoeffFn,
        conv: CoeffFn,
        forcing: ForcingFn,
        diffusion: Arc<dyn DiffusionModel>,
        source: Arc<dyn SourceModel>,
    ) -> Result<Self, SolverError> {
        let basis = LegendreBasis::new(degree);
        let layout = StateLayout::new(n_vars, degree, grid.n_cells());
        let matrices = SystemMatrices::assemble(
            &grid,
            &basis,
            &layout,
            tau.as_ref(),
            conv.as_ref(),
            &bcs,
        )?;
        Ok(Self {
            grid,
            basis,
            layout,
            bcs,
            tau,
            conv,
            forcing,
            diffusion,
            source,
            matrices,
        })
    }

    /// The state layout of this discretization.
    pub fn layout(&self) -> StateLayout {
        self.layout
    }

    /// The grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The per-cell basis.
    pub fn basis(&self) -> &LegendreBasis {
        &self.basis
    }

    /// Assembled matrices (exposed for inspection in tests and tools).
    pub fn matrices(&self) -> &SystemMatrices {
        &self.matrices
    }

    /// Identity mask marking u slots differential.
    pub fn id_mask(&self) -> Vec<f64> {
        self.layout.id_mask()
    }

    /// Pointwise evaluation of one interior block of a state slice;
    /// NaN outside [a, b].
    pub fn eval(&self, y: &[f64], block: Block, var: usize, x: f64) -> f64 {
        crate::state::eval_state(&self.layout, &self.grid, &self.basis, y, block, var, x)
    }

    /// Trace value λ of (variable, face).
    pub fn trace(&self, y: &[f64], var: usize, face: usize) -> f64 {
        y[self.layout.trace_index(var, face)]
    }

    /// Refresh the boundary forcing at time t.
    pub(crate) fn refresh_boundary(&mut self, t: f64) {
        self.matrices.update_boundary(
            &self.grid,
            &self.basis,
            &self.layout,
            &self.bcs,
            self.forcing.as_ref(),
            self.tau.as_ref(),
            self.conv.as_ref(),
            t,
        );
    }

    /// Solve the trace equation λ = H⁻¹ (L − Σᵢ (Cᵢ σᵢ + Gᵢ uᵢ)) for the
    /// interior coefficients currently stored in `y`, writing the result
    /// into `lam`.
    pub(crate) fn trace_solve(&self, y: &[f64], lam: &mut [f64]) {
        let nv = self.layout.n_vars;
        let nc = self.layout.n_cells;
        let m = self.basis.n_modes();

        let mut rhs = self.matrices.l.clone();
        for cell in 0..nc {
            for var in 0..nv {
                let sigma = self.layout.coeffs(y, cell, Block::Sigma, var);
                let u = self.layout.coeffs(y, cell, Block::U, var);
                let mut face_pair = [0.0; 2];
                add_matvec(&mut face_pair, &self.matrices.c[cell], 2 * var, var * m, 2, m, sigma, 1.0, false);
                add_matvec(&mut face_pair, &self.matrices.g[cell], 2 * var, var * m, 2, m, u, 1.0, false);
                rhs[var * (nc + 1) + cell] -= face_pair[0];
                rhs[var * (nc + 1) + cell + 1] -= face_pair[1];
            }
        }

        let n_trace = self.layout.n_trace();
        let mut rhs_mat = faer::Mat::zeros(n_trace, 1);
        for i in 0..n_trace {
            rhs_mat[(i, 0)] = rhs[i];
        }
        use faer::linalg::solvers::Solve;
        let sol = self.matrices.h_global.solve(&rhs_mat);
        for (i, slot) in lam.iter_mut().enumerate() {
            *slot = sol[(i, 0)];
        }
    }

    /// Initialize Y and Y′ at t = 0 from an initial profile.
    ///
    /// Projects u₀ and q₀ = u₀′ cell-wise, closes σ₀ = −κ(x, q₀, u₀)
    /// through the diffusion provider, solves the trace equation for λ,
    /// and evaluates u̇(0) from the now-consistent evolution row. The
    /// algebraic slots of Y′ (σ̇, q̇, λ̇) stay zero; a consistent-IC
    /// correction in the integrator may refine them.
    pub fn set_initial_conditions(
        &mut self,
        profile: &InitialProfile,
        y: &mut [f64],
        yp: &mut [f64],
    ) -> Result<(), SolverError> {
        assert_eq!(y.len(), self.layout.n_dof());
        assert_eq!(yp.len(), self.layout.n_dof());
        y.fill(0.0);
        yp.fill(0.0);

        let nv = self.layout.n_vars;
        let nc = self.layout.n_cells;
        let m = self.basis.n_modes();
        let n = nv * m;

        // project u0, q0, and the closed flux sigma0 = -kappa(x, q0, u0)
        for cell in 0..nc {
            let iv = self.grid.cells[cell];
            for var in 0..nv {
                let u_coeffs = self.basis.project(&iv, |x| profile.value(var, x));
                let q_coeffs = self.basis.project(&iv, |x| profile.slope(var, x));
                let s_coeffs = self.basis.project(&iv, |x| {
                    let q: Vec<f64> = (0..nv).map(|w| profile.slope(w, x)).collect();
                    let u: Vec<f64> = (0..nv).map(|w| profile.value(w, x)).collect();
                    -self.diffusion.kappa(var, x, &q, &u)
                });
                self.layout
                    .coeffs_mut(y, cell, Block::U, var)
                    .copy_from_slice(&u_coeffs);
                self.layout
                    .coeffs_mut(y, cell, Block::Q, var)
                    .copy_from_slice(&q_coeffs);
                self.layout
                    .coeffs_mut(y, cell, Block::Sigma, var)
                    .copy_from_slice(&s_coeffs);
            }
        }

        self.refresh_boundary(0.0);

        // consistent traces
        let mut lam = vec![0.0; self.layout.n_trace()];
        self.trace_solve(y, &mut lam);
        y[self.layout.trace_range()].copy_from_slice(&lam);

        // u̇(0) from the evolution row:
        // u̇ = RF_u − B σ − D u − E λ − F
        for cell in 0..nc {
            let iv = self.grid.cells[cell];
            for var in 0..nv {
                let mut udot = vec![0.0; m];
                for j in 0..m {
                    udot[j] = self.matrices.rf[cell][n + var * m + j];
                    let f_proj = self.basis.cell_product(
                        &iv,
                        |x| {
                            let eval = |block, w| {
                                self.basis
                                    .evaluate(&iv, self.layout.coeffs(y, cell, block, w), x)
                            };
                            let s: Vec<f64> = (0..nv).map(|w| eval(Block::Sigma, w)).collect();
                            let q: Vec<f64> = (0..nv).map(|w| eval(Block::Q, w)).collect();
                            let u: Vec<f64> = (0..nv).map(|w| eval(Block::U, w)).collect();
                            self.source.source(var, x, &s, &q, &u)
                        },
                        j,
                    );
                    udot[j] -= f_proj;
                }
                let sigma = self.layout.coeffs(y, cell, Block::Sigma, var);
                let u = self.layout.coeffs(y, cell, Block::U, var);
                let lam_cell = [
                    lam[var * (nc + 1) + cell],
                    lam[var * (nc + 1) + cell + 1],
                ];
                add_matvec(&mut udot, &self.matrices.b[cell], var * m, var * m, m, m, sigma, -1.0, false);
                add_matvec(&mut udot, &self.matrices.d[cell], var * m, var * m, m, m, u, -1.0, false);
                add_matvec(&mut udot, &self.matrices.e[cell], var * m, 2 * var, m, 2, &lam_cell, -1.0, false);
                self.layout
                    .coeffs_mut(yp, cell, Block::U, var)
                    .copy_from_slice(&udot);
            }
        }

        Ok(())
    }
}
