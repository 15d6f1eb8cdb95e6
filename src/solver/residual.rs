//! The nonlinear DAE residual.
//!
//! Layout of the residual matches the state vector: per cell and variable
//! the σ-row R1, the evolution row R2 and the flux closure R3, followed by
//! the trace row R4.

use crate::solver::{add_matvec, SolverError, SystemSolver};
use crate::state::{eval_state_vars, Block};

impl SystemSolver {
    /// Evaluate the HDG residual F(t, Y, Y′) into `res`.
    ///
    /// Refreshes the boundary forcing at t first, so time-dependent
    /// Dirichlet/Neumann data and forcing are always current. The σ and q
    /// slots of Y′ are ignored (algebraic); only the u slots enter through
    /// the evolution row.
    pub fn residual(
        &mut self,
        t: f64,
        y: &[f64],
        yp: &[f64],
        res: &mut [f64],
    ) -> Result<(), SolverError> {
        let layout = self.layout;
        assert_eq!(y.len(), layout.n_dof());
        assert_eq!(yp.len(), layout.n_dof());
        assert_eq!(res.len(), layout.n_dof());

        self.refresh_boundary(t);
        res.fill(0.0);

        let nv = layout.n_vars;
        let nc = layout.n_cells;
        let m = self.basis.n_modes();
        let n = nv * m;

        // R4: -λ + H⁻¹ (L - Σ (C σ + G u))
        let mut lam = vec![0.0; layout.n_trace()];
        self.trace_solve(y, &mut lam);
        for (k, idx) in layout.trace_range().enumerate() {
            res[idx] = -y[idx] + lam[k];
        }

        let mut qv = vec![0.0; nv];
        let mut uv = vec![0.0; nv];
        let mut sv = vec![0.0; nv];

        for cell in 0..nc {
            let iv = self.grid.cells[cell];
            let jac = iv.width() / 2.0;

            // project κ(·, q, u) and f(·, σ, q, u) onto the cell basis
            let mut kappa_proj = vec![0.0; n];
            let mut f_proj = vec![0.0; n];
            for (&r, &wq) in self
                .basis
                .quad
                .nodes
                .iter()
                .zip(self.basis.quad.weights.iter())
            {
                let x = iv.from_reference(r);
                eval_state_vars(&layout, &self.basis, &iv, y, Block::Q, cell, x, &mut qv);
                eval_state_vars(&layout, &self.basis, &iv, y, Block::U, cell, x, &mut uv);
                eval_state_vars(&layout, &self.basis, &iv, y, Block::Sigma, cell, x, &mut sv);
                for var in 0..nv {
                    let kap = self.diffusion.kappa(var, x, &qv, &uv);
                    let f = self.source.source(var, x, &sv, &qv, &uv);
                    for j in 0..m {
                        let phi = self.basis.phi(&iv, j, x);
                        kappa_proj[var * m + j] += wq * jac * kap * phi;
                        f_proj[var * m + j] += wq * jac * f * phi;
                    }
                }
            }

            let rf = &self.matrices.rf[cell];
            for var in 0..nv {
                let o = var * m;
                let sigma = layout.coeffs(y, cell, Block::Sigma, var);
                let q = layout.coeffs(y, cell, Block::Q, var);
                let u = layout.coeffs(y, cell, Block::U, var);
                let udot = layout.coeffs(yp, cell, Block::U, var);
                let lam_cell = [
                    y[layout.trace_index(var, cell)],
                    y[layout.trace_index(var, cell + 1)],
                ];

                // R1 = -A q - Bᵀ u + Cᵀ λ - RF_σ
                let mut r1 = vec![0.0; m];
                add_matvec(&mut r1, &self.matrices.a[cell], o, o, m, m, q, -1.0, false);
                add_matvec(&mut r1, &self.matrices.b[cell], o, o, m, m, u, -1.0, true);
                add_matvec(&mut r1, &self.matrices.c[cell], o, 2 * var, m, 2, &lam_cell, 1.0, true);
                for j in 0..m {
                    r1[j] -= rf[o + j];
                }

                // R2 = B σ + D u + E λ + F - RF_u + u̇
                let mut r2 = vec![0.0; m];
                add_matvec(&mut r2, &self.matrices.b[cell], o, o, m, m, sigma, 1.0, false);
                add_matvec(&mut r2, &self.matrices.d[cell], o, o, m, m, u, 1.0, false);
                add_matvec(&mut r2, &self.matrices.e[cell], o, 2 * var, m, 2, &lam_cell, 1.0, false);
                for j in 0..m {
                    r2[j] += f_proj[o + j] - rf[n + o + j] + udot[j];
                }

                // R3 = σ + Π κ
                layout
                    .coeffs_mut(res, cell, Block::Sigma, var)
                    .copy_from_slice(&r1);
                layout.coeffs_mut(res, cell, Block::Q, var).copy_from_slice(&r2);
                let r3 = layout.coeffs_mut(res, cell, Block::U, var);
                for j in 0..m {
                    r3[j] = sigma[j] + kappa_proj[o + j];
                }
            }
        }

        if let Some(index) = res.iter().position(|v| !v.is_finite()) {
            return Err(SolverError::NonFiniteResidual { index });
        }
        Ok(())
    }
}
