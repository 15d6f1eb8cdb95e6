//! Per-cell and global block assembly.
//!
//! Basis-independent blocks (A, B, C, D, E, G, H, X, the composites CE and
//! CG, and the H_global factorization) are computed once at initialization
//! and reused for the lifetime of the solver. The boundary-dependent
//! forcing RF and the trace right-hand side L are recomputed whenever the
//! boundary data or forcing time changes.

use crate::basis::LegendreBasis;
use crate::grid::{BoundaryFace, Grid};
use crate::solver::{mat_is_finite, BoundaryConditions, SolverError};
use crate::state::StateLayout;
use faer::linalg::solvers::{FullPivLu, Solve};
use faer::Mat;

/// All assembled blocks of the discretization.
pub struct SystemMatrices {
    /// Mass blocks, N(k+1) square, block diagonal over variables
    pub a: Vec<Mat<f64>>,
    /// Derivative blocks ⟨φ_i, φ_j′⟩
    pub b: Vec<Mat<f64>>,
    /// Convection/stabilization blocks
    pub d: Vec<Mat<f64>>,
    /// Trace coupling, 2N × N(k+1)
    pub c: Vec<Mat<f64>>,
    /// Trace-to-interior coupling, N(k+1) × 2N
    pub e: Vec<Mat<f64>>,
    /// Stabilized trace gather, 2N × N(k+1)
    pub g: Vec<Mat<f64>>,
    /// Face coupling, 2N × 2N diagonal per variable
    pub h: Vec<Mat<f64>>,
    /// Composite [Cᵀ; E; 0], 3N(k+1) × 2N
    pub ce: Vec<Mat<f64>>,
    /// Composite [C 0 G], 2N × 3N(k+1)
    pub cg: Vec<Mat<f64>>,
    /// Shift mass X (scaled by α at Jacobian time)
    pub x_mass: Vec<Mat<f64>>,
    /// α-independent skeleton of the cell Jacobian M
    pub m_base: Vec<Mat<f64>>,
    /// Boundary-dependent forcing per cell, length 2N(k+1)
    pub rf: Vec<Vec<f64>>,
    /// Trace right-hand side, length N(Nc+1)
    pub l: Vec<f64>,
    /// Factored global trace matrix
    pub h_global: FullPivLu<f64>,
    /// Unfactored copy of the global trace matrix
    pub h_global_mat: Mat<f64>,
}

impl SystemMatrices {
    /// Assemble every basis-dependent block and factor H_global.
    ///
    /// RF and L are left zeroed; callers refresh them through
    /// [`SystemMatrices::update_boundary`] before the first residual.
    pub fn assemble(
        grid: &Grid,
        basis: &LegendreBasis,
        layout: &StateLayout,
        tau: &dyn Fn(f64) -> f64,
        conv: &dyn Fn(f64) -> f64,
        bcs: &BoundaryConditions,
    ) -> Result<Self, SolverError> {
        let m = basis.n_modes();
        let nv = layout.n_vars;
        let n = nv * m;
        let nc = layout.n_cells;
        let n_trace = layout.n_trace();

        let mut cell_a = Vec::with_capacity(nc);
        let mut cell_b = Vec::with_capacity(nc);
        let mut cell_d = Vec::with_capacity(nc);
        let mut cell_c = Vec::with_capacity(nc);
        let mut cell_e = Vec::with_capacity(nc);
        let mut cell_g = Vec::with_capacity(nc);
        let mut cell_h = Vec::with_capacity(nc);
        let mut cell_ce = Vec::with_capacity(nc);
        let mut cell_cg = Vec::with_capacity(nc);
        let mut cell_x = Vec::with_capacity(nc);
        let mut cell_m = Vec::with_capacity(nc);

        let mut h_global_mat = Mat::<f64>::zeros(n_trace, n_trace);

        for (cell, iv) in grid.cells.iter().enumerate() {
            let (x_l, x_u) = (iv.x_l, iv.x_u);
            let phi_l: Vec<f64> = (0..m).map(|j| basis.phi(iv, j, x_l)).collect();
            let phi_u: Vec<f64> = (0..m).map(|j| basis.phi(iv, j, x_u)).collect();
            let dirichlet_l = cell == 0 && bcs.is_dirichlet(BoundaryFace::Lower);
            let dirichlet_u = cell + 1 == nc && bcs.is_dirichlet(BoundaryFace::Upper);

            let mut a = Mat::zeros(n, n);
            let mut b = Mat::zeros(n, n);
            let mut d = Mat::zeros(n, n);
            let mut c = Mat::zeros(2 * nv, n);
            let mut e = Mat::zeros(n, 2 * nv);
            let mut g = Mat::zeros(2 * nv, n);
            let mut h = Mat::zeros(2 * nv, 2 * nv);

            let a_var = basis.mass_matrix(iv);
            let b_var = basis.derivative_matrix(iv);
            let dc_var = basis.weighted_derivative_matrix(iv, conv);

            for var in 0..nv {
                let o = var * m;
                for i in 0..m {
                    for j in 0..m {
                        a[(o + i, o + j)] = a_var[(i, j)];
                        b[(o + i, o + j)] = b_var[(i, j)];
                        // D = -(D_c)^T + τ(x_l) φφᵀ|_l + τ(x_u) φφᵀ|_u
                        d[(o + i, o + j)] = -dc_var[(j, i)]
                            + tau(x_l) * phi_l[j] * phi_l[i]
                            + tau(x_u) * phi_u[j] * phi_u[i];
                    }
                }

                for j in 0..m {
                    let mut c0 = -phi_l[j];
                    let mut c1 = phi_u[j];
                    let mut e0 = phi_l[j] * (-conv(x_l) - tau(x_l));
                    let mut e1 = phi_u[j] * (conv(x_u) - tau(x_u));
                    let mut g0 = tau(x_l) * phi_l[j];
                    let mut g1 = tau(x_u) * phi_u[j];
                    if dirichlet_l {
                        c0 = 0.0;
                        e0 = 0.0;
                        g0 = 0.0;
                    }
                    if dirichlet_u {
                        c1 = 0.0;
                        e1 = 0.0;
                        g1 = 0.0;
                    }
                    c[(2 * var, o + j)] = c0;
                    c[(2 * var + 1, o + j)] = c1;
                    e[(o + j, 2 * var)] = e0;
                    e[(o + j, 2 * var + 1)] = e1;
                    g[(2 * var, o + j)] = g0;
                    g[(2 * var + 1, o + j)] = g1;
                }

                let mut h00 = -conv(x_l) - tau(x_l);
                let mut h11 = conv(x_u) - tau(x_u);
                if dirichlet_l {
                    h00 = 0.0;
                }
                if dirichlet_u {
                    h11 = 0.0;
                }
                h[(2 * var, 2 * var)] = h00;
                h[(2 * var + 1, 2 * var + 1)] = h11;

                let row = var * (nc + 1) + cell;
                h_global_mat[(row, row)] += h00;
                h_global_mat[(row + 1, row + 1)] += h11;
            }

            // M skeleton:
            //   [ 0    -A   -Bᵀ ]
            //   [ B     .    D  ]   (source partials and αX enter per solve)
            //   [ A     .    .  ]   (NLq, NLu enter per solve)
            let mut m_base = Mat::zeros(3 * n, 3 * n);
            let mut ce = Mat::zeros(3 * n, 2 * nv);
            let mut cg = Mat::zeros(2 * nv, 3 * n);
            for i in 0..n {
                for j in 0..n {
                    m_base[(i, n + j)] = -a[(i, j)];
                    m_base[(i, 2 * n + j)] = -b[(j, i)];
                    m_base[(n + i, j)] = b[(i, j)];
                    m_base[(n + i, 2 * n + j)] = d[(i, j)];
                    m_base[(2 * n + i, j)] = a[(i, j)];
                }
                for r in 0..2 * nv {
                    ce[(i, r)] = c[(r, i)];
                    ce[(n + i, r)] = e[(i, r)];
                    cg[(r, i)] = c[(r, i)];
                    cg[(r, 2 * n + i)] = g[(r, i)];
                }
            }

            cell_x.push(a.clone());
            cell_a.push(a);
            cell_b.push(b);
            cell_d.push(d);
            cell_c.push(c);
            cell_e.push(e);
            cell_g.push(g);
            cell_h.push(h);
            cell_m.push(m_base);
            cell_ce.push(ce);
            cell_cg.push(cg);
        }

        // A global Dirichlet face decouples from the cell interiors (its C,
        // E, G rows are zeroed); its trace row becomes the identity so that
        // λ = g_D holds there and H_global stays regular.
        for var in 0..nv {
            if bcs.is_dirichlet(BoundaryFace::Lower) {
                let row = var * (nc + 1);
                h_global_mat[(row, row)] = 1.0;
            }
            if bcs.is_dirichlet(BoundaryFace::Upper) {
                let row = var * (nc + 1) + nc;
                h_global_mat[(row, row)] = 1.0;
            }
        }

        let h_global = h_global_mat.as_ref().full_piv_lu();
        let mut probe = Mat::zeros(n_trace, n_trace);
        for i in 0..n_trace {
            probe[(i, i)] = 1.0;
        }
        if !mat_is_finite(&h_global.solve(&probe)) {
            return Err(SolverError::SingularTraceMatrix);
        }

        Ok(Self {
            a: cell_a,
            b: cell_b,
            d: cell_d,
            c: cell_c,
            e: cell_e,
            g: cell_g,
            h: cell_h,
            ce: cell_ce,
            cg: cell_cg,
            x_mass: cell_x,
            m_base: cell_m,
            rf: vec![vec![0.0; 2 * n]; nc],
            l: vec![0.0; n_trace],
            h_global,
            h_global_mat,
        })
    }

    /// Recompute the boundary-dependent forcing RF and the trace
    /// right-hand side L at time t.
    ///
    /// The forcing r(x, t) is re-projected on every call, so t-dependent
    /// forcing is picked up by each residual evaluation.
    #[allow(clippy::too_many_arguments)]
    pub fn update_boundary(
        &mut self,
        grid: &Grid,
        basis: &LegendreBasis,
        layout: &StateLayout,
        bcs: &BoundaryConditions,
        forcing: &dyn Fn(usize, f64, f64) -> f64,
        tau: &dyn Fn(f64) -> f64,
        conv: &dyn Fn(f64) -> f64,
        t: f64,
    ) {
        let m = basis.n_modes();
        let nv = layout.n_vars;
        let n = nv * m;
        let nc = layout.n_cells;

        self.l.fill(0.0);

        for (cell, iv) in grid.cells.iter().enumerate() {
            let rf = &mut self.rf[cell];
            rf.fill(0.0);

            for var in 0..nv {
                for j in 0..m {
                    rf[n + var * m + j] = basis.cell_product(iv, |x| forcing(var, x, t), j);
                }
            }

            if cell == 0 && bcs.is_dirichlet(BoundaryFace::Lower) {
                let x_l = iv.x_l;
                for var in 0..nv {
                    let gd = bcs.g_d(var, x_l, t);
                    for j in 0..m {
                        let phi = basis.phi(iv, j, x_l);
                        // ⟨g_D, v·n⟩ with n_x = -1
                        rf[var * m + j] += phi * gd;
                        // -⟨(c·n - τ) g_D, w⟩
                        rf[n + var * m + j] -= phi * (-conv(x_l) - tau(x_l)) * gd;
                    }
                }
            }

            if cell + 1 == nc && bcs.is_dirichlet(BoundaryFace::Upper) {
                let x_u = iv.x_u;
                for var in 0..nv {
                    let gd = bcs.g_d(var, x_u, t);
                    for j in 0..m {
                        let phi = basis.phi(iv, j, x_u);
                        // ⟨g_D, v·n⟩ with n_x = +1
                        rf[var * m + j] -= phi * gd;
                        rf[n + var * m + j] -= phi * (conv(x_u) - tau(x_u)) * gd;
                    }
                }
            }

            for var in 0..nv {
                if cell == 0 && !bcs.is_dirichlet(BoundaryFace::Lower) {
                    self.l[var * (nc + 1)] += bcs.g_n(var, iv.x_l, t);
                }
                if cell + 1 == nc && !bcs.is_dirichlet(BoundaryFace::Upper) {
                    self.l[var * (nc + 1) + nc] += bcs.g_n(var, iv.x_u, t);
                }
            }
        }

        // Identity trace rows carry the Dirichlet value directly.
        for var in 0..nv {
            if bcs.is_dirichlet(BoundaryFace::Lower) {
                self.l[var * (nc + 1)] = bcs.g_d(var, grid.x_min, t);
            }
            if bcs.is_dirichlet(BoundaryFace::Upper) {
                self.l[var * (nc + 1) + nc] = bcs.g_d(var, grid.x_max, t);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::BoundaryKind;

    fn setup(
        nv: usize,
        degree: usize,
        nc: usize,
        lower: BoundaryKind,
        upper: BoundaryKind,
    ) -> (Grid, LegendreBasis, StateLayout, BoundaryConditions) {
        (
            Grid::uniform(0.0, 1.0, nc),
            LegendreBasis::new(degree),
            StateLayout::new(nv, degree, nc),
            BoundaryConditions::homogeneous(lower, upper),
        )
    }

    fn assemble(
        nv: usize,
        degree: usize,
        nc: usize,
        lower: BoundaryKind,
        upper: BoundaryKind,
    ) -> SystemMatrices {
        let (grid, basis, layout, bcs) = setup(nv, degree, nc, lower, upper);
        SystemMatrices::assemble(&grid, &basis, &layout, &|_| 1.0, &|_| 0.0, &bcs).unwrap()
    }

    #[test]
    fn mass_block_is_spd() {
        let mats = assemble(2, 2, 3, BoundaryKind::Dirichlet, BoundaryKind::Dirichlet);
        let a = &mats.a[1];
        let n = a.nrows();
        for i in 0..n {
            for j in 0..n {
                assert!((a[(i, j)] - a[(j, i)]).abs() < 1e-12, "A must be symmetric");
            }
        }
        // x^T A x > 0 for a few non-trivial directions
        for seed in 1..4 {
            let x: Vec<f64> = (0..n).map(|i| ((seed * (i + 1)) as f64 * 0.7).sin()).collect();
            let mut quad = 0.0;
            for i in 0..n {
                for j in 0..n {
                    quad += x[i] * a[(i, j)] * x[j];
                }
            }
            assert!(quad > 0.0, "A must be positive definite");
        }
    }

    #[test]
    fn variable_blocks_tile_diagonally() {
        let mats = assemble(2, 1, 2, BoundaryKind::Neumann, BoundaryKind::Neumann);
        let m = 2;
        for mat in [&mats.a[0], &mats.b[0], &mats.d[0]] {
            for i in 0..2 * m {
                for j in 0..2 * m {
                    if i / m != j / m {
                        assert_eq!(mat[(i, j)], 0.0, "cross-variable coupling at ({}, {})", i, j);
                    }
                }
            }
        }
        // C couples variable v faces only to variable v modes
        for var in 0..2 {
            for other in 0..2 {
                if var == other {
                    continue;
                }
                for r in 0..2 {
                    for j in 0..m {
                        assert_eq!(mats.c[0][(2 * var + r, other * m + j)], 0.0);
                        assert_eq!(mats.g[0][(2 * var + r, other * m + j)], 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn dirichlet_boundary_rows_are_cleared() {
        let mats = assemble(1, 2, 3, BoundaryKind::Dirichlet, BoundaryKind::Neumann);
        // cell 0 touches the lower Dirichlet boundary: row 0 of C and G, col 0
        // of E, corner (0,0) of H
        for j in 0..3 {
            assert_eq!(mats.c[0][(0, j)], 0.0);
            assert_eq!(mats.g[0][(0, j)], 0.0);
            assert_eq!(mats.e[0][(j, 0)], 0.0);
        }
        assert_eq!(mats.h[0][(0, 0)], 0.0);
        // interior faces keep their entries
        assert!(mats.c[0][(1, 0)] != 0.0);
        assert!(mats.h[1][(0, 0)] != 0.0);
    }

    #[test]
    fn h_global_diagonal_for_pure_diffusion() {
        // τ = 1, c = 0, both Neumann: interior faces accumulate -2τ, the
        // boundary faces -τ
        let mats = assemble(1, 1, 4, BoundaryKind::Neumann, BoundaryKind::Neumann);
        let hg = &mats.h_global_mat;
        assert!((hg[(0, 0)] + 1.0).abs() < 1e-12);
        for j in 1..4 {
            assert!((hg[(j, j)] + 2.0).abs() < 1e-12, "face {}", j);
        }
        assert!((hg[(4, 4)] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn dirichlet_trace_rows_become_identity() {
        let mats = assemble(2, 1, 3, BoundaryKind::Dirichlet, BoundaryKind::Dirichlet);
        let hg = &mats.h_global_mat;
        for var in 0..2 {
            let lo = var * 4;
            let hi = var * 4 + 3;
            assert_eq!(hg[(lo, lo)], 1.0);
            assert_eq!(hg[(hi, hi)], 1.0);
        }
    }

    #[test]
    fn vanishing_stabilization_is_singular() {
        let (grid, basis, layout, bcs) =
            setup(1, 1, 3, BoundaryKind::Neumann, BoundaryKind::Neumann);
        let result = SystemMatrices::assemble(&grid, &basis, &layout, &|_| 0.0, &|_| 0.0, &bcs);
        assert!(matches!(result, Err(SolverError::SingularTraceMatrix)));
    }

    #[test]
    fn forcing_lands_in_the_u_rows() {
        let (grid, basis, layout, bcs) =
            setup(1, 1, 2, BoundaryKind::Neumann, BoundaryKind::Neumann);
        let mut mats =
            SystemMatrices::assemble(&grid, &basis, &layout, &|_| 1.0, &|_| 0.0, &bcs).unwrap();
        mats.update_boundary(&grid, &basis, &layout, &bcs, &|_, _, _| 2.0, &|_| 1.0, &|_| 0.0, 0.0);

        // σ rows stay zero without Dirichlet data; u rows carry ⟨2, φ_j⟩
        let iv = &grid.cells[0];
        for j in 0..2 {
            assert_eq!(mats.rf[0][j], 0.0);
            let expected = basis.cell_product(iv, |_| 2.0, j);
            assert!((mats.rf[0][2 + j] - expected).abs() < 1e-13);
        }
    }

    #[test]
    fn neumann_data_lands_in_l() {
        let (grid, basis, layout, _) =
            setup(1, 1, 2, BoundaryKind::Neumann, BoundaryKind::Neumann);
        let bcs = BoundaryConditions::new(
            BoundaryKind::Neumann,
            BoundaryKind::Neumann,
            Box::new(|_, _, _| 0.0),
            Box::new(|_, x, _| if x < 0.5 { 3.0 } else { -1.0 }),
        );
        let mut mats =
            SystemMatrices::assemble(&grid, &basis, &layout, &|_| 1.0, &|_| 0.0, &bcs).unwrap();
        mats.update_boundary(&grid, &basis, &layout, &bcs, &|_, _, _| 0.0, &|_| 1.0, &|_| 0.0, 0.0);
        assert_eq!(mats.l[0], 3.0);
        assert_eq!(mats.l[1], 0.0);
        assert_eq!(mats.l[2], -1.0);
    }

    #[test]
    fn dirichlet_data_lands_in_l() {
        let (grid, basis, layout, _) =
            setup(1, 1, 2, BoundaryKind::Dirichlet, BoundaryKind::Dirichlet);
        let bcs = BoundaryConditions::new(
            BoundaryKind::Dirichlet,
            BoundaryKind::Dirichlet,
            Box::new(|_, x, t| x + t),
            Box::new(|_, _, _| 0.0),
        );
        let mut mats =
            SystemMatrices::assemble(&grid, &basis, &layout, &|_| 1.0, &|_| 0.0, &bcs).unwrap();
        mats.update_boundary(&grid, &basis, &layout, &bcs, &|_, _, _| 0.0, &|_| 1.0, &|_| 0.0, 0.25);
        assert!((mats.l[0] - 0.25).abs() < 1e-15);
        assert!((mats.l[2] - 1.25).abs() < 1e-15);
    }
}
