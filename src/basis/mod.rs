//! Per-cell polynomial basis.
//!
//! Each grid cell I = [x_l, x_u] carries the shifted Legendre basis
//!
//! φ_j(x) = sqrt((2j+1)/h) P_j(2 (x - x_l)/h - 1),   h = x_u - x_l,
//!
//! which is orthonormal in L²(I). The basis object also owns the Gauss
//! quadrature rule used for every inner product, sized so that products of
//! two modes are integrated exactly and nonlinear provider functions are
//! well resolved.

mod legendre;
mod quadrature;

pub use legendre::{legendre, legendre_prime};
pub use quadrature::GaussRule;

use crate::grid::Interval;
use faer::Mat;

/// Shifted orthonormal Legendre basis of fixed degree, shared by all cells.
#[derive(Clone, Debug)]
pub struct LegendreBasis {
    /// Polynomial degree k; the basis has k+1 modes
    pub degree: usize,
    /// Quadrature rule with 2(k+1) points (exact through degree 4k+3)
    pub quad: GaussRule,
}

impl LegendreBasis {
    /// Create the basis of degree k.
    pub fn new(degree: usize) -> Self {
        Self {
            degree,
            quad: GaussRule::new(2 * (degree + 1)),
        }
    }

    /// Number of modes per cell (k+1).
    pub fn n_modes(&self) -> usize {
        self.degree + 1
    }

    /// Evaluate mode j at physical coordinate x in cell `iv`.
    pub fn phi(&self, iv: &Interval, j: usize, x: f64) -> f64 {
        let h = iv.width();
        let r = iv.to_reference(x);
        ((2 * j + 1) as f64 / h).sqrt() * legendre(j, r)
    }

    /// Evaluate dφ_j/dx at physical coordinate x in cell `iv`.
    pub fn phi_prime(&self, iv: &Interval, j: usize, x: f64) -> f64 {
        let h = iv.width();
        let r = iv.to_reference(x);
        ((2 * j + 1) as f64 / h).sqrt() * legendre_prime(j, r) * 2.0 / h
    }

    /// Evaluate Σ_j coeffs[j] φ_j(x) for x inside `iv`.
    ///
    /// Callers must localize first; the result is meaningless for x
    /// outside the cell.
    pub fn evaluate(&self, iv: &Interval, coeffs: &[f64], x: f64) -> f64 {
        let h = iv.width();
        let r = iv.to_reference(x);
        let scale = (1.0 / h).sqrt();

        let mut acc = 0.0;
        let mut p_prev = 1.0;
        let mut p_curr = r;
        for (j, &c) in coeffs.iter().enumerate() {
            let p = match j {
                0 => 1.0,
                1 => p_curr,
                _ => {
                    let m = j - 1;
                    let p_next =
                        ((2 * m + 1) as f64 * r * p_curr - m as f64 * p_prev) / (m + 1) as f64;
                    p_prev = p_curr;
                    p_curr = p_next;
                    p_next
                }
            };
            acc += c * ((2 * j + 1) as f64).sqrt() * scale * p;
        }
        acc
    }

    /// Mass matrix M_ij = ⟨φ_i, φ_j⟩ on `iv`.
    ///
    /// Computed by quadrature rather than assumed to be the identity, so
    /// that weighted variants share one code path.
    pub fn mass_matrix(&self, iv: &Interval) -> Mat<f64> {
        self.weighted_mass_matrix(iv, |_| 1.0)
    }

    /// Weighted mass matrix M_ij = ⟨φ_i, w φ_j⟩ on `iv`.
    pub fn weighted_mass_matrix<W: Fn(f64) -> f64>(&self, iv: &Interval, w: W) -> Mat<f64> {
        let n = self.n_modes();
        let jac = iv.width() / 2.0;
        let mut m = Mat::zeros(n, n);
        for (&r, &wq) in self.quad.nodes.iter().zip(self.quad.weights.iter()) {
            let x = iv.from_reference(r);
            let c = wq * jac * w(x);
            for i in 0..n {
                let pi = self.phi(iv, i, x);
                for j in 0..n {
                    m[(i, j)] += c * pi * self.phi(iv, j, x);
                }
            }
        }
        m
    }

    /// Derivative matrix B_ij = ⟨φ_i, φ_j′⟩ on `iv`.
    pub fn derivative_matrix(&self, iv: &Interval) -> Mat<f64> {
        self.weighted_derivative_matrix(iv, |_| 1.0)
    }

    /// Weighted derivative matrix B_ij = ⟨φ_i, w φ_j′⟩ on `iv`.
    pub fn weighted_derivative_matrix<W: Fn(f64) -> f64>(&self, iv: &Interval, w: W) -> Mat<f64> {
        let n = self.n_modes();
        let jac = iv.width() / 2.0;
        let mut m = Mat::zeros(n, n);
        for (&r, &wq) in self.quad.nodes.iter().zip(self.quad.weights.iter()) {
            let x = iv.from_reference(r);
            let c = wq * jac * w(x);
            for i in 0..n {
                let pi = self.phi(iv, i, x);
                for j in 0..n {
                    m[(i, j)] += c * pi * self.phi_prime(iv, j, x);
                }
            }
        }
        m
    }

    /// Cell product ⟨f, φ_j⟩ on `iv`.
    pub fn cell_product<F: Fn(f64) -> f64>(&self, iv: &Interval, f: F, j: usize) -> f64 {
        let jac = iv.width() / 2.0;
        self.quad
            .nodes
            .iter()
            .zip(self.quad.weights.iter())
            .map(|(&r, &wq)| {
                let x = iv.from_reference(r);
                wq * jac * f(x) * self.phi(iv, j, x)
            })
            .sum()
    }

    /// L² projection of g onto the cell basis.
    ///
    /// Orthonormality makes the projection coefficients plain cell
    /// products ⟨g, φ_j⟩.
    pub fn project<F: Fn(f64) -> f64>(&self, iv: &Interval, g: F) -> Vec<f64> {
        (0..self.n_modes())
            .map(|j| self.cell_product(iv, &g, j))
            .collect()
    }
}
