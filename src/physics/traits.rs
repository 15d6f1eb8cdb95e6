//! Provider traits for the nonlinear closures κ and f.
//!
//! Concrete providers implement pointwise evaluation and pointwise partial
//! derivatives; the per-cell Jacobian blocks of the projected quantities
//! are supplied by default methods built on the cell quadrature, so a
//! provider is one base capability with many concrete cases rather than an
//! inheritance hierarchy.
//!
//! Providers must be deterministic for identical inputs.

use crate::basis::LegendreBasis;
use crate::grid::Interval;
use faer::Mat;

/// Pointwise (q, u) sample of all variables at a location in a cell.
pub type GradValueSample<'a> = dyn Fn(f64) -> (Vec<f64>, Vec<f64>) + 'a;

/// Pointwise (σ, q, u) sample of all variables at a location in a cell.
pub type FullSample<'a> = dyn Fn(f64) -> (Vec<f64>, Vec<f64>, Vec<f64>) + 'a;

/// Build the N(k+1) × N(k+1) Jacobian of a projected quantity from a
/// pointwise partial derivative: block (v, w) holds ⟨∂g_v/∂y_w φ_j, φ_i⟩.
fn projected_jacobian(
    basis: &LegendreBasis,
    iv: &Interval,
    n_vars: usize,
    partial: &dyn Fn(usize, usize, f64) -> f64,
) -> Mat<f64> {
    let m = basis.n_modes();
    let jac = iv.width() / 2.0;
    let mut out = Mat::zeros(n_vars * m, n_vars * m);

    for (&r, &wq) in basis.quad.nodes.iter().zip(basis.quad.weights.iter()) {
        let x = iv.from_reference(r);
        let phi: Vec<f64> = (0..m).map(|j| basis.phi(iv, j, x)).collect();
        for v in 0..n_vars {
            for w in 0..n_vars {
                let d = partial(v, w, x);
                if d == 0.0 {
                    continue;
                }
                let c = wq * jac * d;
                for i in 0..m {
                    for j in 0..m {
                        out[(v * m + i, w * m + j)] += c * phi[j] * phi[i];
                    }
                }
            }
        }
    }
    out
}

/// Diffusion operator κ(x, q, u) and its derivatives, per variable.
pub trait DiffusionModel: Send + Sync {
    /// Case name for diagnostics.
    fn name(&self) -> &'static str;

    /// κ_v(x, q, u).
    fn kappa(&self, var: usize, x: f64, q: &[f64], u: &[f64]) -> f64;

    /// ∂κ_v/∂q_wrt at (x, q, u).
    fn dkappa_dq(&self, var: usize, wrt: usize, x: f64, q: &[f64], u: &[f64]) -> f64;

    /// ∂κ_v/∂u_wrt at (x, q, u).
    fn dkappa_du(&self, var: usize, wrt: usize, x: f64, q: &[f64], u: &[f64]) -> f64;

    /// Jacobian of the projected κ with respect to the cell's q coefficients.
    fn nl_q_matrix(
        &self,
        basis: &LegendreBasis,
        iv: &Interval,
        n_vars: usize,
        sample: &GradValueSample,
    ) -> Mat<f64> {
        projected_jacobian(basis, iv, n_vars, &|v, w, x| {
            let (q, u) = sample(x);
            self.dkappa_dq(v, w, x, &q, &u)
        })
    }

    /// Jacobian of the projected κ with respect to the cell's u coefficients.
    fn nl_u_matrix(
        &self,
        basis: &LegendreBasis,
        iv: &Interval,
        n_vars: usize,
        sample: &GradValueSample,
    ) -> Mat<f64> {
        projected_jacobian(basis, iv, n_vars, &|v, w, x| {
            let (q, u) = sample(x);
            self.dkappa_du(v, w, x, &q, &u)
        })
    }
}

/// Source/reaction operator f(x, σ, q, u) and its derivatives, per variable.
pub trait SourceModel: Send + Sync {
    /// Case name for diagnostics.
    fn name(&self) -> &'static str;

    /// f_v(x, σ, q, u).
    fn source(&self, var: usize, x: f64, sigma: &[f64], q: &[f64], u: &[f64]) -> f64;

    /// ∂f_v/∂q_wrt.
    fn dsource_dq(&self, var: usize, wrt: usize, x: f64, sigma: &[f64], q: &[f64], u: &[f64])
        -> f64;

    /// ∂f_v/∂u_wrt.
    fn dsource_du(&self, var: usize, wrt: usize, x: f64, sigma: &[f64], q: &[f64], u: &[f64])
        -> f64;

    /// ∂f_v/∂σ_wrt.
    fn dsource_dsigma(
        &self,
        var: usize,
        wrt: usize,
        x: f64,
        sigma: &[f64],
        q: &[f64],
        u: &[f64],
    ) -> f64;

    /// Jacobian of the projected f with respect to the cell's q coefficients.
    fn df_dq_matrix(
        &self,
        basis: &LegendreBasis,
        iv: &Interval,
        n_vars: usize,
        sample: &FullSample,
    ) -> Mat<f64> {
        projected_jacobian(basis, iv, n_vars, &|v, w, x| {
            let (s, q, u) = sample(x);
            self.dsource_dq(v, w, x, &s, &q, &u)
        })
    }

    /// Jacobian of the projected f with respect to the cell's u coefficients.
    fn df_du_matrix(
        &self,
        basis: &LegendreBasis,
        iv: &Interval,
        n_vars: usize,
        sample: &FullSample,
    ) -> Mat<f64> {
        projected_jacobian(basis, iv, n_vars, &|v, w, x| {
            let (s, q, u) = sample(x);
            self.dsource_du(v, w, x, &s, &q, &u)
        })
    }

    /// Jacobian of the projected f with respect to the cell's σ coefficients.
    fn df_dsigma_matrix(
        &self,
        basis: &LegendreBasis,
        iv: &Interval,
        n_vars: usize,
        sample: &FullSample,
    ) -> Mat<f64> {
        projected_jacobian(basis, iv, n_vars, &|v, w, x| {
            let (s, q, u) = sample(x);
            self.dsource_dsigma(v, w, x, &s, &q, &u)
        })
    }
}
