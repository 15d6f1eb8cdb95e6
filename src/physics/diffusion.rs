//! Concrete diffusion cases.

use super::DiffusionModel;

/// Scalar linear diffusion: κ_v = d · q_v.
///
/// With d = 1 this closes the plain heat equation u̇ = ∂ₓₓu for every
/// variable independently.
#[derive(Clone, Debug)]
pub struct LinearDiffusion {
    /// Diffusivity d
    pub d: f64,
}

impl LinearDiffusion {
    /// Create with diffusivity d.
    pub fn new(d: f64) -> Self {
        Self { d }
    }
}

impl DiffusionModel for LinearDiffusion {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn kappa(&self, var: usize, _x: f64, q: &[f64], _u: &[f64]) -> f64 {
        self.d * q[var]
    }

    fn dkappa_dq(&self, var: usize, wrt: usize, _x: f64, _q: &[f64], _u: &[f64]) -> f64 {
        if var == wrt { self.d } else { 0.0 }
    }

    fn dkappa_du(&self, _var: usize, _wrt: usize, _x: f64, _q: &[f64], _u: &[f64]) -> f64 {
        0.0
    }
}

/// Matrix diffusion: κ_v = Σ_w K[v][w] q_w.
#[derive(Clone, Debug)]
pub struct MatrixDiffusion {
    /// Row-major coupling matrix K
    pub coupling: Vec<Vec<f64>>,
}

impl MatrixDiffusion {
    /// Create from a full coupling matrix.
    pub fn new(coupling: Vec<Vec<f64>>) -> Self {
        let n = coupling.len();
        for row in &coupling {
            assert_eq!(row.len(), n, "coupling matrix must be square");
        }
        Self { coupling }
    }

    /// Create a diagonal coupling diag(d_0, ..., d_{N-1}).
    pub fn diagonal(diag: Vec<f64>) -> Self {
        let n = diag.len();
        let coupling = (0..n)
            .map(|v| (0..n).map(|w| if v == w { diag[v] } else { 0.0 }).collect())
            .collect();
        Self { coupling }
    }
}

impl DiffusionModel for MatrixDiffusion {
    fn name(&self) -> &'static str {
        "matrix"
    }

    fn kappa(&self, var: usize, _x: f64, q: &[f64], _u: &[f64]) -> f64 {
        self.coupling[var]
            .iter()
            .zip(q.iter())
            .map(|(&k, &qv)| k * qv)
            .sum()
    }

    fn dkappa_dq(&self, var: usize, wrt: usize, _x: f64, _q: &[f64], _u: &[f64]) -> f64 {
        self.coupling[var][wrt]
    }

    fn dkappa_du(&self, _var: usize, _wrt: usize, _x: f64, _q: &[f64], _u: &[f64]) -> f64 {
        0.0
    }
}

/// Value-dependent diffusion: κ_v = (1 + u_v²) q_v.
///
/// The simplest case exercising both NLq and NLu blocks of the Jacobian.
#[derive(Clone, Copy, Debug, Default)]
pub struct NonlinearDiffusion;

impl DiffusionModel for NonlinearDiffusion {
    fn name(&self) -> &'static str {
        "nonlinear"
    }

    fn kappa(&self, var: usize, _x: f64, q: &[f64], u: &[f64]) -> f64 {
        (1.0 + u[var] * u[var]) * q[var]
    }

    fn dkappa_dq(&self, var: usize, wrt: usize, _x: f64, _q: &[f64], u: &[f64]) -> f64 {
        if var == wrt { 1.0 + u[var] * u[var] } else { 0.0 }
    }

    fn dkappa_du(&self, var: usize, wrt: usize, _x: f64, q: &[f64], u: &[f64]) -> f64 {
        if var == wrt { 2.0 * u[var] * q[var] } else { 0.0 }
    }
}
