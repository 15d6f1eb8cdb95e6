//! Concrete source/reaction cases.

use super::SourceModel;

/// No reaction.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZeroSource;

impl SourceModel for ZeroSource {
    fn name(&self) -> &'static str {
        "none"
    }

    fn source(&self, _var: usize, _x: f64, _s: &[f64], _q: &[f64], _u: &[f64]) -> f64 {
        0.0
    }

    fn dsource_dq(&self, _v: usize, _w: usize, _x: f64, _s: &[f64], _q: &[f64], _u: &[f64]) -> f64 {
        0.0
    }

    fn dsource_du(&self, _v: usize, _w: usize, _x: f64, _s: &[f64], _q: &[f64], _u: &[f64]) -> f64 {
        0.0
    }

    fn dsource_dsigma(
        &self,
        _v: usize,
        _w: usize,
        _x: f64,
        _s: &[f64],
        _q: &[f64],
        _u: &[f64],
    ) -> f64 {
        0.0
    }
}

/// Linear reaction: f_v = γ u_v.
#[derive(Clone, Debug)]
pub struct LinearSource {
    /// Rate γ
    pub gamma: f64,
}

impl LinearSource {
    /// Create with rate γ.
    pub fn new(gamma: f64) -> Self {
        Self { gamma }
    }
}

impl SourceModel for LinearSource {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn source(&self, var: usize, _x: f64, _s: &[f64], _q: &[f64], u: &[f64]) -> f64 {
        self.gamma * u[var]
    }

    fn dsource_dq(&self, _v: usize, _w: usize, _x: f64, _s: &[f64], _q: &[f64], _u: &[f64]) -> f64 {
        0.0
    }

    fn dsource_du(&self, var: usize, wrt: usize, _x: f64, _s: &[f64], _q: &[f64], _u: &[f64]) -> f64 {
        if var == wrt { self.gamma } else { 0.0 }
    }

    fn dsource_dsigma(
        &self,
        _v: usize,
        _w: usize,
        _x: f64,
        _s: &[f64],
        _q: &[f64],
        _u: &[f64],
    ) -> f64 {
        0.0
    }
}

/// Logistic reaction: f_v = ρ u_v (1 - u_v).
#[derive(Clone, Debug)]
pub struct LogisticSource {
    /// Rate ρ
    pub rate: f64,
}

impl LogisticSource {
    /// Create with rate ρ.
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }
}

impl SourceModel for LogisticSource {
    fn name(&self) -> &'static str {
        "logistic"
    }

    fn source(&self, var: usize, _x: f64, _s: &[f64], _q: &[f64], u: &[f64]) -> f64 {
        self.rate * u[var] * (1.0 - u[var])
    }

    fn dsource_dq(&self, _v: usize, _w: usize, _x: f64, _s: &[f64], _q: &[f64], _u: &[f64]) -> f64 {
        0.0
    }

    fn dsource_du(&self, var: usize, wrt: usize, _x: f64, _s: &[f64], _q: &[f64], u: &[f64]) -> f64 {
        if var == wrt { self.rate * (1.0 - 2.0 * u[var]) } else { 0.0 }
    }

    fn dsource_dsigma(
        &self,
        _v: usize,
        _w: usize,
        _x: f64,
        _s: &[f64],
        _q: &[f64],
        _u: &[f64],
    ) -> f64 {
        0.0
    }
}
