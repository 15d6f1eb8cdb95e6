//! Backward-Euler transient driver.
//!
//! A first-order BDF step through the same residual/linear-solve interface
//! an IDA-class integrator would use: each step solves
//! F(t₁, Y₁, (Y₁ - Y₀)/Δt) = 0 by Newton iteration with the shift
//! α = 1/Δt, and the driver owns the retry policy, halving the step on
//! Newton or linear-solve failure.

use crate::solver::SolverError;
use crate::time::DaeSystem;
use thiserror::Error;

/// Tolerances and iteration limits of the transient driver.
#[derive(Clone, Debug)]
pub struct TransientOptions {
    /// Relative tolerance of the Newton convergence test
    pub rtol: f64,
    /// Absolute tolerance of the Newton convergence test
    pub atol: f64,
    /// Newton iterations per step attempt
    pub max_newton: usize,
    /// Step halvings before giving up
    pub max_halvings: usize,
    /// Print accepted steps to stdout
    pub verbose: bool,
}

impl Default for TransientOptions {
    fn default() -> Self {
        Self {
            rtol: 1e-5,
            atol: 1e-5,
            max_newton: 12,
            max_halvings: 16,
            verbose: false,
        }
    }
}

/// Errors of the transient driver.
#[derive(Debug, Error)]
pub enum IntegratorError {
    /// Step halving bottomed out without an accepted step.
    #[error("time step underflow at t = {t} (dt = {dt:e})")]
    StepSizeUnderflow {
        /// Time of the failed step
        t: f64,
        /// Step size at which the driver gave up
        dt: f64,
    },

    /// A solver error outside the retry loop.
    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Backward-Euler integrator.
#[derive(Clone, Debug, Default)]
pub struct BackwardEuler {
    /// Driver options
    pub opts: TransientOptions,
}

impl BackwardEuler {
    /// Create a driver with the given options.
    pub fn new(opts: TransientOptions) -> Self {
        Self { opts }
    }

    /// Weighted RMS norm of an update against the current iterate.
    fn wrms(&self, delta: &[f64], y: &[f64]) -> f64 {
        let mut acc = 0.0;
        for (d, v) in delta.iter().zip(y.iter()) {
            let w = self.opts.atol + self.opts.rtol * v.abs();
            acc += (d / w) * (d / w);
        }
        (acc / delta.len() as f64).sqrt()
    }

    /// One Newton-iterated backward-Euler attempt from (t₀, y₀) over dt.
    ///
    /// On success `y1` holds the accepted state. Failure (no convergence,
    /// non-finite residual, singular solve) is reported without touching
    /// the caller's retry budget.
    fn try_step(
        &self,
        system: &mut dyn DaeSystem,
        t0: f64,
        dt: f64,
        y0: &[f64],
        yp0: &[f64],
        y1: &mut [f64],
    ) -> bool {
        let n = y0.len();
        let t1 = t0 + dt;
        let alpha = 1.0 / dt;

        // first-order predictor
        for i in 0..n {
            y1[i] = y0[i] + dt * yp0[i];
        }

        let mut yp1 = vec![0.0; n];
        let mut res = vec![0.0; n];
        let mut neg_res = vec![0.0; n];
        let mut delta = vec![0.0; n];

        for _ in 0..self.opts.max_newton {
            for i in 0..n {
                yp1[i] = (y1[i] - y0[i]) * alpha;
            }
            if system.residual(t1, y1, &yp1, &mut res).is_err() {
                return false;
            }
            for i in 0..n {
                neg_res[i] = -res[i];
            }
            if system.solve_shifted(alpha, y1, &neg_res, &mut delta).is_err() {
                return false;
            }
            for i in 0..n {
                y1[i] += delta[i];
            }
            if self.wrms(&delta, y1) < 0.1 {
                return true;
            }
        }
        false
    }

    /// Advance from t₀ to t_end with nominal step dt, sub-stepping and
    /// halving as needed. Returns the number of accepted steps.
    pub fn advance(
        &self,
        system: &mut dyn DaeSystem,
        t0: f64,
        t_end: f64,
        dt_nominal: f64,
        y: &mut [f64],
        yp: &mut [f64],
    ) -> Result<usize, IntegratorError> {
        assert!(dt_nominal > 0.0, "step size must be positive");
        let n = y.len();
        let mut t = t0;
        let mut dt = dt_nominal;
        let mut y1 = vec![0.0; n];
        let mut steps = 0usize;

        while t < t_end - 1e-14 * t_end.abs().max(1.0) {
            let dt_try = dt.min(t_end - t);
            if self.try_step(system, t, dt_try, y, yp, &mut y1) {
                for i in 0..n {
                    yp[i] = (y1[i] - y[i]) / dt_try;
                }
                y.copy_from_slice(&y1);
                t += dt_try;
                steps += 1;
                // recover toward the nominal step after successful halved steps
                dt = (dt * 2.0).min(dt_nominal);
                if self.opts.verbose {
                    println!("t = {:.6e} (dt = {:.3e})", t, dt_try);
                }
            } else {
                dt = dt_try * 0.5;
                if dt < dt_nominal * 0.5f64.powi(self.opts.max_halvings as i32) {
                    return Err(IntegratorError::StepSizeUnderflow { t, dt });
                }
            }
        }

        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::physics::{InitialProfile, LinearDiffusion, ZeroSource};
    use crate::solver::{BoundaryConditions, BoundaryKind, SystemSolver};
    use crate::time::allocate_initial_state;
    use std::f64::consts::PI;
    use std::sync::Arc;

    fn heat_system(n_cells: usize, degree: usize) -> SystemSolver {
        SystemSolver::new(
            Grid::uniform(0.0, 1.0, n_cells),
            degree,
            1,
            BoundaryConditions::homogeneous(BoundaryKind::Dirichlet, BoundaryKind::Dirichlet),
            Box::new(|_| 1.0),
            Box::new(|_| 0.0),
            Box::new(|_, _, _| 0.0),
            Arc::new(LinearDiffusion::new(1.0)),
            Arc::new(ZeroSource),
        )
        .unwrap()
    }

    #[test]
    fn heat_mode_decays_at_the_analytic_rate() {
        let mut system = heat_system(8, 2);
        let profile = InitialProfile::new(|_, x| (PI * x).sin(), |_, x| PI * (PI * x).cos());
        let (mut y, mut yp) = allocate_initial_state(&mut system, &profile).unwrap();

        let driver = BackwardEuler::new(TransientOptions {
            rtol: 1e-8,
            atol: 1e-10,
            ..Default::default()
        });
        let t_end = 0.02;
        driver
            .advance(&mut system, 0.0, t_end, 5e-4, &mut y, &mut yp)
            .unwrap();

        let expected = (-PI * PI * t_end).exp();
        let got = system.eval(&y, crate::state::Block::U, 0, 0.5);
        assert!(
            (got - expected).abs() < 5e-3,
            "u(0.5, {}) = {}, expected {}",
            t_end,
            got,
            expected
        );
    }

    #[test]
    fn derivative_tracks_the_difference_quotient() {
        let mut system = heat_system(4, 1);
        let profile = InitialProfile::new(|_, x| x * (1.0 - x), |_, x| 1.0 - 2.0 * x);
        let (mut y, mut yp) = allocate_initial_state(&mut system, &profile).unwrap();

        let before = y.clone();
        let driver = BackwardEuler::default();
        let dt = 1e-3;
        driver
            .advance(&mut system, 0.0, dt, dt, &mut y, &mut yp)
            .unwrap();
        for i in 0..y.len() {
            let quotient = (y[i] - before[i]) / dt;
            assert!(
                (yp[i] - quotient).abs() < 1e-12,
                "slot {}: yp = {}, quotient = {}",
                i,
                yp[i],
                quotient
            );
        }
    }

    #[test]
    fn persistent_failure_underflows_the_step() {
        let mut system = SystemSolver::new(
            Grid::uniform(0.0, 1.0, 2),
            1,
            1,
            BoundaryConditions::homogeneous(BoundaryKind::Dirichlet, BoundaryKind::Dirichlet),
            Box::new(|_| 1.0),
            Box::new(|_| 0.0),
            Box::new(|_, _, _| f64::NAN),
            Arc::new(LinearDiffusion::new(1.0)),
            Arc::new(ZeroSource),
        )
        .unwrap();
        let n = system.layout().n_dof();
        let mut y = vec![0.0; n];
        let mut yp = vec![0.0; n];

        let driver = BackwardEuler::default();
        let err = driver
            .advance(&mut system, 0.0, 0.1, 0.01, &mut y, &mut yp)
            .unwrap_err();
        assert!(matches!(err, IntegratorError::StepSizeUnderflow { .. }));
    }

    #[test]
    fn differential_mask_marks_u_slots() {
        let system = heat_system(3, 1);
        use crate::time::DaeSystem;
        let mask = system.differential_mask();
        assert_eq!(mask, system.layout().id_mask());
        assert_eq!(mask.len(), system.layout().n_dof());
    }
}
