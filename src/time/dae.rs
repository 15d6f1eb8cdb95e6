//! The contract between the spatial core and a DAE integrator.
//!
//! Any BDF/IDA-class integrator drives the core through three calls: the
//! residual F(t, Y, Y′), the shifted linear solve, and the identity mask
//! separating differential u slots from algebraic σ, q, λ slots. Jacobian
//! construction stays internal to the solver; an integrator that insists
//! on a Jacobian callback can be handed a no-op.

use crate::physics::InitialProfile;
use crate::solver::{SolverError, SystemSolver};

/// A differential-algebraic system F(t, Y, Y′) = 0 with a built-in
/// shifted-Jacobian solve.
pub trait DaeSystem {
    /// State vector length.
    fn n_dof(&self) -> usize;

    /// 1.0 on differential slots, 0.0 on algebraic slots.
    fn differential_mask(&self) -> Vec<f64>;

    /// Evaluate the residual into `res`.
    fn residual(&mut self, t: f64, y: &[f64], yp: &[f64], res: &mut [f64])
        -> Result<(), SolverError>;

    /// Solve (∂F/∂Y + α ∂F/∂Y′) δY = g at the iterate `y`.
    fn solve_shifted(
        &mut self,
        alpha: f64,
        y: &[f64],
        g: &[f64],
        delta: &mut [f64],
    ) -> Result<(), SolverError>;
}

impl DaeSystem for SystemSolver {
    fn n_dof(&self) -> usize {
        self.layout().n_dof()
    }

    fn differential_mask(&self) -> Vec<f64> {
        self.id_mask()
    }

    fn residual(
        &mut self,
        t: f64,
        y: &[f64],
        yp: &[f64],
        res: &mut [f64],
    ) -> Result<(), SolverError> {
        SystemSolver::residual(self, t, y, yp, res)
    }

    fn solve_shifted(
        &mut self,
        alpha: f64,
        y: &[f64],
        g: &[f64],
        delta: &mut [f64],
    ) -> Result<(), SolverError> {
        SystemSolver::solve_shifted(self, alpha, y, g, delta)
    }
}

/// Convenience: initialize (Y, Y′) for a [`SystemSolver`] run.
///
/// Allocates the integrator-side vectors and fills them through the
/// initial-condition closure.
pub fn allocate_initial_state(
    system: &mut SystemSolver,
    profile: &InitialProfile,
) -> Result<(Vec<f64>, Vec<f64>), SolverError> {
    let n = system.layout().n_dof();
    let mut y = vec![0.0; n];
    let mut yp = vec![0.0; n];
    system.set_initial_conditions(profile, &mut y, &mut yp)?;
    Ok((y, yp))
}
