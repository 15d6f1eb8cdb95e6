//! DAE integration: the integrator-facing contract and a built-in
//! backward-Euler driver.

mod dae;
mod transient;

pub use dae::{allocate_initial_state, DaeSystem};
pub use transient::{BackwardEuler, IntegratorError, TransientOptions};
