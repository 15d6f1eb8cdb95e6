//! # hdg-rs
//!
//! A hybridizable discontinuous Galerkin (HDG) solver for one-dimensional
//! systems of nonlinear parabolic PDEs
//!
//! ∂ₜu − ∂ₓσ + f(x, q, u) = r(x, t),   σ = −κ(x, q, u),   q = ∂ₓu
//!
//! on an interval [a, b] with N coupled variables and Dirichlet or Neumann
//! boundary data per side.
//!
//! The crate provides the building blocks of the discretization and its
//! differential-algebraic time integration:
//! - Shifted orthonormal Legendre bases and Gauss quadrature per cell
//! - Per-cell block assembly coupling interior unknowns (σ, q, u) to
//!   inter-cell traces λ
//! - The nonlinear DAE residual `F(t, Y, Y′)`
//! - A shifted-Jacobian solve `(∂F/∂Y + α ∂F/∂Y′) δY = g` by static
//!   condensation onto the trace system
//! - Pluggable diffusion and source providers with string-keyed registries
//! - A backward-Euler transient driver and plain-text plot output

pub mod basis;
pub mod config;
pub mod grid;
pub mod output;
pub mod physics;
pub mod solver;
pub mod state;
pub mod time;

// Re-export main types for convenience
pub use basis::{GaussRule, LegendreBasis};
pub use config::{ConfigError, RunConfig};
pub use grid::{BoundaryFace, Grid, Interval};
pub use physics::{
    DiffusionModel, InitialProfile, LinearDiffusion, LogisticSource, MatrixDiffusion,
    NonlinearDiffusion, SourceModel, ZeroSource, diffusion_by_name, initial_profile_by_name,
    source_by_name,
};
pub use solver::{
    BoundaryConditions, BoundaryKind, CoeffFn, ForcingFn, SolverError, SystemSolver,
};
pub use state::{Block, DGField, StateLayout};
pub use time::{BackwardEuler, DaeSystem, IntegratorError, TransientOptions};
