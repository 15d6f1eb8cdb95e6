//! Pluggable physics: diffusion and source providers, initial conditions.
//!
//! Providers are registered under the strings used by the configuration
//! keys `Diffusion_case`, `Reaction_case` and `Initial_condition`.

mod diffusion;
mod initial;
mod source;
mod traits;

pub use diffusion::{LinearDiffusion, MatrixDiffusion, NonlinearDiffusion};
pub use initial::{InitialProfile, initial_profile_by_name};
pub use source::{LinearSource, LogisticSource, ZeroSource};
pub use traits::{DiffusionModel, FullSample, GradValueSample, SourceModel};

use std::sync::Arc;

/// Look up a diffusion case by configuration name.
///
/// Recognized names: `linear` (unit diffusivity), `weak` (diffusivity
/// 0.01), `matrix` (diag(1, 0.5, 0.5, ...)), `nonlinear`.
pub fn diffusion_by_name(name: &str, n_vars: usize) -> Option<Arc<dyn DiffusionModel>> {
    match name {
        "linear" => Some(Arc::new(LinearDiffusion::new(1.0))),
        "weak" => Some(Arc::new(LinearDiffusion::new(0.01))),
        "matrix" => {
            let diag = (0..n_vars).map(|v| if v == 0 { 1.0 } else { 0.5 }).collect();
            Some(Arc::new(MatrixDiffusion::diagonal(diag)))
        }
        "nonlinear" => Some(Arc::new(NonlinearDiffusion)),
        _ => None,
    }
}

/// Look up a source (reaction) case by configuration name.
///
/// Recognized names: `none`, `linear`, `logistic`.
pub fn source_by_name(name: &str) -> Option<Arc<dyn SourceModel>> {
    match name {
        "none" => Some(Arc::new(ZeroSource)),
        "linear" => Some(Arc::new(LinearSource::new(1.0))),
        "logistic" => Some(Arc::new(LogisticSource::new(1.0))),
        _ => None,
    }
}
