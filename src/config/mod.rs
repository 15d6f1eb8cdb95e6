//! Run configuration.
//!
//! Runs are described by a TOML file with a `[configuration]` table. Keys
//! follow the historical solver-input naming; every required key must be
//! present exactly once and well typed, or the run aborts before any
//! integration happens.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::grid::Grid;
use crate::physics::{diffusion_by_name, initial_profile_by_name, source_by_name, InitialProfile};
use crate::solver::{BoundaryConditions, BoundaryKind, SolverError, SystemSolver};

/// Configuration errors; all fatal before integration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// TOML syntax or missing/mistyped key.
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of its valid range.
    #[error("invalid value for {key}: {reason}")]
    Invalid {
        /// Offending key
        key: &'static str,
        /// What went wrong
        reason: String,
    },

    /// A case selector names no registered provider.
    #[error("unknown {kind} case \"{name}\"")]
    UnknownCase {
        /// Registry kind (diffusion, reaction, initial condition)
        kind: &'static str,
        /// The selector string
        name: String,
    },

    /// Assembly failed while building the system.
    #[error(transparent)]
    Assembly(#[from] SolverError),
}

fn float_or_int<'de, D>(de: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Num {
        I(i64),
        F(f64),
    }
    Ok(match Num::deserialize(de)? {
        Num::I(i) => i as f64,
        Num::F(f) => f,
    })
}

fn opt_float_or_int<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    float_or_int(de).map(Some)
}

#[derive(Debug, Deserialize)]
struct RawFile {
    configuration: RawConfiguration,
}

#[derive(Debug, Deserialize)]
struct RawConfiguration {
    #[serde(rename = "Polynomial_degree")]
    polynomial_degree: i64,
    #[serde(rename = "Grid_size")]
    grid_size: i64,
    #[serde(rename = "Number_of_channels")]
    number_of_channels: i64,
    #[serde(rename = "Lower_boundary", deserialize_with = "float_or_int")]
    lower_boundary: f64,
    #[serde(rename = "Upper_boundary", deserialize_with = "float_or_int")]
    upper_boundary: f64,
    #[serde(rename = "LB_Type")]
    lb_type: String,
    #[serde(rename = "UB_Type")]
    ub_type: String,
    #[serde(rename = "Initial_condition")]
    initial_condition: String,
    #[serde(rename = "Diffusion_case")]
    diffusion_case: String,
    #[serde(rename = "Reaction_case")]
    reaction_case: String,
    #[serde(rename = "delta_t", deserialize_with = "float_or_int")]
    delta_t: f64,
    #[serde(rename = "t_final", deserialize_with = "float_or_int")]
    t_final: f64,
    #[serde(
        rename = "Relative_tolerance",
        default,
        deserialize_with = "opt_float_or_int"
    )]
    relative_tolerance: Option<f64>,
    #[serde(
        rename = "Absolute_tolerance",
        default,
        deserialize_with = "opt_float_or_int"
    )]
    absolute_tolerance: Option<f64>,
}

/// Validated run configuration.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Polynomial degree k ≥ 0
    pub degree: usize,
    /// Number of cells Nc ≥ 1
    pub n_cells: usize,
    /// Number of variables N ≥ 1
    pub n_vars: usize,
    /// Domain lower bound a
    pub x_min: f64,
    /// Domain upper bound b
    pub x_max: f64,
    /// Boundary kind at a
    pub lower_kind: BoundaryKind,
    /// Boundary kind at b
    pub upper_kind: BoundaryKind,
    /// Initial-condition selector
    pub initial_condition: String,
    /// Diffusion-case selector
    pub diffusion_case: String,
    /// Reaction-case selector
    pub reaction_case: String,
    /// Output print interval
    pub delta_t: f64,
    /// Final time
    pub t_final: f64,
    /// Integrator relative tolerance
    pub rtol: f64,
    /// Integrator absolute tolerance
    pub atol: f64,
}

impl RunConfig {
    /// Parse and validate a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Parse and validate configuration text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let raw: RawFile = toml::from_str(text)?;
        let c = raw.configuration;

        let invalid = |key: &'static str, reason: String| ConfigError::Invalid { key, reason };

        if c.polynomial_degree < 0 {
            return Err(invalid("Polynomial_degree", "must be non-negative".into()));
        }
        if c.grid_size < 1 {
            return Err(invalid("Grid_size", "need at least one cell".into()));
        }
        if c.number_of_channels < 1 {
            return Err(invalid("Number_of_channels", "need at least one channel".into()));
        }
        if !(c.upper_boundary > c.lower_boundary) {
            return Err(invalid(
                "Upper_boundary",
                format!("empty domain [{}, {}]", c.lower_boundary, c.upper_boundary),
            ));
        }
        let lower_kind = BoundaryKind::parse(&c.lb_type)
            .ok_or_else(|| invalid("LB_Type", format!("unrecognized kind \"{}\"", c.lb_type)))?;
        let upper_kind = BoundaryKind::parse(&c.ub_type)
            .ok_or_else(|| invalid("UB_Type", format!("unrecognized kind \"{}\"", c.ub_type)))?;
        if !(c.delta_t > 0.0) {
            return Err(invalid("delta_t", "must be positive".into()));
        }
        if !(c.t_final > 0.0) {
            return Err(invalid("t_final", "must be positive".into()));
        }
        let rtol = c.relative_tolerance.unwrap_or(1e-5);
        let atol = c.absolute_tolerance.unwrap_or(1e-5);
        if !(rtol > 0.0) {
            return Err(invalid("Relative_tolerance", "must be positive".into()));
        }
        if !(atol > 0.0) {
            return Err(invalid("Absolute_tolerance", "must be positive".into()));
        }

        Ok(Self {
            degree: c.polynomial_degree as usize,
            n_cells: c.grid_size as usize,
            n_vars: c.number_of_channels as usize,
            x_min: c.lower_boundary,
            x_max: c.upper_boundary,
            lower_kind,
            upper_kind,
            initial_condition: c.initial_condition,
            diffusion_case: c.diffusion_case,
            reaction_case: c.reaction_case,
            delta_t: c.delta_t,
            t_final: c.t_final,
            rtol,
            atol,
        })
    }

    /// Build the system solver and initial profile from the registries.
    ///
    /// Boundary data is homogeneous (g_D = g_N = 0); stabilization is
    /// τ ≡ 1 and there is no convection or forcing, matching the default
    /// run setup of the solver this configuration format comes from.
    pub fn build(&self) -> Result<(SystemSolver, InitialProfile), ConfigError> {
        let diffusion = diffusion_by_name(&self.diffusion_case, self.n_vars).ok_or_else(|| {
            ConfigError::UnknownCase {
                kind: "diffusion",
                name: self.diffusion_case.clone(),
            }
        })?;
        let source =
            source_by_name(&self.reaction_case).ok_or_else(|| ConfigError::UnknownCase {
                kind: "reaction",
                name: self.reaction_case.clone(),
            })?;
        let profile = initial_profile_by_name(&self.initial_condition, self.x_min, self.x_max)
            .ok_or_else(|| ConfigError::UnknownCase {
                kind: "initial condition",
                name: self.initial_condition.clone(),
            })?;

        let grid = Grid::uniform(self.x_min, self.x_max, self.n_cells);
        let system = SystemSolver::new(
            grid,
            self.degree,
            self.n_vars,
            BoundaryConditions::homogeneous(self.lower_kind, self.upper_kind),
            Box::new(|_| 1.0),
            Box::new(|_| 0.0),
            Box::new(|_, _, _| 0.0),
            diffusion,
            source,
        )?;
        Ok((system, profile))
    }
}
