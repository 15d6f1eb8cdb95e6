//! Boundary data for the two ends of the domain.

use crate::grid::BoundaryFace;

/// Per-side boundary condition kind.
///
/// Dirichlet prescribes u; Neumann prescribes σ·n + c·u.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryKind {
    /// Prescribed value g_D(x, t)
    Dirichlet,
    /// Prescribed flux g_N(x, t)
    Neumann,
}

impl BoundaryKind {
    /// Parse the configuration spelling (`Dirichlet` or `VonNeumann`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Dirichlet" => Some(Self::Dirichlet),
            "VonNeumann" => Some(Self::Neumann),
            _ => None,
        }
    }
}

/// Boundary value function (var, x, t) → ℝ.
pub type BoundaryValueFn = Box<dyn Fn(usize, f64, f64) -> f64 + Send + Sync>;

/// Boundary specification: a kind per side plus the data functions g_D
/// and g_N shared by both sides.
pub struct BoundaryConditions {
    /// Kind at x = a
    pub lower: BoundaryKind,
    /// Kind at x = b
    pub upper: BoundaryKind,
    dirichlet: BoundaryValueFn,
    neumann: BoundaryValueFn,
}

impl BoundaryConditions {
    /// Create from kinds and data functions.
    pub fn new(
        lower: BoundaryKind,
        upper: BoundaryKind,
        dirichlet: BoundaryValueFn,
        neumann: BoundaryValueFn,
    ) -> Self {
        Self { lower, upper, dirichlet, neumann }
    }

    /// Homogeneous data (g_D = g_N = 0) with the given kinds.
    pub fn homogeneous(lower: BoundaryKind, upper: BoundaryKind) -> Self {
        Self::new(
            lower,
            upper,
            Box::new(|_, _, _| 0.0),
            Box::new(|_, _, _| 0.0),
        )
    }

    /// Dirichlet data g_D(var, x, t).
    pub fn g_d(&self, var: usize, x: f64, t: f64) -> f64 {
        (self.dirichlet)(var, x, t)
    }

    /// Neumann data g_N(var, x, t).
    pub fn g_n(&self, var: usize, x: f64, t: f64) -> f64 {
        (self.neumann)(var, x, t)
    }

    /// Kind at one face.
    pub fn kind(&self, face: BoundaryFace) -> BoundaryKind {
        match face {
            BoundaryFace::Lower => self.lower,
            BoundaryFace::Upper => self.upper,
        }
    }

    /// Whether a face is Dirichlet.
    pub fn is_dirichlet(&self, face: BoundaryFace) -> bool {
        self.kind(face) == BoundaryKind::Dirichlet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_configuration_spellings() {
        assert_eq!(BoundaryKind::parse("Dirichlet"), Some(BoundaryKind::Dirichlet));
        assert_eq!(BoundaryKind::parse("VonNeumann"), Some(BoundaryKind::Neumann));
        assert_eq!(BoundaryKind::parse("Robin"), None);
        assert_eq!(BoundaryKind::parse("dirichlet"), None);
    }

    #[test]
    fn homogeneous_data_is_zero() {
        let bcs = BoundaryConditions::homogeneous(BoundaryKind::Dirichlet, BoundaryKind::Neumann);
        assert_eq!(bcs.g_d(0, 0.0, 1.0), 0.0);
        assert_eq!(bcs.g_n(1, 1.0, 2.0), 0.0);
        assert!(bcs.is_dirichlet(BoundaryFace::Lower));
        assert!(!bcs.is_dirichlet(BoundaryFace::Upper));
    }

    #[test]
    fn custom_data_dispatches_on_var() {
        let bcs = BoundaryConditions::new(
            BoundaryKind::Dirichlet,
            BoundaryKind::Dirichlet,
            Box::new(|var, x, t| var as f64 + x + t),
            Box::new(|_, _, _| 0.0),
        );
        assert_eq!(bcs.g_d(2, 1.0, 0.5), 3.5);
    }
}
