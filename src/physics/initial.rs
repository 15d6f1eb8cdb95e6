//! Initial-condition library.
//!
//! Profiles are parameterized by the domain [a, b] through the normalized
//! coordinate ξ = (x - a)/(b - a) so the named cases work on any interval.
//! Each profile supplies u₀ and its analytic derivative q₀ = u₀′; the
//! initial flux σ₀ = -κ(x, q₀, u₀) is closed through the active diffusion
//! provider by the system initializer.

use std::f64::consts::PI;

type ProfileFn = Box<dyn Fn(usize, f64) -> f64 + Send + Sync>;

/// Initial u₀ and q₀ = u₀′ per variable.
pub struct InitialProfile {
    value: ProfileFn,
    slope: ProfileFn,
}

impl InitialProfile {
    /// Create from value and slope closures (var, x) → ℝ.
    pub fn new(
        value: impl Fn(usize, f64) -> f64 + Send + Sync + 'static,
        slope: impl Fn(usize, f64) -> f64 + Send + Sync + 'static,
    ) -> Self {
        Self {
            value: Box::new(value),
            slope: Box::new(slope),
        }
    }

    /// u₀ of one variable.
    pub fn value(&self, var: usize, x: f64) -> f64 {
        (self.value)(var, x)
    }

    /// q₀ = u₀′ of one variable.
    pub fn slope(&self, var: usize, x: f64) -> f64 {
        (self.slope)(var, x)
    }
}

/// Look up a named initial condition on [x_min, x_max].
///
/// Recognized names: `sine`, `cosine`, `gaussian`, `bump_primary`, `step`,
/// `zero`. Returns None for unknown names.
pub fn initial_profile_by_name(name: &str, x_min: f64, x_max: f64) -> Option<InitialProfile> {
    let len = x_max - x_min;
    let xi = move |x: f64| (x - x_min) / len;

    match name {
        "sine" => Some(InitialProfile::new(
            move |_, x| (PI * xi(x)).sin(),
            move |_, x| PI / len * (PI * xi(x)).cos(),
        )),
        "cosine" => Some(InitialProfile::new(
            move |_, x| 1.0 + (2.0 * PI * xi(x)).cos(),
            move |_, x| -2.0 * PI / len * (2.0 * PI * xi(x)).sin(),
        )),
        "gaussian" => Some(InitialProfile::new(
            move |_, x| gaussian(xi(x)),
            move |_, x| gaussian_slope(xi(x)) / len,
        )),
        "bump_primary" => Some(InitialProfile::new(
            move |var, x| if var == 0 { gaussian(xi(x)) } else { 0.0 },
            move |var, x| if var == 0 { gaussian_slope(xi(x)) / len } else { 0.0 },
        )),
        "step" => Some(InitialProfile::new(
            move |_, x| step(xi(x)),
            move |_, x| step_slope(xi(x)) / len,
        )),
        "zero" => Some(InitialProfile::new(|_, _| 0.0, |_, _| 0.0)),
        _ => None,
    }
}

const GAUSS_CENTRE: f64 = 0.3;
const GAUSS_WIDTH: f64 = 0.08;
const STEP_WIDTH: f64 = 0.05;

fn gaussian(xi: f64) -> f64 {
    let z = (xi - GAUSS_CENTRE) / GAUSS_WIDTH;
    (-0.5 * z * z).exp()
}

fn gaussian_slope(xi: f64) -> f64 {
    let z = (xi - GAUSS_CENTRE) / GAUSS_WIDTH;
    -z / GAUSS_WIDTH * (-0.5 * z * z).exp()
}

fn step(xi: f64) -> f64 {
    0.5 * (1.0 + ((xi - 0.5) / STEP_WIDTH).tanh())
}

fn step_slope(xi: f64) -> f64 {
    let t = ((xi - 0.5) / STEP_WIDTH).tanh();
    0.5 * (1.0 - t * t) / STEP_WIDTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slopes_match_finite_differences() {
        let eps = 1e-6;
        for name in ["sine", "cosine", "gaussian", "bump_primary", "step", "zero"] {
            let profile = initial_profile_by_name(name, -1.0, 3.0).unwrap();
            for var in 0..2 {
                for &x in &[-0.5, 0.0, 0.7, 1.3, 2.4] {
                    let fd =
                        (profile.value(var, x + eps) - profile.value(var, x - eps)) / (2.0 * eps);
                    assert!(
                        (fd - profile.slope(var, x)).abs() < 1e-6,
                        "{}: slope mismatch at x = {} (var {})",
                        name,
                        x,
                        var
                    );
                }
            }
        }
    }

    #[test]
    fn sine_respects_domain_scaling() {
        let profile = initial_profile_by_name("sine", 2.0, 4.0).unwrap();
        assert!(profile.value(0, 2.0).abs() < 1e-14);
        assert!((profile.value(0, 3.0) - 1.0).abs() < 1e-14);
        assert!(profile.value(0, 4.0).abs() < 1e-12);
    }

    #[test]
    fn bump_primary_only_populates_channel_zero() {
        let profile = initial_profile_by_name("bump_primary", 0.0, 1.0).unwrap();
        assert!(profile.value(0, 0.3) > 0.9);
        assert!(profile.value(1, 0.3).abs() < 1e-15);
        assert!(profile.slope(1, 0.3).abs() < 1e-15);
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!(initial_profile_by_name("vortex", 0.0, 1.0).is_none());
    }
}
