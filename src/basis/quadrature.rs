//! Gauss–Legendre quadrature on [-1, 1].
//!
//! The n-point rule uses the roots of P_n and is exact for polynomials up
//! to degree 2n-1. Cell products of nonlinear provider functions against
//! basis modes use rules with at least 2k+1 points so that the quadrature
//! error never limits the discretization order.

use super::legendre::{legendre, legendre_prime};

/// Gauss–Legendre nodes and weights on the reference interval.
#[derive(Clone, Debug)]
pub struct GaussRule {
    /// Nodes in (-1, 1), ascending
    pub nodes: Vec<f64>,
    /// Weights, positive, summing to 2
    pub weights: Vec<f64>,
}

impl GaussRule {
    /// Build the n-point rule.
    ///
    /// Roots of P_n are found by Newton iteration from the Chebyshev
    /// estimate r_i = -cos(π (i + 3/4) / (n + 1/2)); the weights are
    /// w_i = 2 / ((1 - r_i²) [P'_n(r_i)]²).
    pub fn new(n_points: usize) -> Self {
        assert!(n_points > 0, "quadrature rule needs at least one point");

        let n = n_points;
        let mut nodes = Vec::with_capacity(n);
        let mut weights = Vec::with_capacity(n);

        for i in 0..n {
            let mut r =
                -(std::f64::consts::PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();

            for _ in 0..100 {
                let p = legendre(n, r);
                let dp = legendre_prime(n, r);
                let update = p / dp;
                r -= update;
                if update.abs() < 1e-15 {
                    break;
                }
            }

            let dp = legendre_prime(n, r);
            nodes.push(r);
            weights.push(2.0 / ((1.0 - r * r) * dp * dp));
        }

        Self { nodes, weights }
    }

    /// Number of quadrature points.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the rule has no points (never holds for constructed rules).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Integrate f over [-1, 1].
    pub fn integrate<F: Fn(f64) -> f64>(&self, f: F) -> f64 {
        self.nodes
            .iter()
            .zip(self.weights.iter())
            .map(|(&r, &w)| w * f(r))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_low_order_rules() {
        let r1 = GaussRule::new(1);
        assert!(r1.nodes[0].abs() < 1e-14);
        assert!((r1.weights[0] - 2.0).abs() < 1e-14);

        let r2 = GaussRule::new(2);
        let x = 1.0 / 3f64.sqrt();
        assert!((r2.nodes[0] + x).abs() < 1e-14);
        assert!((r2.nodes[1] - x).abs() < 1e-14);
        assert!((r2.weights[0] - 1.0).abs() < 1e-14);
        assert!((r2.weights[1] - 1.0).abs() < 1e-14);
    }

    #[test]
    fn weights_sum_to_interval_length() {
        for n in 1..=8 {
            let rule = GaussRule::new(n);
            let sum: f64 = rule.weights.iter().sum();
            assert!((sum - 2.0).abs() < 1e-13, "n = {}: weight sum {}", n, sum);
        }
    }

    #[test]
    fn nodes_symmetric() {
        for n in 1..=8 {
            let rule = GaussRule::new(n);
            for i in 0..n / 2 {
                assert!((rule.nodes[i] + rule.nodes[n - 1 - i]).abs() < 1e-13);
                assert!((rule.weights[i] - rule.weights[n - 1 - i]).abs() < 1e-13);
            }
        }
    }

    #[test]
    fn exact_for_polynomials() {
        // n points integrate x^m exactly for m <= 2n - 1
        for n in 1..=6 {
            let rule = GaussRule::new(n);
            for m in 0..=(2 * n - 1) {
                let exact = if m % 2 == 0 { 2.0 / (m + 1) as f64 } else { 0.0 };
                let approx = rule.integrate(|r| r.powi(m as i32));
                assert!(
                    (approx - exact).abs() < 1e-12,
                    "n = {}, degree {}: got {}, want {}",
                    n,
                    m,
                    approx,
                    exact
                );
            }
        }
    }

    #[test]
    fn smooth_integrand() {
        // ∫_{-1}^{1} e^r dr = e - 1/e
        let rule = GaussRule::new(8);
        let exact = 1f64.exp() - (-1f64).exp();
        assert!((rule.integrate(f64::exp) - exact).abs() < 1e-12);
    }
}
