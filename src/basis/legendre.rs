//! Legendre polynomial evaluation on the reference interval [-1, 1].
//!
//! Legendre polynomials satisfy ∫_{-1}^{1} P_m P_n dx = 2/(2n+1) δ_{mn};
//! the cell bases in this crate rescale them to be orthonormal on a
//! physical interval.

/// Evaluate P_n(r) by the three-term recurrence
///
/// (n+1) P_{n+1}(r) = (2n+1) r P_n(r) - n P_{n-1}(r)
pub fn legendre(n: usize, r: f64) -> f64 {
    let mut p_prev = 1.0;
    if n == 0 {
        return p_prev;
    }
    let mut p_curr = r;
    for m in 1..n {
        let p_next = ((2 * m + 1) as f64 * r * p_curr - m as f64 * p_prev) / (m + 1) as f64;
        p_prev = p_curr;
        p_curr = p_next;
    }
    p_curr
}

/// Evaluate P'_n(r).
///
/// Away from the endpoints this uses
/// P'_n(r) = n (r P_n - P_{n-1}) / (r² - 1); at r = ±1 the limit
/// P'_n(±1) = (±1)^{n+1} n(n+1)/2 applies.
pub fn legendre_prime(n: usize, r: f64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    if (r - 1.0).abs() < 1e-14 {
        return (n * (n + 1)) as f64 / 2.0;
    }
    if (r + 1.0).abs() < 1e-14 {
        let sign = if n % 2 == 0 { -1.0 } else { 1.0 };
        return sign * (n * (n + 1)) as f64 / 2.0;
    }
    n as f64 * (r * legendre(n, r) - legendre(n - 1, r)) / (r * r - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_degree_values() {
        let r = 0.4;
        assert!((legendre(0, r) - 1.0).abs() < 1e-14);
        assert!((legendre(1, r) - r).abs() < 1e-14);
        assert!((legendre(2, r) - (3.0 * r * r - 1.0) / 2.0).abs() < 1e-14);
        assert!((legendre(3, r) - (5.0 * r.powi(3) - 3.0 * r) / 2.0).abs() < 1e-14);
    }

    #[test]
    fn endpoint_values() {
        for n in 0..=6 {
            assert!((legendre(n, 1.0) - 1.0).abs() < 1e-14);
            let expected = if n % 2 == 0 { 1.0 } else { -1.0 };
            assert!((legendre(n, -1.0) - expected).abs() < 1e-14);
        }
    }

    #[test]
    fn derivative_values() {
        let r = -0.3;
        assert!(legendre_prime(0, r).abs() < 1e-14);
        assert!((legendre_prime(1, r) - 1.0).abs() < 1e-14);
        assert!((legendre_prime(2, r) - 3.0 * r).abs() < 1e-14);
        assert!((legendre_prime(3, r) - (15.0 * r * r - 3.0) / 2.0).abs() < 1e-14);
    }

    #[test]
    fn derivative_endpoints() {
        for n in 0..=5 {
            let expected = (n * (n + 1)) as f64 / 2.0;
            assert!((legendre_prime(n, 1.0) - expected).abs() < 1e-12);
            let sign = if n % 2 == 0 { -1.0 } else { 1.0 };
            assert!((legendre_prime(n, -1.0) - sign * expected).abs() < 1e-12);
        }
    }

    #[test]
    fn recurrence_matches_direct_evaluation() {
        // P_4(x) = (35x^4 - 30x^2 + 3)/8
        for &r in &[-0.9f64, -0.35, 0.0, 0.5, 1.0] {
            let expected = (35.0 * r.powi(4) - 30.0 * r * r + 3.0) / 8.0;
            assert!((legendre(4, r) - expected).abs() < 1e-13);
        }
    }
}
