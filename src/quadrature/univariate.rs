//! Gauss quadrature rules for the one-dimensional domain `[-1, 1]`.

use std::f64::consts::PI;

/// Evaluates the Legendre polynomial `P_n` and its derivative at `x` with the
/// three-term recurrence `m P_m = (2m - 1) x P_{m-1} - (m - 1) P_{m-2}`.
///
/// The derivative formula divides by `x^2 - 1`, so the evaluation is only
/// valid in the open interval `(-1, 1)`.
fn legendre_value_and_derivative(n: usize, x: f64) -> (f64, f64) {
    let mut current = 1.0;
    let mut previous = 0.0;
    for m in 1..=n {
        let m = m as f64;
        let next = ((2.0 * m - 1.0) * x * current - (m - 1.0) * previous) / m;
        previous = current;
        current = next;
    }
    let derivative = n as f64 * (x * current - previous) / (x * x - 1.0);
    (current, derivative)
}

/// Gauss quadrature for the reference interval `[-1, 1]`.
///
/// Returns the Gauss-Legendre rule with the given number of points. Given `n`
/// points, the rule integrates polynomials of degree up to `2 n - 1` exactly.
/// Points and weights are deterministic for a given `n`.
///
/// # Panics
///
/// Panics if zero points are requested.
pub fn gauss(num_points: usize) -> (Vec<f64>, Vec<f64>) {
    let n = num_points;
    assert!(n > 0, "number of points must be positive");

    let mut points = vec![0.0; n];
    let mut weights = vec![0.0; n];

    // Roots come in +- pairs, so only the first half needs Newton iteration.
    // The cosine expression is an accurate enough starting guess that a few
    // steps reach machine precision.
    for i in 0..(n + 1) / 2 {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        loop {
            let (p, dp) = legendre_value_and_derivative(n, x);
            let dx = -p / dp;
            x += dx;
            if dx.abs() <= 1e-15 {
                break;
            }
        }

        // With the root pinned down, the weight follows in closed form
        let (_, dp) = legendre_value_and_derivative(n, x);
        let w = 2.0 / ((1.0 - x * x) * dp * dp);
        points[i] = -x;
        points[n - 1 - i] = x;
        weights[i] = w;
        weights[n - 1 - i] = w;
    }

    (weights, points)
}
