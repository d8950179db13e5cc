use varfem::quadrature::{policy, segment_rule, Quadrature};

/// Integrates x^k over [0, 1] with the rule of the given degree.
fn integrate_monomial(degree: usize, k: u32) -> f64 {
    let rule = segment_rule::<f64>(degree);
    rule.integrate(|x| x[0].powi(k as i32))
}

#[test]
fn segment_rules_integrate_polynomials_exactly_up_to_their_degree() {
    for degree in 0..12 {
        for k in 0..=degree {
            let value = integrate_monomial(degree, k as u32);
            let exact = 1.0 / (k as f64 + 1.0);
            assert!(
                (value - exact).abs() < 1e-13,
                "degree {} rule failed on x^{}: {} vs {}",
                degree,
                k,
                value,
                exact
            );
        }
    }
}

#[test]
fn segment_rule_weights_are_positive_and_sum_to_one() {
    for degree in 0..16 {
        let (weights, points) = segment_rule::<f64>(degree);
        assert_eq!(weights.len(), points.len());
        let total: f64 = weights.iter().sum();
        assert!((total - 1.0).abs() < 1e-13);
        for (w, x) in weights.iter().zip(&points) {
            assert!(*w > 0.0);
            assert!(x[0] > 0.0 && x[0] < 1.0);
        }
    }
}

#[test]
fn rule_size_grows_with_requested_degree() {
    let low = segment_rule::<f64>(2).0.len();
    let high = segment_rule::<f64>(10).0.len();
    assert!(high > low);
}

#[test]
fn integrator_policies_match_integrand_degrees() {
    // For order p: products of two shape values have degree 2p, products of
    // two gradients 2(p - 1).
    assert_eq!(policy::mass(3), 6);
    assert_eq!(policy::diffusion(3), 4);
    assert_eq!(policy::diffusion(1), 0);
    assert_eq!(policy::diffusion(0), 0);
    assert_eq!(policy::advection(2), 4);
    assert_eq!(policy::source(2), 4);
    assert_eq!(policy::error_norm(2), 7);
}
