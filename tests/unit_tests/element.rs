use nalgebra::Point1;
use proptest::prelude::*;

use varfem::element::{FiniteElement, ReferenceFiniteElement, SegmentElement};

proptest! {
    #[test]
    fn basis_is_a_partition_of_unity(xi in 0.0..=1.0f64, order in 1usize..5) {
        let element = SegmentElement::from_interval([0.0, 1.0], order);
        let mut basis = vec![0.0; element.num_nodes()];
        element.populate_basis(&mut basis, &Point1::new(xi));
        let total: f64 = basis.iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn basis_gradients_sum_to_zero(xi in 0.0..=1.0f64, order in 1usize..5) {
        let element = SegmentElement::from_interval([0.0, 1.0], order);
        let mut gradients = vec![0.0; element.num_nodes()];
        element.populate_basis_gradients(&mut gradients, &Point1::new(xi));
        let total: f64 = gradients.iter().sum();
        prop_assert!(total.abs() < 1e-10);
    }

    #[test]
    fn geometry_map_is_monotone(a in -2.0..2.0f64, h in 0.01..3.0f64, xi in 0.0..=1.0f64) {
        let element = SegmentElement::from_interval([a, a + h], 1);
        let x = element.map_reference_coords(&Point1::new(xi));
        prop_assert!(x[0] >= a - 1e-12 && x[0] <= a + h + 1e-12);
        prop_assert!((element.reference_jacobian(&Point1::new(xi))[(0, 0)] - h).abs() < 1e-12);
    }
}

#[test]
fn basis_functions_interpolate_their_nodes() {
    for order in 1..5 {
        let element = SegmentElement::from_interval([0.0, 1.0], order);
        let nodes: Vec<f64> = element.reference_nodes().to_vec();
        let mut basis = vec![0.0; element.num_nodes()];
        for (k, node) in nodes.iter().enumerate() {
            element.populate_basis(&mut basis, &Point1::new(*node));
            for (i, phi) in basis.iter().enumerate() {
                let expected = if i == k { 1.0 } else { 0.0 };
                assert!(
                    (phi - expected).abs() < 1e-11,
                    "order {}: basis {} at node {} was {}",
                    order,
                    i,
                    k,
                    phi
                );
            }
        }
    }
}

#[test]
fn gradients_match_finite_differences() {
    let element = SegmentElement::<f64>::from_interval([0.0, 1.0], 3);
    let n = element.num_nodes();
    let xi = 0.37;
    let eps = 1e-6;

    let mut gradients = vec![0.0; n];
    let mut forward = vec![0.0; n];
    let mut backward = vec![0.0; n];
    element.populate_basis_gradients(&mut gradients, &Point1::new(xi));
    element.populate_basis(&mut forward, &Point1::new(xi + eps));
    element.populate_basis(&mut backward, &Point1::new(xi - eps));

    for i in 0..n {
        let difference = (forward[i] - backward[i]) / (2.0 * eps);
        assert!((gradients[i] - difference).abs() < 1e-7);
    }
}
