//! A posteriori comparison of discrete solutions against reference functions.

use itertools::izip;
use nalgebra::DVector;

use crate::coefficient::Coefficient;
use crate::element::{FiniteElement, ReferenceFiniteElement};
use crate::function::gather_global_to_local;
use crate::quadrature::{policy, segment_rule};
use crate::space::FiniteElementSpace;
use crate::Real;

/// Estimates the `L^2` error `|u_h - u|` by element-wise quadrature.
pub fn estimate_l2_error<T, S, C>(space: &S, u_h: &DVector<T>, u: &C) -> T
where
    T: Real,
    S: FiniteElementSpace<T>,
    C: Coefficient<T>,
{
    accumulate_error(space, u_h, u, |acc, w, diff| acc + w * diff * diff).sqrt()
}

/// Estimates the `L^1` error `|u_h - u|` by element-wise quadrature.
pub fn estimate_l1_error<T, S, C>(space: &S, u_h: &DVector<T>, u: &C) -> T
where
    T: Real,
    S: FiniteElementSpace<T>,
    C: Coefficient<T>,
{
    accumulate_error(space, u_h, u, |acc, w, diff| acc + w * diff.abs())
}

/// Estimates the `L^inf` error as the largest deviation over all quadrature
/// points. This samples the same points as the integral norms, so it is a lower
/// bound on the true maximum.
pub fn estimate_max_error<T, S, C>(space: &S, u_h: &DVector<T>, u: &C) -> T
where
    T: Real,
    S: FiniteElementSpace<T>,
    C: Coefficient<T>,
{
    accumulate_error(space, u_h, u, |acc, _w, diff| acc.max(diff.abs()))
}

fn accumulate_error<T, S, C, F>(space: &S, u_h: &DVector<T>, u: &C, mut combine: F) -> T
where
    T: Real,
    S: FiniteElementSpace<T>,
    C: Coefficient<T>,
    F: FnMut(T, T, T) -> T,
{
    let (weights, points) = segment_rule::<T>(policy::error_norm(space.order()));
    let mut accumulator = T::zero();
    let mut basis = Vec::new();
    let mut local = Vec::new();
    let mut dofs = Vec::new();

    for index in 0..space.num_elements() {
        let element = space.element(index);
        let n = element.num_nodes();
        basis.resize(n, T::zero());
        local.resize(n, T::zero());
        dofs.resize(n, 0);
        gather_global_to_local(space, u_h, &mut local, &mut dofs, index);

        for (w, xi) in izip!(&weights, &points) {
            element.populate_basis(&mut basis, xi);
            let value = izip!(&basis, &local).fold(T::zero(), |acc, (phi, u_i)| acc + *phi * *u_i);
            let x = element.map_reference_coords(xi);
            let det = element.reference_jacobian(xi).determinant();
            let diff = value - u.evaluate(&x);
            accumulator = combine(accumulator, *w * det, diff);
        }
    }
    accumulator
}
