//! Grid functions: coefficient vectors interpreted through a finite element space.

use nalgebra::{DVector, Point1};

use crate::coefficient::Coefficient;
use crate::element::ReferenceFiniteElement;
use crate::space::{dof_coordinates, FiniteElementSpace};
use crate::Real;

/// Projects a coefficient onto the space by nodal interpolation: every degree of
/// freedom takes the coefficient value at its Lagrange node.
pub fn project<T, S, C>(space: &S, f: &C) -> DVector<T>
where
    T: Real,
    S: FiniteElementSpace<T>,
    C: Coefficient<T>,
{
    let coords = dof_coordinates(space);
    DVector::from_iterator(coords.len(), coords.iter().map(|x| f.evaluate(x)))
}

/// Evaluates a grid function at a reference coordinate inside the given element.
pub fn evaluate_element<T, S>(
    space: &S,
    u: &DVector<T>,
    element_index: usize,
    reference_coords: &Point1<T>,
) -> T
where
    T: Real,
    S: FiniteElementSpace<T>,
{
    let element = space.element(element_index);
    let n = element.num_nodes();
    let mut basis = vec![T::zero(); n];
    let mut dofs = vec![0; n];
    element.populate_basis(&mut basis, reference_coords);
    space.populate_element_dofs(&mut dofs, element_index);
    basis
        .iter()
        .zip(&dofs)
        .fold(T::zero(), |acc, (phi, dof)| acc + *phi * u[*dof])
}

/// Gathers the element-local coefficients of a grid function into `local`,
/// whose length must match the element's degree-of-freedom count.
pub fn gather_global_to_local<T, S>(
    space: &S,
    u: &DVector<T>,
    local: &mut [T],
    dofs: &mut [usize],
    element_index: usize,
) where
    T: Real,
    S: FiniteElementSpace<T>,
{
    space.populate_element_dofs(dofs, element_index);
    for (value, dof) in local.iter_mut().zip(dofs.iter()) {
        *value = u[*dof];
    }
}
