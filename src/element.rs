//! Reference finite elements on the unit segment.
//!
//! Elements are Lagrange elements of arbitrary polynomial order on the reference
//! interval `[0, 1]`, with a fixed node ordering: the two vertices first,
//! then the interior nodes from left to right. The geometry map is affine
//! (straight segments), independent of the polynomial order of the basis.

use nalgebra::{Matrix1, Point1};
use numeric_literals::replace_float_literals;

use crate::Real;

/// Finite elements whose basis functions are defined on reference coordinates.
pub trait ReferenceFiniteElement<T: Real> {
    /// Returns the number of nodes (= basis functions) in the element.
    fn num_nodes(&self) -> usize;

    /// Evaluates each basis function at the given reference coordinates.
    ///
    /// # Panics
    ///
    /// Panics if the output slice length differs from the number of nodes.
    fn populate_basis(&self, basis_values: &mut [T], reference_coords: &Point1<T>);

    /// Evaluates the reference-coordinate derivative of each basis function at the
    /// given reference coordinates.
    ///
    /// # Panics
    ///
    /// Panics if the output slice length differs from the number of nodes.
    fn populate_basis_gradients(&self, basis_gradients: &mut [T], reference_coords: &Point1<T>);
}

/// Finite elements that additionally carry a geometry map from reference to
/// physical coordinates.
pub trait FiniteElement<T: Real>: ReferenceFiniteElement<T> {
    /// Maps reference coordinates to physical coordinates in the element.
    fn map_reference_coords(&self, reference_coords: &Point1<T>) -> Point1<T>;

    /// The Jacobian of the reference-to-physical map at the given reference coordinates.
    fn reference_jacobian(&self, reference_coords: &Point1<T>) -> Matrix1<T>;

    /// The diameter of the element, i.e. the largest distance between any two
    /// points in the element.
    fn diameter(&self) -> T;
}

/// The adjugate (cofactor transpose) of a 1x1 Jacobian.
///
/// Physical gradients are recovered as `adj(J)^T grad_ref / det(J)`; keeping the
/// adjugate separate from the determinant lets integrators fold the division into
/// the quadrature weight instead of dividing each gradient.
pub fn adjugate<T: Real>(_jacobian: &Matrix1<T>) -> Matrix1<T> {
    Matrix1::new(T::one())
}

/// An arbitrary-order Lagrange element on a (physical) segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentElement<T: Real> {
    vertices: [Point1<T>; 2],
    reference_nodes: Vec<T>,
}

/// Reference node coordinates for a Lagrange segment of the given order:
/// the vertices `0` and `1` first, then equispaced interior nodes. Order `0`
/// is the constant element with a single node at the midpoint.
#[replace_float_literals(T::from_f64(literal).unwrap())]
pub fn lagrange_reference_nodes<T: Real>(order: usize) -> Vec<T> {
    if order == 0 {
        return vec![0.5];
    }
    let p = T::from_usize(order).unwrap();
    let mut nodes = Vec::with_capacity(order + 1);
    nodes.push(0.0);
    nodes.push(1.0);
    for i in 1..order {
        nodes.push(T::from_usize(i).unwrap() / p);
    }
    nodes
}

impl<T: Real> SegmentElement<T> {
    /// Creates the Lagrange element of the given order on the segment between
    /// the two vertices.
    pub fn new(vertices: [Point1<T>; 2], order: usize) -> Self {
        Self {
            vertices,
            reference_nodes: lagrange_reference_nodes(order),
        }
    }

    pub fn from_interval(interval: [T; 2], order: usize) -> Self {
        Self::new([Point1::new(interval[0]), Point1::new(interval[1])], order)
    }

    pub fn vertices(&self) -> &[Point1<T>; 2] {
        &self.vertices
    }

    /// The polynomial order of the element's basis.
    pub fn order(&self) -> usize {
        self.reference_nodes.len() - 1
    }

    /// Reference coordinates of the element's nodes, in local node order.
    pub fn reference_nodes(&self) -> &[T] {
        &self.reference_nodes
    }

    /// Evaluates the basis functions at a *physical* point, by pulling it back
    /// through the (affine) geometry map. Used by point-source assembly, which
    /// evaluates shape functions at a single physical location instead of
    /// looping over quadrature points.
    pub fn populate_physical_basis(&self, basis_values: &mut [T], x: &Point1<T>) {
        let a = self.vertices[0][0];
        let b = self.vertices[1][0];
        let xi = Point1::new((x[0] - a) / (b - a));
        self.populate_basis(basis_values, &xi);
    }

    /// Returns true if the physical point lies within the element (inclusive).
    pub fn contains_physical(&self, x: &Point1<T>) -> bool {
        let a = self.vertices[0][0];
        let b = self.vertices[1][0];
        x[0] >= a && x[0] <= b
    }
}

impl<T: Real> ReferenceFiniteElement<T> for SegmentElement<T> {
    fn num_nodes(&self) -> usize {
        self.reference_nodes.len()
    }

    fn populate_basis(&self, basis_values: &mut [T], reference_coords: &Point1<T>) {
        let nodes = &self.reference_nodes;
        assert_eq!(basis_values.len(), nodes.len(), "Basis output length mismatch");
        let x = reference_coords[0];

        for (i, phi) in basis_values.iter_mut().enumerate() {
            let xi = nodes[i];
            let mut value = T::one();
            for (j, &xj) in nodes.iter().enumerate() {
                if j != i {
                    value *= (x - xj) / (xi - xj);
                }
            }
            *phi = value;
        }
    }

    fn populate_basis_gradients(&self, basis_gradients: &mut [T], reference_coords: &Point1<T>) {
        let nodes = &self.reference_nodes;
        assert_eq!(basis_gradients.len(), nodes.len(), "Gradient output length mismatch");
        let x = reference_coords[0];

        // d/dx prod_{j != i} (x - x_j)/(x_i - x_j)
        //   = sum_{k != i} 1/(x_i - x_k) prod_{j != i, k} (x - x_j)/(x_i - x_j)
        for (i, dphi) in basis_gradients.iter_mut().enumerate() {
            let xi = nodes[i];
            let mut derivative = T::zero();
            for (k, &xk) in nodes.iter().enumerate() {
                if k == i {
                    continue;
                }
                let mut term = T::one() / (xi - xk);
                for (j, &xj) in nodes.iter().enumerate() {
                    if j != i && j != k {
                        term *= (x - xj) / (xi - xj);
                    }
                }
                derivative += term;
            }
            *dphi = derivative;
        }
    }
}

impl<T: Real> FiniteElement<T> for SegmentElement<T> {
    fn map_reference_coords(&self, reference_coords: &Point1<T>) -> Point1<T> {
        let a = self.vertices[0][0];
        let b = self.vertices[1][0];
        Point1::new(a + (b - a) * reference_coords[0])
    }

    fn reference_jacobian(&self, _reference_coords: &Point1<T>) -> Matrix1<T> {
        Matrix1::new(self.vertices[1][0] - self.vertices[0][0])
    }

    fn diameter(&self) -> T {
        (self.vertices[1][0] - self.vertices[0][0]).abs()
    }
}
