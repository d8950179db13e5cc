//! Finite element spaces on segment meshes.
//!
//! [`H1Space`] provides globally continuous Lagrange elements with shared vertex
//! degrees of freedom. [`DgSpace`] provides fully discontinuous elements whose
//! degrees of freedom form disjoint per-element blocks; inter-element coupling is
//! introduced only through face terms.

use nalgebra::Point1;

use crate::element::SegmentElement;
use crate::mesh::SegmentMesh;
use crate::Real;

/// A scalar finite element space: a mesh, a polynomial order and a mapping from
/// element-local basis functions to global degrees of freedom.
///
/// The local degree-of-freedom order matches the reference node order of
/// [`SegmentElement`]: the two endpoints first, then the interior nodes.
pub trait FiniteElementSpace<T: Real> {
    fn mesh(&self) -> &SegmentMesh<T>;

    fn order(&self) -> usize;

    fn num_dofs(&self) -> usize;

    fn num_elements(&self) -> usize {
        self.mesh().num_elements()
    }

    fn element_dof_count(&self, element: usize) -> usize;

    /// Writes the global indices of the element's degrees of freedom into `output`,
    /// whose length must equal `element_dof_count(element)`.
    fn populate_element_dofs(&self, output: &mut [usize], element: usize);

    /// Constructs the geometric element for the given index.
    fn element(&self, index: usize) -> SegmentElement<T>;

    /// Global indices of degrees of freedom constrained by an essential boundary
    /// condition on boundary faces whose attribute is marked.
    ///
    /// `marker[a - 1]` selects boundary attribute `a`. Discontinuous spaces have
    /// no essential degrees of freedom and return an empty set.
    fn essential_boundary_dofs(&self, marker: &[bool]) -> Vec<usize>;
}

/// A continuous Lagrange space of order `p >= 1`.
///
/// Vertex degrees of freedom come first (one per mesh vertex, shared between
/// neighboring elements), followed by `p - 1` interior degrees of freedom per
/// element.
pub struct H1Space<T: Real> {
    mesh: SegmentMesh<T>,
    order: usize,
}

impl<T: Real> H1Space<T> {
    pub fn new(mesh: SegmentMesh<T>, order: usize) -> Self {
        assert!(order >= 1, "polynomial order must be at least 1");
        Self { mesh, order }
    }

    /// Element-local indices of the interior (non-shared) degrees of freedom.
    ///
    /// Empty for `p = 1`. These are the degrees of freedom eliminated by static
    /// condensation.
    pub fn interior_local_dofs(&self) -> std::ops::Range<usize> {
        2..(self.order + 1)
    }
}

impl<T: Real> FiniteElementSpace<T> for H1Space<T> {
    fn mesh(&self) -> &SegmentMesh<T> {
        &self.mesh
    }

    fn order(&self) -> usize {
        self.order
    }

    fn num_dofs(&self) -> usize {
        self.mesh.vertices().len() + self.mesh.num_elements() * (self.order - 1)
    }

    fn element_dof_count(&self, _element: usize) -> usize {
        self.order + 1
    }

    fn populate_element_dofs(&self, output: &mut [usize], element: usize) {
        assert_eq!(output.len(), self.order + 1);
        let [a, b] = *self.mesh.connectivity()[element].vertex_indices();
        output[0] = a;
        output[1] = b;
        let interior_offset = self.mesh.vertices().len() + element * (self.order - 1);
        for (k, dof) in output[2..].iter_mut().enumerate() {
            *dof = interior_offset + k;
        }
    }

    fn element(&self, index: usize) -> SegmentElement<T> {
        let [a, b] = *self.mesh.connectivity()[index].vertex_indices();
        SegmentElement::new([self.mesh.vertices()[a], self.mesh.vertices()[b]], self.order)
    }

    fn essential_boundary_dofs(&self, marker: &[bool]) -> Vec<usize> {
        let mut dofs: Vec<_> = self
            .mesh
            .boundary_faces()
            .iter()
            .filter(|face| marker.get(face.attribute - 1).copied().unwrap_or(false))
            .map(|face| face.vertex)
            .collect();
        dofs.sort_unstable();
        dofs.dedup();
        dofs
    }
}

/// A discontinuous Lagrange space of order `p >= 0`.
///
/// Order `0` is the piecewise-constant space of finite-volume type: one degree
/// of freedom per element, coupled to its neighbors only through face terms.
pub struct DgSpace<T: Real> {
    mesh: SegmentMesh<T>,
    order: usize,
}

impl<T: Real> DgSpace<T> {
    pub fn new(mesh: SegmentMesh<T>, order: usize) -> Self {
        Self { mesh, order }
    }
}

impl<T: Real> FiniteElementSpace<T> for DgSpace<T> {
    fn mesh(&self) -> &SegmentMesh<T> {
        &self.mesh
    }

    fn order(&self) -> usize {
        self.order
    }

    fn num_dofs(&self) -> usize {
        self.mesh.num_elements() * (self.order + 1)
    }

    fn element_dof_count(&self, _element: usize) -> usize {
        self.order + 1
    }

    fn populate_element_dofs(&self, output: &mut [usize], element: usize) {
        assert_eq!(output.len(), self.order + 1);
        let offset = element * (self.order + 1);
        for (k, dof) in output.iter_mut().enumerate() {
            *dof = offset + k;
        }
    }

    fn element(&self, index: usize) -> SegmentElement<T> {
        let [a, b] = *self.mesh.connectivity()[index].vertex_indices();
        SegmentElement::new([self.mesh.vertices()[a], self.mesh.vertices()[b]], self.order)
    }

    fn essential_boundary_dofs(&self, _marker: &[bool]) -> Vec<usize> {
        Vec::new()
    }
}

/// Returns the physical coordinates of every degree of freedom in the space.
///
/// Shared degrees of freedom are written once per incident element; the values
/// agree, so the last write wins harmlessly.
pub fn dof_coordinates<T, S>(space: &S) -> Vec<Point1<T>>
where
    T: Real,
    S: FiniteElementSpace<T>,
{
    use crate::element::FiniteElement;
    let mut coords = vec![Point1::origin(); space.num_dofs()];
    let mut dofs = vec![0; space.element_dof_count(0)];
    for index in 0..space.num_elements() {
        let element = space.element(index);
        space.populate_element_dofs(&mut dofs, index);
        for (node, dof) in element.reference_nodes().iter().zip(&dofs) {
            coords[*dof] = element.map_reference_coords(&Point1::new(*node));
        }
    }
    coords
}
