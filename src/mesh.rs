//! Segment meshes.
//!
//! A [`SegmentMesh`] is an ordered sequence of oriented segment elements together
//! with the faces (vertices, in one dimension) shared between them. Interior faces
//! reference exactly two elements; boundary faces reference one element and carry
//! an attribute tag used for boundary-condition classification.

use nalgebra::Point1;
use serde::{Deserialize, Serialize};

use crate::Real;

/// Connectivity of a single segment element: the indices of its two vertices,
/// oriented so that the first vertex has the smaller coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentConnectivity(pub [usize; 2]);

impl SegmentConnectivity {
    pub fn vertex_indices(&self) -> &[usize; 2] {
        &self.0
    }
}

/// An interior face: a vertex shared by exactly two elements.
///
/// The face sits at reference coordinate 1 of `elem1` and reference coordinate 0
/// of `elem2`, so the signed reference normal `2 x - 1` evaluated on the `elem1`
/// side points from `elem1` into `elem2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteriorFace {
    pub vertex: usize,
    pub elem1: usize,
    pub elem2: usize,
}

/// A boundary face: a vertex referenced by exactly one element, with an attribute tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryFace {
    pub vertex: usize,
    pub element: usize,
    pub attribute: usize,
}

/// A one-dimensional mesh of oriented segment elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct SegmentMesh<T: Real> {
    vertices: Vec<Point1<T>>,
    connectivity: Vec<SegmentConnectivity>,
    interior_faces: Vec<InteriorFace>,
    boundary_faces: Vec<BoundaryFace>,
}

impl<T: Real> SegmentMesh<T> {
    /// Creates a mesh from vertices and element connectivity.
    ///
    /// Boundary attributes are assigned from the supplied `(vertex, attribute)`
    /// pairs; boundary vertices without an entry get attribute 1.
    ///
    /// # Panics
    ///
    /// Panics if an element has non-positive length, or if a vertex is referenced
    /// by more than two elements (not a valid 1D topology).
    pub fn from_vertices_and_connectivity(
        vertices: Vec<Point1<T>>,
        connectivity: Vec<SegmentConnectivity>,
        boundary_attributes: &[(usize, usize)],
    ) -> Self {
        for (index, conn) in connectivity.iter().enumerate() {
            let [a, b] = *conn.vertex_indices();
            assert!(
                vertices[b][0] > vertices[a][0],
                "element {} is degenerate or inverted",
                index
            );
        }

        // For every vertex, record the element that has it as its right end
        // (the face sits at reference coordinate 1 there) and as its left end.
        let mut right_end_of = vec![None; vertices.len()];
        let mut left_end_of = vec![None; vertices.len()];
        for (index, conn) in connectivity.iter().enumerate() {
            let [a, b] = *conn.vertex_indices();
            assert!(left_end_of[a].is_none(), "vertex {} referenced by more than two elements", a);
            assert!(right_end_of[b].is_none(), "vertex {} referenced by more than two elements", b);
            left_end_of[a] = Some(index);
            right_end_of[b] = Some(index);
        }

        let mut interior_faces = Vec::new();
        let mut boundary_faces = Vec::new();
        for vertex in 0..vertices.len() {
            match (right_end_of[vertex], left_end_of[vertex]) {
                (Some(elem1), Some(elem2)) => {
                    interior_faces.push(InteriorFace { vertex, elem1, elem2 });
                }
                (Some(element), None) | (None, Some(element)) => {
                    let attribute = boundary_attributes
                        .iter()
                        .find(|(v, _)| *v == vertex)
                        .map(|(_, a)| *a)
                        .unwrap_or(1);
                    boundary_faces.push(BoundaryFace { vertex, element, attribute });
                }
                (None, None) => {}
            }
        }

        Self {
            vertices,
            connectivity,
            interior_faces,
            boundary_faces,
        }
    }

    /// Creates a uniform mesh of `num_elements` segments on `[0, 1]`,
    /// with boundary attribute 1 on the left end and 2 on the right end.
    pub fn uniform(num_elements: usize) -> Self {
        Self::uniform_on_interval(T::zero(), T::one(), num_elements)
    }

    /// Creates a uniform mesh of `num_elements` segments on `[a, b]`.
    pub fn uniform_on_interval(a: T, b: T, num_elements: usize) -> Self {
        assert!(num_elements > 0, "mesh must have at least one element");
        let n = T::from_usize(num_elements).unwrap();
        let h = (b - a) / n;
        let vertices = (0..=num_elements)
            .map(|i| Point1::new(a + h * T::from_usize(i).unwrap()))
            .collect();
        let connectivity = (0..num_elements).map(|i| SegmentConnectivity([i, i + 1])).collect();
        let boundary_attributes = [(0, 1), (num_elements, 2)];
        Self::from_vertices_and_connectivity(vertices, connectivity, &boundary_attributes)
    }

    pub fn vertices(&self) -> &[Point1<T>] {
        &self.vertices
    }

    pub fn connectivity(&self) -> &[SegmentConnectivity] {
        &self.connectivity
    }

    pub fn num_elements(&self) -> usize {
        self.connectivity.len()
    }

    pub fn interior_faces(&self) -> &[InteriorFace] {
        &self.interior_faces
    }

    pub fn boundary_faces(&self) -> &[BoundaryFace] {
        &self.boundary_faces
    }

    /// The largest boundary attribute present in the mesh, or 0 if there is no boundary.
    pub fn max_boundary_attribute(&self) -> usize {
        self.boundary_faces.iter().map(|f| f.attribute).max().unwrap_or(0)
    }

    /// The element-local reference coordinate (0 or 1) of the given vertex in the
    /// given element.
    ///
    /// # Panics
    ///
    /// Panics if the vertex is not an endpoint of the element.
    pub fn local_face_coordinate(&self, element: usize, vertex: usize) -> T {
        let [a, b] = *self.connectivity[element].vertex_indices();
        if vertex == a {
            T::zero()
        } else if vertex == b {
            T::one()
        } else {
            panic!("vertex {} is not an endpoint of element {}", vertex, element);
        }
    }

    /// Bisects every element, doubling the element count. Boundary attributes are
    /// preserved (boundary vertices keep their indices).
    pub fn refine_uniformly(&mut self) {
        let half = T::from_f64(0.5).unwrap();
        let mut vertices = self.vertices.clone();
        let mut connectivity = Vec::with_capacity(2 * self.connectivity.len());
        for conn in &self.connectivity {
            let [a, b] = *conn.vertex_indices();
            let midpoint = Point1::new((vertices[a][0] + vertices[b][0]) * half);
            let m = vertices.len();
            vertices.push(midpoint);
            connectivity.push(SegmentConnectivity([a, m]));
            connectivity.push(SegmentConnectivity([m, b]));
        }

        let boundary_attributes: Vec<_> = self
            .boundary_faces
            .iter()
            .map(|face| (face.vertex, face.attribute))
            .collect();
        *self = Self::from_vertices_and_connectivity(vertices, connectivity, &boundary_attributes);
    }
}
