//! Element-local and face-local integrators.

use eyre::eyre;
use nalgebra::{DMatrix, DMatrixViewMut, DVectorViewMut, Matrix1, Point1};

use crate::element::{FiniteElement, SegmentElement};
use crate::quadrature::QuadraturePair;
use crate::workspace::with_thread_local_workspace;
use crate::{define_thread_local_workspace, Real};

mod advection;
mod diffusion;
mod mass;
mod source;
mod upwind;

pub use advection::AdvectionIntegrator;
pub use diffusion::DiffusionIntegrator;
pub use mass::MassIntegrator;
pub use source::SourceIntegrator;
pub use upwind::{InflowBoundaryIntegrator, UpwindFaceIntegrator};

/// Computes an element contribution to the matrix of a bilinear form.
pub trait ElementMatrixIntegrator<T: Real> {
    /// The quadrature rule used on the given element.
    fn quadrature(&self, element: &SegmentElement<T>) -> QuadraturePair<T>;

    /// Assembles the element matrix into `output`, a square matrix whose
    /// dimension equals the element's node count. `output` is overwritten.
    fn assemble_element_matrix_into(
        &self,
        element_index: usize,
        element: &SegmentElement<T>,
        quadrature: &QuadraturePair<T>,
        output: DMatrixViewMut<T>,
    ) -> eyre::Result<()>;
}

/// Computes an element contribution to the vector of a linear form.
pub trait ElementVectorIntegrator<T: Real> {
    fn quadrature(&self, element: &SegmentElement<T>) -> QuadraturePair<T>;

    /// Assembles the element vector into `output`, whose length equals the
    /// element's node count. `output` is overwritten.
    fn assemble_element_vector_into(
        &self,
        element_index: usize,
        element: &SegmentElement<T>,
        quadrature: &QuadraturePair<T>,
        output: DVectorViewMut<T>,
    ) -> eyre::Result<()>;
}

/// The geometric context of a face shared by one or two elements.
///
/// In one dimension a face is a single point, so face integrals reduce to a
/// single evaluation with unit weight. The face sits at reference coordinate
/// `xi1` of `element1`; for interior faces it also sits at `xi2` of `element2`,
/// and `normal` is the unit normal pointing out of `element1`.
pub struct FaceContext<'a, T: Real> {
    pub element1: &'a SegmentElement<T>,
    pub element2: Option<&'a SegmentElement<T>>,
    pub xi1: T,
    pub xi2: Option<T>,
    pub normal: T,
}

impl<'a, T: Real> FaceContext<'a, T> {
    /// The physical location of the face.
    pub fn physical_point(&self) -> Point1<T> {
        self.element1.map_reference_coords(&Point1::new(self.xi1))
    }

    /// The total number of test functions across both sides of the face.
    pub fn num_nodes(&self) -> usize {
        use crate::element::ReferenceFiniteElement;
        self.element1.num_nodes() + self.element2.map(|e| e.num_nodes()).unwrap_or(0)
    }
}

/// Computes the face coupling blocks of a bilinear form.
///
/// The output matrix has dimension `n1 + n2` (or `n1` on boundary faces), with
/// the degrees of freedom of `element1` ordered first.
pub trait FaceMatrixIntegrator<T: Real> {
    fn assemble_face_matrix_into(
        &self,
        context: &FaceContext<T>,
        output: DMatrixViewMut<T>,
    ) -> eyre::Result<()>;
}

/// Computes a face contribution to the vector of a linear form.
pub trait FaceVectorIntegrator<T: Real> {
    fn assemble_face_vector_into(
        &self,
        context: &FaceContext<T>,
        output: DVectorViewMut<T>,
    ) -> eyre::Result<()>;
}

/// Wraps an integrator so that it assembles the transpose of the wrapped
/// integrator's matrix. Applies to both element and face matrices.
pub struct Transposed<I>(pub I);

struct TransposeBuffer<T: Real> {
    matrix: DMatrix<T>,
}

impl<T: Real> Default for TransposeBuffer<T> {
    fn default() -> Self {
        Self {
            matrix: DMatrix::zeros(0, 0),
        }
    }
}

define_thread_local_workspace!(TRANSPOSE_WORKSPACE);

impl<T, I> ElementMatrixIntegrator<T> for Transposed<I>
where
    T: Real,
    I: ElementMatrixIntegrator<T>,
{
    fn quadrature(&self, element: &SegmentElement<T>) -> QuadraturePair<T> {
        self.0.quadrature(element)
    }

    fn assemble_element_matrix_into(
        &self,
        element_index: usize,
        element: &SegmentElement<T>,
        quadrature: &QuadraturePair<T>,
        mut output: DMatrixViewMut<T>,
    ) -> eyre::Result<()> {
        let n = output.nrows();
        with_thread_local_workspace(&TRANSPOSE_WORKSPACE, |buffer: &mut TransposeBuffer<T>| {
            buffer.matrix.resize_mut(n, n, T::zero());
            self.0.assemble_element_matrix_into(
                element_index,
                element,
                quadrature,
                DMatrixViewMut::from(&mut buffer.matrix),
            )?;
            output.tr_copy_from(&buffer.matrix);
            Ok::<_, eyre::Report>(())
        })
    }
}

impl<T, I> FaceMatrixIntegrator<T> for Transposed<I>
where
    T: Real,
    I: FaceMatrixIntegrator<T>,
{
    fn assemble_face_matrix_into(
        &self,
        context: &FaceContext<T>,
        mut output: DMatrixViewMut<T>,
    ) -> eyre::Result<()> {
        let n = output.nrows();
        with_thread_local_workspace(&TRANSPOSE_WORKSPACE, |buffer: &mut TransposeBuffer<T>| {
            buffer.matrix.resize_mut(n, n, T::zero());
            self.0
                .assemble_face_matrix_into(context, DMatrixViewMut::from(&mut buffer.matrix))?;
            output.tr_copy_from(&buffer.matrix);
            Ok::<_, eyre::Report>(())
        })
    }
}

/// Scratch buffers for basis values and gradients, shared by the integrators
/// through a thread-local workspace.
pub(crate) struct BasisBuffer<T> {
    pub values: Vec<T>,
    pub gradients: Vec<T>,
}

impl<T> Default for BasisBuffer<T> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            gradients: Vec::new(),
        }
    }
}

impl<T: Real> BasisBuffer<T> {
    pub fn resize(&mut self, num_nodes: usize) {
        self.values.resize(num_nodes, T::zero());
        self.gradients.resize(num_nodes, T::zero());
    }
}

define_thread_local_workspace!(pub(crate) BASIS_WORKSPACE);

/// Checks that the geometry map is orientation-preserving at a quadrature point
/// and returns the Jacobian determinant.
pub(crate) fn checked_jacobian_determinant<T: Real>(
    element_index: usize,
    jacobian: &Matrix1<T>,
) -> eyre::Result<T> {
    let det = jacobian.determinant();
    if det <= T::zero() {
        Err(eyre!(
            "degenerate or inverted geometry in element {} (Jacobian determinant {:?})",
            element_index,
            det
        ))
    } else {
        Ok(det)
    }
}
