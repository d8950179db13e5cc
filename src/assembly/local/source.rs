use nalgebra::DVectorViewMut;

use crate::assembly::local::{
    checked_jacobian_determinant, BasisBuffer, ElementVectorIntegrator, BASIS_WORKSPACE,
};
use crate::coefficient::Coefficient;
use crate::element::{FiniteElement, ReferenceFiniteElement, SegmentElement};
use crate::quadrature::{policy, segment_rule, QuadraturePair};
use crate::workspace::with_thread_local_workspace;
use crate::Real;

/// Integrates `(f, v)` over elements: the load vector of a source term.
pub struct SourceIntegrator<T: Real, C> {
    source: C,
    quadrature: Option<QuadraturePair<T>>,
}

impl<T: Real, C> SourceIntegrator<T, C> {
    pub fn new(source: C) -> Self {
        Self {
            source,
            quadrature: None,
        }
    }

    /// Overrides the default quadrature rule.
    pub fn with_quadrature(self, quadrature: QuadraturePair<T>) -> Self {
        Self {
            quadrature: Some(quadrature),
            ..self
        }
    }
}

impl<T, C> ElementVectorIntegrator<T> for SourceIntegrator<T, C>
where
    T: Real,
    C: Coefficient<T>,
{
    fn quadrature(&self, element: &SegmentElement<T>) -> QuadraturePair<T> {
        self.quadrature
            .clone()
            .unwrap_or_else(|| segment_rule(policy::source(element.order())))
    }

    fn assemble_element_vector_into(
        &self,
        element_index: usize,
        element: &SegmentElement<T>,
        quadrature: &QuadraturePair<T>,
        mut output: DVectorViewMut<T>,
    ) -> eyre::Result<()> {
        let n = element.num_nodes();
        let (weights, points) = quadrature;
        output.fill(T::zero());

        with_thread_local_workspace(&BASIS_WORKSPACE, |buffer: &mut BasisBuffer<T>| {
            buffer.resize(n);
            for (w, xi) in weights.iter().zip(points) {
                element.populate_basis(&mut buffer.values, xi);
                let jacobian = element.reference_jacobian(xi);
                let det = checked_jacobian_determinant(element_index, &jacobian)?;
                let x = element.map_reference_coords(xi);
                let scale = *w * self.source.evaluate(&x) * det;
                for i in 0..n {
                    output[i] += scale * buffer.values[i];
                }
            }
            Ok::<_, eyre::Report>(())
        })
    }
}
