use nalgebra::DMatrixViewMut;

use crate::assembly::local::{
    checked_jacobian_determinant, BasisBuffer, ElementMatrixIntegrator, BASIS_WORKSPACE,
};
use crate::coefficient::VectorCoefficient;
use crate::element::{adjugate, FiniteElement, ReferenceFiniteElement, SegmentElement};
use crate::quadrature::{policy, segment_rule, QuadraturePair};
use crate::workspace::with_thread_local_workspace;
use crate::Real;

/// Integrates `alpha (v . grad u, w)` over elements, for a vector velocity `v`.
///
/// The adjugate pullback of the trial gradient cancels the Jacobian determinant,
/// so no determinant factor appears in the quadrature weight. Wrapping in
/// [`Transposed`](crate::assembly::local::Transposed) with `alpha = -1` yields
/// the weak form `-(u, v . grad w)` used by discontinuous Galerkin transport.
pub struct AdvectionIntegrator<T: Real, V> {
    velocity: V,
    alpha: T,
    quadrature: Option<QuadraturePair<T>>,
}

impl<T: Real, V> AdvectionIntegrator<T, V> {
    pub fn new(velocity: V, alpha: T) -> Self {
        Self {
            velocity,
            alpha,
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

impl<T, V> ElementMatrixIntegrator<T> for AdvectionIntegrator<T, V>
where
    T: Real,
    V: VectorCoefficient<T>,
{
    fn quadrature(&self, element: &SegmentElement<T>) -> QuadraturePair<T> {
        self.quadrature
            .clone()
            .unwrap_or_else(|| segment_rule(policy::advection(element.order())))
    }

    fn assemble_element_matrix_into(
        &self,
        element_index: usize,
        element: &SegmentElement<T>,
        quadrature: &QuadraturePair<T>,
        mut output: DMatrixViewMut<T>,
    ) -> eyre::Result<()> {
        let n = element.num_nodes();
        let (weights, points) = quadrature;
        output.fill(T::zero());

        with_thread_local_workspace(&BASIS_WORKSPACE, |buffer: &mut BasisBuffer<T>| {
            buffer.resize(n);
            for (w, xi) in weights.iter().zip(points) {
                element.populate_basis(&mut buffer.values, xi);
                element.populate_basis_gradients(&mut buffer.gradients, xi);
                let jacobian = element.reference_jacobian(xi);
                checked_jacobian_determinant(element_index, &jacobian)?;
                let adj = adjugate(&jacobian);
                let x = element.map_reference_coords(xi);
                let velocity = self.velocity.evaluate(&x);
                let scale = self.alpha * *w;
                for j in 0..n {
                    let directional = buffer.gradients[j] * adj[(0, 0)] * velocity[0];
                    for i in 0..n {
                        output[(i, j)] += scale * buffer.values[i] * directional;
                    }
                }
            }
            Ok::<_, eyre::Report>(())
        })
    }
}
