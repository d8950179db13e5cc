use nalgebra::DMatrixViewMut;

use crate::assembly::local::{
    checked_jacobian_determinant, BasisBuffer, ElementMatrixIntegrator, BASIS_WORKSPACE,
};
use crate::coefficient::Coefficient;
use crate::element::{adjugate, FiniteElement, ReferenceFiniteElement, SegmentElement};
use crate::quadrature::{policy, segment_rule, QuadraturePair};
use crate::workspace::with_thread_local_workspace;
use crate::Real;

/// Integrates `(c grad u, grad v)` over elements: the weighted stiffness matrix.
///
/// Reference gradients are pulled back with the adjugate of the geometry
/// Jacobian, so the determinant enters the quadrature weight exactly once.
pub struct DiffusionIntegrator<T: Real, C> {
    coefficient: C,
    quadrature: Option<QuadraturePair<T>>,
}

impl<T: Real, C> DiffusionIntegrator<T, C> {
    pub fn new(coefficient: C) -> Self {
        Self {
            coefficient,
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

impl<T, C> ElementMatrixIntegrator<T> for DiffusionIntegrator<T, C>
where
    T: Real,
    C: Coefficient<T>,
{
    fn quadrature(&self, element: &SegmentElement<T>) -> QuadraturePair<T> {
        self.quadrature
            .clone()
            .unwrap_or_else(|| segment_rule(policy::diffusion(element.order())))
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

        let constant = self.coefficient.constant_value();
        with_thread_local_workspace(&BASIS_WORKSPACE, |buffer: &mut BasisBuffer<T>| {
            buffer.resize(n);
            for (w, xi) in weights.iter().zip(points) {
                element.populate_basis_gradients(&mut buffer.gradients, xi);
                let jacobian = element.reference_jacobian(xi);
                let det = checked_jacobian_determinant(element_index, &jacobian)?;
                let adj = adjugate(&jacobian);
                let c = match constant {
                    Some(c) => c,
                    None => self
                        .coefficient
                        .evaluate(&element.map_reference_coords(xi)),
                };
                let scale = *w * c / det;
                for i in 0..n {
                    let gi = adj[(0, 0)] * buffer.gradients[i];
                    for j in i..n {
                        let gj = adj[(0, 0)] * buffer.gradients[j];
                        output[(i, j)] += scale * gi * gj;
                    }
                }
            }
            Ok::<_, eyre::Report>(())
        })?;

        for i in 0..n {
            for j in (i + 1)..n {
                output[(j, i)] = output[(i, j)];
            }
        }
        Ok(())
    }
}
