use nalgebra::{DMatrixViewMut, DVectorViewMut, Point1};

use crate::assembly::local::{FaceContext, FaceMatrixIntegrator, FaceVectorIntegrator};
use crate::coefficient::{Coefficient, VectorCoefficient};
use crate::element::ReferenceFiniteElement;
use crate::workspace::with_thread_local_workspace;
use crate::{define_thread_local_workspace, Real};

struct FaceBasisBuffer<T> {
    values1: Vec<T>,
    values2: Vec<T>,
}

impl<T> Default for FaceBasisBuffer<T> {
    fn default() -> Self {
        Self {
            values1: Vec::new(),
            values2: Vec::new(),
        }
    }
}

define_thread_local_workspace!(FACE_WORKSPACE);

/// Upwind numerical flux coupling for discontinuous Galerkin transport.
///
/// With `un = v . n` the outward normal velocity on the `element1` side and
/// `w1 = (un + |un|) / 2`, `w2 = (un - |un|) / 2`, the face matrix couples the
/// traces of both elements so that information flows strictly downwind. On
/// boundary faces only the `element1` block is assembled.
pub struct UpwindFaceIntegrator<V> {
    velocity: V,
}

impl<V> UpwindFaceIntegrator<V> {
    pub fn new(velocity: V) -> Self {
        Self { velocity }
    }
}

impl<T, V> FaceMatrixIntegrator<T> for UpwindFaceIntegrator<V>
where
    T: Real,
    V: VectorCoefficient<T>,
{
    fn assemble_face_matrix_into(
        &self,
        context: &FaceContext<T>,
        mut output: DMatrixViewMut<T>,
    ) -> eyre::Result<()> {
        let n1 = context.element1.num_nodes();
        output.fill(T::zero());

        let x = context.physical_point();
        let un = self.velocity.evaluate(&x)[0] * context.normal;
        let half = T::from_f64(0.5).unwrap();
        let w1 = half * (un + un.abs());
        let w2 = half * (un - un.abs());

        with_thread_local_workspace(&FACE_WORKSPACE, |buffer: &mut FaceBasisBuffer<T>| {
            buffer.values1.resize(n1, T::zero());
            context
                .element1
                .populate_basis(&mut buffer.values1, &Point1::new(context.xi1));

            for i in 0..n1 {
                for j in 0..n1 {
                    output[(i, j)] += w1 * buffer.values1[i] * buffer.values1[j];
                }
            }

            if let (Some(element2), Some(xi2)) = (context.element2, context.xi2) {
                let n2 = element2.num_nodes();
                buffer.values2.resize(n2, T::zero());
                element2.populate_basis(&mut buffer.values2, &Point1::new(xi2));

                for i in 0..n1 {
                    for j in 0..n2 {
                        output[(i, n1 + j)] -= w1 * buffer.values1[i] * buffer.values2[j];
                    }
                }
                for i in 0..n2 {
                    for j in 0..n2 {
                        output[(n1 + i, n1 + j)] -= w2 * buffer.values2[i] * buffer.values2[j];
                    }
                }
                for i in 0..n2 {
                    for j in 0..n1 {
                        output[(n1 + i, j)] += w2 * buffer.values2[i] * buffer.values1[j];
                    }
                }
            }
        });
        Ok(())
    }
}

/// Weak imposition of an inflow boundary value for discontinuous Galerkin
/// transport. Contributes `-(un - |un|) / 2 * g` times the trace of the test
/// function, which vanishes on outflow boundaries.
pub struct InflowBoundaryIntegrator<V, C> {
    velocity: V,
    inflow_value: C,
}

impl<V, C> InflowBoundaryIntegrator<V, C> {
    pub fn new(velocity: V, inflow_value: C) -> Self {
        Self {
            velocity,
            inflow_value,
        }
    }
}

impl<T, V, C> FaceVectorIntegrator<T> for InflowBoundaryIntegrator<V, C>
where
    T: Real,
    V: VectorCoefficient<T>,
    C: Coefficient<T>,
{
    fn assemble_face_vector_into(
        &self,
        context: &FaceContext<T>,
        mut output: DVectorViewMut<T>,
    ) -> eyre::Result<()> {
        assert!(
            context.element2.is_none(),
            "inflow boundary integrator applied to an interior face"
        );
        let n1 = context.element1.num_nodes();
        output.fill(T::zero());

        let x = context.physical_point();
        let un = self.velocity.evaluate(&x)[0] * context.normal;
        let half = T::from_f64(0.5).unwrap();
        let w = -half * (un - un.abs()) * self.inflow_value.evaluate(&x);

        with_thread_local_workspace(&FACE_WORKSPACE, |buffer: &mut FaceBasisBuffer<T>| {
            buffer.values1.resize(n1, T::zero());
            context
                .element1
                .populate_basis(&mut buffer.values1, &Point1::new(context.xi1));
            for i in 0..n1 {
                output[i] += w * buffer.values1[i];
            }
        });
        Ok(())
    }
}
