use log::debug;
use nalgebra::DVector;

use crate::solver::{
    IdentityPreconditioner, LinearOperator, SolveError, SolveErrorKind, SolveOutput,
};
use crate::Real;

/// Preconditioned conjugate gradients for symmetric positive definite operators.
///
/// Convergence is measured in the preconditioned residual norm `sqrt(r . z)`
/// relative to its initial value, the natural norm of the method.
pub struct ConjugateGradient<T: Real> {
    rel_tolerance: T,
    max_iterations: usize,
}

impl<T: Real> Default for ConjugateGradient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Real> ConjugateGradient<T> {
    pub fn new() -> Self {
        Self {
            rel_tolerance: T::from_f64(1e-8).unwrap(),
            max_iterations: 1000,
        }
    }

    pub fn with_rel_tolerance(self, rel_tolerance: T) -> Self {
        Self {
            rel_tolerance,
            ..self
        }
    }

    pub fn with_max_iterations(self, max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }

    pub fn solve<A>(&self, operator: &A, b: &DVector<T>) -> Result<SolveOutput<T>, SolveError<T>>
    where
        A: LinearOperator<T>,
    {
        let identity = IdentityPreconditioner::new(operator.size());
        self.solve_preconditioned(operator, &identity, b)
    }

    pub fn solve_preconditioned<A, P>(
        &self,
        operator: &A,
        preconditioner: &P,
        b: &DVector<T>,
    ) -> Result<SolveOutput<T>, SolveError<T>>
    where
        A: LinearOperator<T>,
        P: LinearOperator<T>,
    {
        let n = operator.size();
        assert_eq!(b.len(), n);

        let mut x = DVector::zeros(n);
        let mut r = b.clone();
        let mut z = DVector::zeros(n);
        preconditioner.apply_to(&mut z, &r);
        let mut p = z.clone();
        let mut ap = DVector::zeros(n);

        let mut rz = r.dot(&z);
        if rz < T::zero() {
            return Err(SolveError {
                solution: x,
                iterations: 0,
                kind: SolveErrorKind::IndefinitePreconditioner,
            });
        }
        let norm0 = rz.sqrt();
        if norm0 == T::zero() {
            return Ok(SolveOutput {
                solution: x,
                iterations: 0,
            });
        }
        let target = self.rel_tolerance * norm0;

        for iteration in 1..=self.max_iterations {
            operator.apply_to(&mut ap, &p);
            let p_ap = p.dot(&ap);
            if p_ap <= T::zero() {
                return Err(SolveError {
                    solution: x,
                    iterations: iteration,
                    kind: SolveErrorKind::IndefiniteOperator,
                });
            }

            let alpha = rz / p_ap;
            x.axpy(alpha, &p, T::one());
            r.axpy(-alpha, &ap, T::one());

            preconditioner.apply_to(&mut z, &r);
            let rz_next = r.dot(&z);
            if rz_next < T::zero() {
                return Err(SolveError {
                    solution: x,
                    iterations: iteration,
                    kind: SolveErrorKind::IndefinitePreconditioner,
                });
            }

            let norm = rz_next.sqrt();
            debug!("cg iteration {}: residual norm {:?}", iteration, norm);
            if norm <= target {
                return Ok(SolveOutput {
                    solution: x,
                    iterations: iteration,
                });
            }

            let beta = rz_next / rz;
            rz = rz_next;
            // p = z + beta p
            p.axpy(T::one(), &z, beta);
        }

        Err(SolveError {
            solution: x,
            iterations: self.max_iterations,
            kind: SolveErrorKind::MaxIterationsReached,
        })
    }
}
