use log::debug;
use nalgebra::{DMatrix, DVector};

use crate::solver::{
    IdentityPreconditioner, LinearOperator, SolveError, SolveErrorKind, SolveOutput,
};
use crate::Real;

/// Restarted GMRES for general (nonsymmetric) operators, with left
/// preconditioning.
///
/// The Arnoldi basis is built with modified Gram-Schmidt and the least-squares
/// problem is updated with Givens rotations, so the preconditioned residual
/// norm is available at every inner iteration. That recurrence norm only steers
/// the inner iteration: success is declared exclusively on the true residual
/// `b - A x`, measured against `max(rel_tolerance * |b|, abs_tolerance)` at
/// every restart. An ill-conditioned preconditioner can shrink the recurrence
/// norm while the true residual stalls, and the true-residual check keeps such
/// a solve from being reported as converged.
pub struct Gmres<T: Real> {
    restart: usize,
    max_iterations: usize,
    rel_tolerance: T,
    abs_tolerance: T,
}

impl<T: Real> Default for Gmres<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Real> Gmres<T> {
    pub fn new() -> Self {
        Self {
            restart: 50,
            max_iterations: 1000,
            rel_tolerance: T::from_f64(1e-8).unwrap(),
            abs_tolerance: T::zero(),
        }
    }

    pub fn with_restart(self, restart: usize) -> Self {
        assert!(restart > 0, "restart length must be positive");
        Self { restart, ..self }
    }

    pub fn with_max_iterations(self, max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }

    pub fn with_rel_tolerance(self, rel_tolerance: T) -> Self {
        Self {
            rel_tolerance,
            ..self
        }
    }

    pub fn with_abs_tolerance(self, abs_tolerance: T) -> Self {
        Self {
            abs_tolerance,
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
        let m = self.restart;

        let mut x = DVector::zeros(n);
        let mut scratch = DVector::zeros(n);
        let norm_b = b.norm();
        let target = if norm_b > T::zero() {
            (self.rel_tolerance * norm_b).max(self.abs_tolerance)
        } else {
            self.abs_tolerance
        };

        let mut basis: Vec<DVector<T>> = Vec::with_capacity(m + 1);
        let mut hessenberg = DMatrix::zeros(m + 1, m);
        let mut givens_c = vec![T::zero(); m];
        let mut givens_s = vec![T::zero(); m];
        let mut g = DVector::zeros(m + 1);

        let mut total_iterations = 0;
        loop {
            operator.apply_to(&mut scratch, &x);
            let defect = b - &scratch;
            let defect_norm = defect.norm();
            if defect_norm <= target {
                return Ok(SolveOutput {
                    solution: x,
                    iterations: total_iterations,
                });
            }
            if total_iterations >= self.max_iterations {
                return Err(SolveError {
                    solution: x,
                    iterations: total_iterations,
                    kind: SolveErrorKind::MaxIterationsReached,
                });
            }

            // r = M^-1 (b - A x)
            let mut residual = DVector::zeros(n);
            preconditioner.apply_to(&mut residual, &defect);
            let beta = residual.norm();
            if beta == T::zero() {
                return Err(SolveError {
                    solution: x,
                    iterations: total_iterations,
                    kind: SolveErrorKind::Breakdown,
                });
            }
            // The recurrence tracks the preconditioned residual. Aim for the
            // same relative reduction that the true residual still needs; the
            // check at the top of the loop decides actual convergence.
            let inner_target = beta * target / defect_norm;

            basis.clear();
            basis.push(residual / beta);
            g.fill(T::zero());
            g[0] = beta;

            let mut inner = 0;
            while inner < m && total_iterations < self.max_iterations {
                // w = M^-1 A v_j
                operator.apply_to(&mut scratch, &basis[inner]);
                let mut w = DVector::zeros(n);
                preconditioner.apply_to(&mut w, &scratch);

                for i in 0..=inner {
                    let h = w.dot(&basis[i]);
                    hessenberg[(i, inner)] = h;
                    w.axpy(-h, &basis[i], T::one());
                }
                let h_next = w.norm();
                hessenberg[(inner + 1, inner)] = h_next;

                // Apply accumulated rotations to the new column
                for i in 0..inner {
                    let h_i = hessenberg[(i, inner)];
                    let h_i1 = hessenberg[(i + 1, inner)];
                    hessenberg[(i, inner)] = givens_c[i] * h_i + givens_s[i] * h_i1;
                    hessenberg[(i + 1, inner)] = -givens_s[i] * h_i + givens_c[i] * h_i1;
                }

                // New rotation eliminating the subdiagonal entry
                let h_d = hessenberg[(inner, inner)];
                let denom = (h_d * h_d + h_next * h_next).sqrt();
                if denom == T::zero() {
                    return Err(SolveError {
                        solution: x,
                        iterations: total_iterations,
                        kind: SolveErrorKind::Breakdown,
                    });
                }
                givens_c[inner] = h_d / denom;
                givens_s[inner] = h_next / denom;
                hessenberg[(inner, inner)] = denom;
                hessenberg[(inner + 1, inner)] = T::zero();
                g[inner + 1] = -givens_s[inner] * g[inner];
                g[inner] *= givens_c[inner];

                total_iterations += 1;
                inner += 1;
                let residual_norm = g[inner].abs();
                debug!(
                    "gmres iteration {}: residual norm {:?}",
                    total_iterations, residual_norm
                );

                if residual_norm <= inner_target || h_next == T::zero() {
                    break;
                }
                basis.push(w / h_next);
            }

            // Back substitution on the triangularized least-squares system
            let mut y = DVector::zeros(inner);
            for i in (0..inner).rev() {
                let mut sum = g[i];
                for j in (i + 1)..inner {
                    sum -= hessenberg[(i, j)] * y[j];
                }
                y[i] = sum / hessenberg[(i, i)];
            }
            for (i, basis_vector) in basis.iter().take(inner).enumerate() {
                x.axpy(y[i], basis_vector, T::one());
            }
        }
    }
}
