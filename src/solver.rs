//! Iterative solvers and preconditioners for assembled systems.
//!
//! All solvers work through the [`LinearOperator`] abstraction, so they apply
//! equally to CSR matrices, dense matrices and matrix-free operators such as
//! [`PartialAssemblyOperator`](crate::assembly::global::PartialAssemblyOperator).

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::ops::serial::spmm_csr_dense;
use nalgebra_sparse::ops::Op;
use nalgebra_sparse::CsrMatrix;

use eyre::eyre;
use itertools::izip;

use crate::Real;

mod amg;
mod cg;
mod gmres;

pub use amg::AlgebraicMultigrid;
pub use cg::ConjugateGradient;
pub use gmres::Gmres;

/// An abstract linear operator `y = A x`.
///
/// Preconditioners implement the same trait; their application computes an
/// approximation of `A^{-1} x`.
pub trait LinearOperator<T: Real> {
    fn size(&self) -> usize;

    fn apply_to(&self, y: &mut DVector<T>, x: &DVector<T>);
}

impl<T: Real> LinearOperator<T> for CsrMatrix<T> {
    fn size(&self) -> usize {
        self.nrows()
    }

    fn apply_to(&self, y: &mut DVector<T>, x: &DVector<T>) {
        spmm_csr_dense(T::zero(), &mut *y, T::one(), Op::NoOp(self), Op::NoOp(x));
    }
}

impl<T: Real> LinearOperator<T> for DMatrix<T> {
    fn size(&self) -> usize {
        self.nrows()
    }

    fn apply_to(&self, y: &mut DVector<T>, x: &DVector<T>) {
        self.mul_to(x, y);
    }
}

/// The identity, used as the default (no-op) preconditioner.
pub struct IdentityPreconditioner {
    size: usize,
}

impl IdentityPreconditioner {
    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl<T: Real> LinearOperator<T> for IdentityPreconditioner {
    fn size(&self) -> usize {
        self.size
    }

    fn apply_to(&self, y: &mut DVector<T>, x: &DVector<T>) {
        y.copy_from(x);
    }
}

/// Diagonal (Jacobi) preconditioning: application multiplies componentwise by
/// the inverse diagonal of the operator.
pub struct JacobiPreconditioner<T: Real> {
    inverse_diagonal: DVector<T>,
}

impl<T: Real> JacobiPreconditioner<T> {
    pub fn from_csr(matrix: &CsrMatrix<T>) -> eyre::Result<Self> {
        let mut diagonal = DVector::zeros(matrix.nrows());
        for (r, value) in diagonal.iter_mut().enumerate() {
            let row = matrix.row(r);
            if let Some(k) = row.col_indices().iter().position(|&c| c == r) {
                *value = row.values()[k];
            }
        }
        Self::from_diagonal(diagonal)
    }

    pub fn from_diagonal(diagonal: DVector<T>) -> eyre::Result<Self> {
        let mut inverse_diagonal = diagonal;
        for entry in inverse_diagonal.iter_mut() {
            if *entry == T::zero() {
                return Err(eyre!("Jacobi preconditioner requires a nonzero diagonal"));
            }
            *entry = T::one() / *entry;
        }
        Ok(Self { inverse_diagonal })
    }
}

impl<T: Real> LinearOperator<T> for JacobiPreconditioner<T> {
    fn size(&self) -> usize {
        self.inverse_diagonal.len()
    }

    fn apply_to(&self, y: &mut DVector<T>, x: &DVector<T>) {
        for (y_i, d_i, x_i) in izip!(y.iter_mut(), self.inverse_diagonal.iter(), x.iter()) {
            *y_i = *d_i * *x_i;
        }
    }
}

/// Symmetric Gauss-Seidel smoothing: each application performs a forward and a
/// backward sweep on `A y = x` starting from `y = 0`.
///
/// Rows without a (stored, nonzero) diagonal entry cannot be relaxed and are
/// passed through unchanged, so the smoother stays applicable to matrices such
/// as pure-advection discontinuous Galerkin operators whose interior-node
/// diagonal entries vanish.
pub struct GaussSeidelSmoother<'a, T: Real> {
    matrix: &'a CsrMatrix<T>,
    diagonal: DVector<T>,
}

impl<'a, T: Real> GaussSeidelSmoother<'a, T> {
    pub fn new(matrix: &'a CsrMatrix<T>) -> Self {
        let mut diagonal = DVector::zeros(matrix.nrows());
        for (r, value) in diagonal.iter_mut().enumerate() {
            let row = matrix.row(r);
            if let Some(k) = row.col_indices().iter().position(|&c| c == r) {
                *value = row.values()[k];
            }
        }
        Self { matrix, diagonal }
    }

    fn relax_row(&self, y: &mut DVector<T>, x: &DVector<T>, r: usize) {
        if self.diagonal[r] == T::zero() {
            y[r] = x[r];
            return;
        }
        let row = self.matrix.row(r);
        let mut sum = x[r];
        for (&c, &value) in row.col_indices().iter().zip(row.values()) {
            if c != r {
                sum -= value * y[c];
            }
        }
        y[r] = sum / self.diagonal[r];
    }
}

impl<'a, T: Real> LinearOperator<T> for GaussSeidelSmoother<'a, T> {
    fn size(&self) -> usize {
        self.matrix.nrows()
    }

    fn apply_to(&self, y: &mut DVector<T>, x: &DVector<T>) {
        y.fill(T::zero());
        for r in 0..self.matrix.nrows() {
            self.relax_row(y, x, r);
        }
        for r in (0..self.matrix.nrows()).rev() {
            self.relax_row(y, x, r);
        }
    }
}

/// Block-diagonal preconditioning with uniform square blocks.
///
/// Inverts each `block_size x block_size` diagonal block of the matrix up
/// front; application multiplies blockwise by the inverses. This is the natural
/// preconditioner for discontinuous Galerkin operators, whose unknowns form
/// disjoint per-element blocks: a symmetric Gauss-Seidel sweep can be violently
/// unstable on strongly nonsymmetric transport matrices, while the element
/// blocks of an upwind discretization are always invertible.
pub struct BlockJacobiPreconditioner<T: Real> {
    inverse_blocks: Vec<DMatrix<T>>,
    block_size: usize,
}

impl<T: Real> BlockJacobiPreconditioner<T> {
    pub fn from_csr(matrix: &CsrMatrix<T>, block_size: usize) -> eyre::Result<Self> {
        let n = matrix.nrows();
        if block_size == 0 || n % block_size != 0 {
            return Err(eyre!(
                "matrix dimension {} is not a multiple of the block size {}",
                n,
                block_size
            ));
        }
        let mut inverse_blocks = Vec::with_capacity(n / block_size);
        for start in (0..n).step_by(block_size) {
            let mut block = DMatrix::zeros(block_size, block_size);
            for i in 0..block_size {
                let row = matrix.row(start + i);
                for (&c, &value) in row.col_indices().iter().zip(row.values()) {
                    if (start..start + block_size).contains(&c) {
                        block[(i, c - start)] = value;
                    }
                }
            }
            let inverse = block
                .try_inverse()
                .ok_or_else(|| eyre!("singular diagonal block starting at row {}", start))?;
            inverse_blocks.push(inverse);
        }
        Ok(Self {
            inverse_blocks,
            block_size,
        })
    }
}

impl<T: Real> LinearOperator<T> for BlockJacobiPreconditioner<T> {
    fn size(&self) -> usize {
        self.inverse_blocks.len() * self.block_size
    }

    fn apply_to(&self, y: &mut DVector<T>, x: &DVector<T>) {
        for (k, inverse) in self.inverse_blocks.iter().enumerate() {
            let start = k * self.block_size;
            let mut y_block = y.rows_mut(start, self.block_size);
            y_block.gemv(T::one(), inverse, &x.rows(start, self.block_size), T::zero());
        }
    }
}

/// The outcome of a converged iterative solve.
#[derive(Debug, Clone)]
pub struct SolveOutput<T: Real> {
    pub solution: DVector<T>,
    pub iterations: usize,
}

/// A failed iterative solve, carrying the best available iterate.
#[derive(Debug, Clone)]
pub struct SolveError<T: Real> {
    pub solution: DVector<T>,
    pub iterations: usize,
    pub kind: SolveErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveErrorKind {
    MaxIterationsReached,
    IndefiniteOperator,
    IndefinitePreconditioner,
    Breakdown,
}

impl<T: Real> std::fmt::Display for SolveError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            SolveErrorKind::MaxIterationsReached => write!(
                f,
                "solver did not converge within {} iterations",
                self.iterations
            ),
            SolveErrorKind::IndefiniteOperator => {
                write!(f, "operator is not positive definite")
            }
            SolveErrorKind::IndefinitePreconditioner => {
                write!(f, "preconditioner is not positive definite")
            }
            SolveErrorKind::Breakdown => {
                write!(f, "solver broke down after {} iterations", self.iterations)
            }
        }
    }
}

impl<T: Real> std::error::Error for SolveError<T> {}
