//! Elimination of essential (Dirichlet) boundary conditions.

use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

use crate::solver::LinearOperator;
use crate::Real;

/// Eliminates Dirichlet conditions `u[dof] = value` from an assembled system,
/// preserving symmetry.
///
/// Constrained columns are folded into the right-hand side before both the
/// constrained rows and columns are zeroed. The diagonal of each constrained row
/// is set to a representative magnitude taken from the matrix diagonal, so the
/// conditioning of the system does not degrade. The sparsity pattern must
/// contain the diagonal entry of every constrained row.
pub fn apply_dirichlet_csr<T: Real>(
    matrix: &mut CsrMatrix<T>,
    rhs: &mut DVector<T>,
    bcs: &[(usize, T)],
) {
    let n = matrix.nrows();
    assert_eq!(matrix.ncols(), n);
    assert_eq!(rhs.len(), n);

    let mut constrained = vec![false; n];
    let mut values = vec![T::zero(); n];
    for &(dof, value) in bcs {
        constrained[dof] = true;
        values[dof] = value;
    }

    // The first non-zero diagonal entry serves as a representative scale for the
    // constrained rows, so the conditioning of the matrix does not degrade
    let scale = (0..n)
        .filter_map(|r| {
            let row = matrix.row(r);
            let k = row.col_indices().iter().position(|&c| c == r)?;
            let entry = row.values()[k];
            (entry != T::zero()).then(|| entry.abs())
        })
        .next()
        .unwrap_or_else(T::one);

    for r in 0..n {
        let mut row = matrix.row_mut(r);
        let (cols, entries) = row.cols_and_values_mut();
        if constrained[r] {
            for (k, &c) in cols.iter().enumerate() {
                entries[k] = if c == r { scale } else { T::zero() };
            }
            rhs[r] = scale * values[r];
        } else {
            for (k, &c) in cols.iter().enumerate() {
                if constrained[c] {
                    rhs[r] -= entries[k] * values[c];
                    entries[k] = T::zero();
                }
            }
        }
    }
}

/// A matrix-free counterpart to [`apply_dirichlet_csr`]: wraps an operator so
/// that constrained degrees of freedom act as identity rows and do not couple
/// to the rest of the system.
pub struct ConstrainedOperator<'a, T, A> {
    operator: &'a A,
    constrained: Vec<bool>,
    values: Vec<T>,
}

impl<'a, T: Real, A: LinearOperator<T>> ConstrainedOperator<'a, T, A> {
    pub fn new(operator: &'a A, bcs: &[(usize, T)]) -> Self {
        let n = operator.size();
        let mut constrained = vec![false; n];
        let mut values = vec![T::zero(); n];
        for &(dof, value) in bcs {
            constrained[dof] = true;
            values[dof] = value;
        }
        Self {
            operator,
            constrained,
            values,
        }
    }

    /// Folds the boundary values into the right-hand side, the matrix-free
    /// analogue of column elimination: `b := b - A g` on unconstrained rows and
    /// `b := g` on constrained rows, where `g` is the extension of the boundary
    /// values by zero.
    pub fn eliminate_rhs(&self, rhs: &mut DVector<T>) {
        let n = self.operator.size();
        assert_eq!(rhs.len(), n);
        let extension = DVector::from_iterator(n, self.values.iter().copied());
        let mut correction = DVector::zeros(n);
        self.operator.apply_to(&mut correction, &extension);
        for r in 0..n {
            if self.constrained[r] {
                rhs[r] = self.values[r];
            } else {
                rhs[r] -= correction[r];
            }
        }
    }
}

impl<'a, T: Real, A: LinearOperator<T>> LinearOperator<T> for ConstrainedOperator<'a, T, A> {
    fn size(&self) -> usize {
        self.operator.size()
    }

    fn apply_to(&self, y: &mut DVector<T>, x: &DVector<T>) {
        let n = self.operator.size();
        assert_eq!(x.len(), n);
        let mut interior = x.clone();
        for r in 0..n {
            if self.constrained[r] {
                interior[r] = T::zero();
            }
        }
        self.operator.apply_to(y, &interior);
        for r in 0..n {
            if self.constrained[r] {
                y[r] = x[r];
            }
        }
    }
}
