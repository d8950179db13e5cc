use eyre::eyre;
use log::debug;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

use crate::solver::LinearOperator;
use crate::Real;

/// A smoothed-aggregation algebraic multigrid preconditioner.
///
/// The hierarchy is built once from the matrix: strength-of-connection
/// filtering, greedy aggregation of strongly coupled unknowns, a Jacobi-smoothed
/// tentative prolongator and Galerkin coarse operators `R A P`. Each application
/// performs a single V-cycle with damped Jacobi smoothing and a direct solve on
/// the coarsest level.
pub struct AlgebraicMultigrid<T: Real> {
    levels: Vec<Level<T>>,
    coarse_inverse: DMatrix<T>,
    dimension: usize,
}

struct Level<T: Real> {
    matrix: CsrMatrix<T>,
    prolongation: CsrMatrix<T>,
    restriction: CsrMatrix<T>,
    inverse_diagonal: DVector<T>,
    damping: T,
}

/// Construction parameters for the multigrid hierarchy.
#[derive(Debug, Clone, Copy)]
pub struct AmgSettings {
    /// Strength threshold: `j` is a strong neighbor of `i` when
    /// `|a_ij| > theta * sqrt(|a_ii a_jj|)`.
    pub strength_threshold: f64,
    /// Damping factor of the Jacobi smoother and prolongator smoothing.
    pub damping: f64,
    /// Coarsening stops once a level has at most this many unknowns.
    pub max_coarse_size: usize,
    pub max_levels: usize,
}

impl Default for AmgSettings {
    fn default() -> Self {
        Self {
            strength_threshold: 0.08,
            damping: 2.0 / 3.0,
            max_coarse_size: 16,
            max_levels: 12,
        }
    }
}

impl<T: Real> AlgebraicMultigrid<T> {
    pub fn new(matrix: &CsrMatrix<T>) -> eyre::Result<Self> {
        Self::with_settings(matrix, &AmgSettings::default())
    }

    pub fn with_settings(matrix: &CsrMatrix<T>, settings: &AmgSettings) -> eyre::Result<Self> {
        assert_eq!(matrix.nrows(), matrix.ncols());
        let dimension = matrix.nrows();
        let damping = T::from_f64(settings.damping).unwrap();

        let mut levels = Vec::new();
        let mut current = matrix.clone();
        while current.nrows() > settings.max_coarse_size && levels.len() + 1 < settings.max_levels {
            let aggregates = aggregate(&current, settings.strength_threshold)?;
            let num_aggregates = aggregates.iter().copied().max().map(|m| m + 1).unwrap_or(0);
            if num_aggregates == 0 || num_aggregates >= current.nrows() {
                // Aggregation stalled; stop coarsening and solve directly
                break;
            }
            let inverse_diagonal = inverse_diagonal(&current)?;

            let tentative = tentative_prolongator(&aggregates, num_aggregates)?;
            // P = (I - omega D^-1 A) P0
            let ap = &current * &tentative;
            let mut smoothed_correction = ap;
            scale_rows(&mut smoothed_correction, &inverse_diagonal, damping);
            let prolongation = subtract(&tentative, &smoothed_correction)?;
            let restriction = prolongation.transpose();
            let coarse = &restriction * &(&current * &prolongation);

            debug!(
                "amg level {}: {} unknowns -> {} aggregates",
                levels.len(),
                current.nrows(),
                num_aggregates
            );
            levels.push(Level {
                matrix: current,
                prolongation,
                restriction,
                inverse_diagonal,
                damping,
            });
            current = coarse;
        }

        let coarse_dense = DMatrix::from(&current);
        let coarse_inverse = coarse_dense
            .try_inverse()
            .ok_or_else(|| eyre!("coarsest multigrid operator is singular"))?;

        Ok(Self {
            levels,
            coarse_inverse,
            dimension,
        })
    }

    fn cycle(&self, level: usize, b: &DVector<T>) -> DVector<T> {
        if level == self.levels.len() {
            return &self.coarse_inverse * b;
        }
        let data = &self.levels[level];
        let n = data.matrix.nrows();

        // Pre-smoothing from a zero initial guess: x = omega D^-1 b
        let mut x = DVector::zeros(n);
        for i in 0..n {
            x[i] = data.damping * data.inverse_diagonal[i] * b[i];
        }

        let mut ax = DVector::zeros(n);
        data.matrix.apply_to(&mut ax, &x);
        let residual = b - &ax;

        let coarse_residual = &data.restriction * &residual;
        let coarse_correction = self.cycle(level + 1, &coarse_residual);
        x += &data.prolongation * &coarse_correction;

        // Post-smoothing
        data.matrix.apply_to(&mut ax, &x);
        for i in 0..n {
            x[i] += data.damping * data.inverse_diagonal[i] * (b[i] - ax[i]);
        }
        x
    }
}

impl<T: Real> LinearOperator<T> for AlgebraicMultigrid<T> {
    fn size(&self) -> usize {
        self.dimension
    }

    fn apply_to(&self, y: &mut DVector<T>, x: &DVector<T>) {
        assert_eq!(x.len(), self.dimension);
        y.copy_from(&self.cycle(0, x));
    }
}

fn inverse_diagonal<T: Real>(matrix: &CsrMatrix<T>) -> eyre::Result<DVector<T>> {
    let mut inverse = DVector::zeros(matrix.nrows());
    for r in 0..matrix.nrows() {
        let row = matrix.row(r);
        let k = row
            .col_indices()
            .iter()
            .position(|&c| c == r)
            .ok_or_else(|| eyre!("multigrid requires a stored diagonal in row {}", r))?;
        let value = row.values()[k];
        if value == T::zero() {
            return Err(eyre!("zero diagonal in row {}", r));
        }
        inverse[r] = T::one() / value;
    }
    Ok(inverse)
}

/// Assigns every unknown to an aggregate of strongly coupled neighbors.
fn aggregate<T: Real>(matrix: &CsrMatrix<T>, threshold: f64) -> eyre::Result<Vec<usize>> {
    let n = matrix.nrows();
    let theta = T::from_f64(threshold).unwrap();
    let diagonal: Vec<T> = (0..n)
        .map(|r| {
            let row = matrix.row(r);
            row.col_indices()
                .iter()
                .position(|&c| c == r)
                .map(|k| row.values()[k])
                .unwrap_or(T::zero())
        })
        .collect();

    let strong_neighbors = |i: usize| -> Vec<usize> {
        let row = matrix.row(i);
        row.col_indices()
            .iter()
            .zip(row.values())
            .filter(|&(&c, &v)| {
                c != i && v.abs() > theta * (diagonal[i].abs() * diagonal[c].abs()).sqrt()
            })
            .map(|(&c, _)| c)
            .collect()
    };

    let mut assignment = vec![usize::MAX; n];
    let mut num_aggregates = 0;

    // First pass: seed aggregates from unknowns whose strong neighborhood is
    // entirely unassigned
    for i in 0..n {
        if assignment[i] != usize::MAX {
            continue;
        }
        let neighbors = strong_neighbors(i);
        if neighbors.iter().all(|&j| assignment[j] == usize::MAX) {
            assignment[i] = num_aggregates;
            for &j in &neighbors {
                assignment[j] = num_aggregates;
            }
            num_aggregates += 1;
        }
    }

    // Second pass: attach leftovers to a neighboring aggregate, or give each
    // isolated unknown its own
    for i in 0..n {
        if assignment[i] != usize::MAX {
            continue;
        }
        let adopted = strong_neighbors(i)
            .iter()
            .find(|&&j| assignment[j] != usize::MAX)
            .map(|&j| assignment[j]);
        assignment[i] = match adopted {
            Some(aggregate) => aggregate,
            None => {
                num_aggregates += 1;
                num_aggregates - 1
            }
        };
    }

    Ok(assignment)
}

fn tentative_prolongator<T: Real>(
    assignment: &[usize],
    num_aggregates: usize,
) -> eyre::Result<CsrMatrix<T>> {
    let mut coo = CooMatrix::new(assignment.len(), num_aggregates);
    for (row, &aggregate) in assignment.iter().enumerate() {
        coo.push(row, aggregate, T::one());
    }
    Ok(CsrMatrix::from(&coo))
}

/// Scales each row of the matrix by `damping * inverse_diagonal[row]`.
fn scale_rows<T: Real>(matrix: &mut CsrMatrix<T>, inverse_diagonal: &DVector<T>, damping: T) {
    for r in 0..matrix.nrows() {
        let scale = damping * inverse_diagonal[r];
        let mut row = matrix.row_mut(r);
        for value in row.values_mut() {
            *value *= scale;
        }
    }
}

/// Computes `a - b` for CSR matrices with possibly different patterns.
fn subtract<T: Real>(a: &CsrMatrix<T>, b: &CsrMatrix<T>) -> eyre::Result<CsrMatrix<T>> {
    if a.nrows() != b.nrows() || a.ncols() != b.ncols() {
        return Err(eyre!("matrix dimensions do not match"));
    }
    let mut coo = CooMatrix::new(a.nrows(), a.ncols());
    for (r, c, v) in a.triplet_iter() {
        coo.push(r, c, *v);
    }
    for (r, c, v) in b.triplet_iter() {
        coo.push(r, c, -*v);
    }
    Ok(CsrMatrix::from(&coo))
}
