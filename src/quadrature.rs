//! Quadrature rules on the reference segment.
//!
//! The reference segment used throughout the crate is the unit interval `[0, 1]`,
//! so that the signed reference normal of a face at local coordinate `x` is `2x - 1`.
//! Gauss-Legendre rules native to `[-1, 1]` are remapped affinely.

use nalgebra::Point1;

use crate::Real;

pub mod univariate;

/// A quadrature rule consisting of weights and points on the reference segment.
pub trait Quadrature<T>
where
    T: Real,
{
    fn weights(&self) -> &[T];
    fn points(&self) -> &[Point1<T>];

    /// Approximates the integral of the given function over the reference segment.
    fn integrate<Function>(&self, f: Function) -> T
    where
        Function: Fn(&Point1<T>) -> T,
    {
        let mut integral = T::zero();
        for (w, p) in self.weights().iter().zip(self.points()) {
            integral += f(p) * *w;
        }
        integral
    }
}

/// An owned (weights, points) pair. The canonical representation of a rule.
pub type QuadraturePair<T> = (Vec<T>, Vec<Point1<T>>);

impl<T: Real> Quadrature<T> for QuadraturePair<T> {
    fn weights(&self) -> &[T] {
        &self.0
    }

    fn points(&self) -> &[Point1<T>] {
        &self.1
    }
}

impl<T, X> Quadrature<T> for &X
where
    T: Real,
    X: Quadrature<T>,
{
    fn weights(&self) -> &[T] {
        X::weights(self)
    }

    fn points(&self) -> &[Point1<T>] {
        X::points(self)
    }
}

/// Returns a quadrature rule on the reference segment `[0, 1]` that integrates
/// polynomials of (at least) the given degree exactly.
///
/// Deterministic for a given degree; the rule is the Gauss-Legendre rule with
/// `degree / 2 + 1` points, remapped from `[-1, 1]` with halved weights.
pub fn segment_rule<T: Real>(degree: usize) -> QuadraturePair<T> {
    let num_points = degree / 2 + 1;
    let (weights, points) = univariate::gauss(num_points);
    let half = T::from_f64(0.5).unwrap();
    let weights = weights
        .into_iter()
        .map(|w| T::from_f64(w).unwrap() * half)
        .collect();
    let points = points
        .into_iter()
        .map(|x| Point1::new((T::from_f64(x).unwrap() + T::one()) * half))
        .collect();
    (weights, points)
}

/// Quadrature-order policies for the built-in integrators, as functions of the
/// polynomial order of the finite element space.
///
/// The policies assume affine element geometry (the Jacobian is constant per element),
/// which holds for the segment meshes in this crate.
pub mod policy {
    /// Mass-like terms: the integrand `phi_i phi_j` has degree `2p`.
    pub fn mass(order: usize) -> usize {
        2 * order
    }

    /// Diffusion-like terms: the integrand involves two gradients, degree `2(p - 1)`.
    pub fn diffusion(order: usize) -> usize {
        2 * order.saturating_sub(1)
    }

    /// Advection terms: shape value times gradient, rounded up to `2p`.
    pub fn advection(order: usize) -> usize {
        2 * order
    }

    /// Domain source terms: `2p` (matches a trial function of full order against the source).
    pub fn source(order: usize) -> usize {
        2 * order
    }

    /// Error norms: `2p + 3`, slightly over-integrated so the reported norm is
    /// consistent with the discretization that produced the field.
    pub fn error_norm(order: usize) -> usize {
        2 * order + 3
    }
}
