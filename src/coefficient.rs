//! Scalar and vector coefficients for variational forms.

use nalgebra::{Point1, Vector1};

use crate::Real;

/// A scalar coefficient evaluated at physical points.
pub trait Coefficient<T: Real> {
    fn evaluate(&self, x: &Point1<T>) -> T;

    /// Returns the constant value of the coefficient, if it is constant.
    ///
    /// Integrators may use this to hoist the coefficient out of quadrature loops.
    fn constant_value(&self) -> Option<T> {
        None
    }
}

/// A vector-valued coefficient evaluated at physical points.
pub trait VectorCoefficient<T: Real> {
    fn evaluate(&self, x: &Point1<T>) -> Vector1<T>;
}

/// A coefficient with the same value everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant<T>(pub T);

impl<T: Real> Coefficient<T> for Constant<T> {
    fn evaluate(&self, _x: &Point1<T>) -> T {
        self.0
    }

    fn constant_value(&self) -> Option<T> {
        Some(self.0)
    }
}

/// A vector coefficient with the same value everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantVector<T>(pub Vector1<T>);

impl<T: Real> VectorCoefficient<T> for ConstantVector<T> {
    fn evaluate(&self, _x: &Point1<T>) -> Vector1<T> {
        self.0
    }
}

impl<T, F> Coefficient<T> for F
where
    T: Real,
    F: Fn(&Point1<T>) -> T,
{
    fn evaluate(&self, x: &Point1<T>) -> T {
        self(x)
    }
}

/// Wraps a closure returning a vector as a [`VectorCoefficient`].
///
/// A separate wrapper is needed because a blanket closure impl would conflict
/// with the scalar one.
pub struct VectorFunction<F>(pub F);

impl<T, F> VectorCoefficient<T> for VectorFunction<F>
where
    T: Real,
    F: Fn(&Point1<T>) -> Vector1<T>,
{
    fn evaluate(&self, x: &Point1<T>) -> Vector1<T> {
        (self.0)(x)
    }
}
