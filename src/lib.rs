//! `varfem` is a small library for assembling and solving finite element
//! discretizations of scalar PDEs on segment meshes.
//!
//! The building blocks are organized bottom-up: quadrature rules and Lagrange
//! reference elements, element-local integrators for mass, diffusion,
//! advection and discontinuous-Galerkin upwind face terms, global CSR or
//! matrix-free assembly, symmetric Dirichlet elimination, iterative solvers
//! (CG, GMRES) with Jacobi/Gauss-Seidel/algebraic-multigrid preconditioning,
//! and quadrature-consistent error norms.

use nalgebra::RealField;

pub mod assembly;
pub mod coefficient;
pub mod element;
pub mod error;
pub mod function;
pub mod mesh;
pub mod quadrature;
pub mod solver;
pub mod space;

pub mod workspace;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

/// The scalar type used throughout the library.
///
/// A trait alias for real fields that are additionally `Copy`, which all the
/// scalar types we care about (`f32`, `f64`) satisfy.
pub trait Real: RealField + Copy {}

impl<T> Real for T where T: RealField + Copy {}
