//! Assembly of variational forms.
//!
//! The `local` module provides element-level and face-level integrators that
//! produce small dense matrices and vectors. The `global` module scatters these
//! into global sparse matrices, matrix-free operators or statically condensed
//! systems. The `bc` module eliminates essential boundary conditions from
//! assembled systems.

pub mod bc;
pub mod global;
pub mod local;
