//! Global assembly: scattering local contributions into sparse matrices,
//! matrix-free operators and statically condensed systems.

use std::collections::BTreeSet;

use eyre::eyre;
use nalgebra::{DMatrix, DVector, Point1};
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::CsrMatrix;
use rayon::prelude::*;

use crate::assembly::local::{
    ElementMatrixIntegrator, ElementVectorIntegrator, FaceContext, FaceMatrixIntegrator,
    FaceVectorIntegrator,
};
use crate::element::SegmentElement;
use crate::solver::LinearOperator;
use crate::space::{FiniteElementSpace, H1Space};
use crate::Real;

/// A bilinear form: a finite element space together with the integrators that
/// define its matrix.
///
/// Domain integrators contribute per-element blocks; face integrators contribute
/// coupling blocks on interior faces and trace blocks on boundary faces.
pub struct BilinearForm<'a, T: Real, S> {
    space: &'a S,
    domain: Vec<Box<dyn ElementMatrixIntegrator<T> + Sync + 'a>>,
    interior_face: Vec<Box<dyn FaceMatrixIntegrator<T> + Sync + 'a>>,
    boundary_face: Vec<Box<dyn FaceMatrixIntegrator<T> + Sync + 'a>>,
}

impl<'a, T, S> BilinearForm<'a, T, S>
where
    T: Real,
    S: FiniteElementSpace<T>,
{
    pub fn new(space: &'a S) -> Self {
        Self {
            space,
            domain: Vec::new(),
            interior_face: Vec::new(),
            boundary_face: Vec::new(),
        }
    }

    pub fn add_domain_integrator(
        &mut self,
        integrator: impl ElementMatrixIntegrator<T> + Sync + 'a,
    ) -> &mut Self {
        self.domain.push(Box::new(integrator));
        self
    }

    pub fn add_interior_face_integrator(
        &mut self,
        integrator: impl FaceMatrixIntegrator<T> + Sync + 'a,
    ) -> &mut Self {
        self.interior_face.push(Box::new(integrator));
        self
    }

    pub fn add_boundary_face_integrator(
        &mut self,
        integrator: impl FaceMatrixIntegrator<T> + Sync + 'a,
    ) -> &mut Self {
        self.boundary_face.push(Box::new(integrator));
        self
    }

    pub fn space(&self) -> &'a S {
        self.space
    }

    /// The sparsity pattern induced by the form's element and face couplings.
    fn sparsity_pattern(&self) -> eyre::Result<SparsityPattern> {
        let n = self.space.num_dofs();
        let mut rows = vec![BTreeSet::new(); n];

        let mut dofs = Vec::new();
        if !self.domain.is_empty() {
            for index in 0..self.space.num_elements() {
                dofs.resize(self.space.element_dof_count(index), 0);
                self.space.populate_element_dofs(&mut dofs, index);
                for &i in &dofs {
                    for &j in &dofs {
                        rows[i].insert(j);
                    }
                }
            }
        }

        if !self.interior_face.is_empty() {
            for face in self.space.mesh().interior_faces() {
                let mut combined = vec![0; self.space.element_dof_count(face.elem1)];
                self.space.populate_element_dofs(&mut combined, face.elem1);
                let n1 = combined.len();
                combined.resize(n1 + self.space.element_dof_count(face.elem2), 0);
                self.space.populate_element_dofs(&mut combined[n1..], face.elem2);
                for &i in &combined {
                    for &j in &combined {
                        rows[i].insert(j);
                    }
                }
            }
        }

        if !self.boundary_face.is_empty() {
            for face in self.space.mesh().boundary_faces() {
                dofs.resize(self.space.element_dof_count(face.element), 0);
                self.space.populate_element_dofs(&mut dofs, face.element);
                for &i in &dofs {
                    for &j in &dofs {
                        rows[i].insert(j);
                    }
                }
            }
        }

        let mut offsets = Vec::with_capacity(n + 1);
        let mut indices = Vec::new();
        offsets.push(0);
        for row in &rows {
            indices.extend(row.iter().copied());
            offsets.push(indices.len());
        }
        SparsityPattern::try_from_offsets_and_indices(n, n, offsets, indices)
            .map_err(|err| eyre!("invalid sparsity pattern: {:?}", err))
    }

    /// Computes the summed local matrix of all domain integrators for one element.
    fn assemble_local_matrix(
        &self,
        index: usize,
        element: &SegmentElement<T>,
        accumulator: &mut DMatrix<T>,
        scratch: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        let n = self.space.element_dof_count(index);
        accumulator.resize_mut(n, n, T::zero());
        accumulator.fill(T::zero());
        scratch.resize_mut(n, n, T::zero());
        for integrator in &self.domain {
            let quadrature = integrator.quadrature(element);
            integrator.assemble_element_matrix_into(
                index,
                element,
                &quadrature,
                (&mut *scratch).into(),
            )?;
            *accumulator += &*scratch;
        }
        Ok(())
    }

    /// Scatters all face contributions of the form into the matrix.
    fn add_face_contributions_to_csr(
        &self,
        matrix: &mut CsrMatrix<T>,
        permutation: &mut Vec<usize>,
    ) -> eyre::Result<()> {
        let mesh = self.space.mesh();

        if !self.interior_face.is_empty() {
            for face in mesh.interior_faces() {
                let element1 = self.space.element(face.elem1);
                let element2 = self.space.element(face.elem2);
                let context = FaceContext {
                    element1: &element1,
                    element2: Some(&element2),
                    xi1: mesh.local_face_coordinate(face.elem1, face.vertex),
                    xi2: Some(mesh.local_face_coordinate(face.elem2, face.vertex)),
                    normal: T::one(),
                };

                let n1 = self.space.element_dof_count(face.elem1);
                let n2 = self.space.element_dof_count(face.elem2);
                let mut dofs = vec![0; n1 + n2];
                self.space.populate_element_dofs(&mut dofs[..n1], face.elem1);
                self.space.populate_element_dofs(&mut dofs[n1..], face.elem2);

                let mut block = DMatrix::zeros(n1 + n2, n1 + n2);
                let mut scratch = DMatrix::zeros(n1 + n2, n1 + n2);
                for integrator in &self.interior_face {
                    integrator.assemble_face_matrix_into(&context, (&mut scratch).into())?;
                    block += &scratch;
                }
                add_local_matrix_to_csr(matrix, &dofs, &block, permutation);
            }
        }

        if !self.boundary_face.is_empty() {
            for face in mesh.boundary_faces() {
                let element1 = self.space.element(face.element);
                let xi1 = mesh.local_face_coordinate(face.element, face.vertex);
                let context = FaceContext {
                    element1: &element1,
                    element2: None,
                    xi1,
                    xi2: None,
                    normal: xi1 + xi1 - T::one(),
                };

                let n1 = self.space.element_dof_count(face.element);
                let mut dofs = vec![0; n1];
                self.space.populate_element_dofs(&mut dofs, face.element);

                let mut block = DMatrix::zeros(n1, n1);
                let mut scratch = DMatrix::zeros(n1, n1);
                for integrator in &self.boundary_face {
                    integrator.assemble_face_matrix_into(&context, (&mut scratch).into())?;
                    block += &scratch;
                }
                add_local_matrix_to_csr(matrix, &dofs, &block, permutation);
            }
        }
        Ok(())
    }

    /// Assembles the form into a CSR matrix, element by element.
    pub fn assemble_csr(&self) -> eyre::Result<CsrMatrix<T>> {
        let pattern = self.sparsity_pattern()?;
        let nnz = pattern.nnz();
        let mut matrix = CsrMatrix::try_from_pattern_and_values(pattern, vec![T::zero(); nnz])
            .map_err(|err| eyre!("CSR construction failed: {:?}", err))?;

        let mut accumulator = DMatrix::zeros(0, 0);
        let mut scratch = DMatrix::zeros(0, 0);
        let mut dofs = Vec::new();
        let mut permutation = Vec::new();
        for index in 0..self.space.num_elements() {
            let element = self.space.element(index);
            self.assemble_local_matrix(index, &element, &mut accumulator, &mut scratch)?;
            dofs.resize(self.space.element_dof_count(index), 0);
            self.space.populate_element_dofs(&mut dofs, index);
            add_local_matrix_to_csr(&mut matrix, &dofs, &accumulator, &mut permutation);
        }

        self.add_face_contributions_to_csr(&mut matrix, &mut permutation)?;
        Ok(matrix)
    }

    /// Assembles the form into a CSR matrix with element matrices computed in
    /// parallel. The scatter is serial, so the result is bitwise identical to
    /// [`assemble_csr`](Self::assemble_csr).
    pub fn assemble_csr_par(&self) -> eyre::Result<CsrMatrix<T>>
    where
        T: Send + Sync,
        S: Sync,
    {
        let pattern = self.sparsity_pattern()?;
        let nnz = pattern.nnz();
        let mut matrix = CsrMatrix::try_from_pattern_and_values(pattern, vec![T::zero(); nnz])
            .map_err(|err| eyre!("CSR construction failed: {:?}", err))?;

        let locals: Vec<(Vec<usize>, DMatrix<T>)> = (0..self.space.num_elements())
            .into_par_iter()
            .map(|index| {
                let element = self.space.element(index);
                let mut accumulator = DMatrix::zeros(0, 0);
                let mut scratch = DMatrix::zeros(0, 0);
                self.assemble_local_matrix(index, &element, &mut accumulator, &mut scratch)?;
                let mut dofs = vec![0; self.space.element_dof_count(index)];
                self.space.populate_element_dofs(&mut dofs, index);
                Ok((dofs, accumulator))
            })
            .collect::<eyre::Result<_>>()?;

        let mut permutation = Vec::new();
        for (dofs, local) in &locals {
            add_local_matrix_to_csr(&mut matrix, dofs, local, &mut permutation);
        }

        self.add_face_contributions_to_csr(&mut matrix, &mut permutation)?;
        Ok(matrix)
    }

    /// Assembles the form into a matrix-free operator that stores the local
    /// blocks and replays them on every application, never forming the global
    /// matrix.
    pub fn assemble_operator(&self) -> eyre::Result<PartialAssemblyOperator<T>> {
        let mut blocks = Vec::new();

        let mut scratch = DMatrix::zeros(0, 0);
        for index in 0..self.space.num_elements() {
            let element = self.space.element(index);
            let mut accumulator = DMatrix::zeros(0, 0);
            self.assemble_local_matrix(index, &element, &mut accumulator, &mut scratch)?;
            let mut dofs = vec![0; self.space.element_dof_count(index)];
            self.space.populate_element_dofs(&mut dofs, index);
            blocks.push((dofs, accumulator));
        }

        let mesh = self.space.mesh();
        if !self.interior_face.is_empty() {
            for face in mesh.interior_faces() {
                let element1 = self.space.element(face.elem1);
                let element2 = self.space.element(face.elem2);
                let context = FaceContext {
                    element1: &element1,
                    element2: Some(&element2),
                    xi1: mesh.local_face_coordinate(face.elem1, face.vertex),
                    xi2: Some(mesh.local_face_coordinate(face.elem2, face.vertex)),
                    normal: T::one(),
                };
                let n1 = self.space.element_dof_count(face.elem1);
                let n2 = self.space.element_dof_count(face.elem2);
                let mut dofs = vec![0; n1 + n2];
                self.space.populate_element_dofs(&mut dofs[..n1], face.elem1);
                self.space.populate_element_dofs(&mut dofs[n1..], face.elem2);
                let mut block = DMatrix::zeros(n1 + n2, n1 + n2);
                scratch.resize_mut(n1 + n2, n1 + n2, T::zero());
                for integrator in &self.interior_face {
                    integrator.assemble_face_matrix_into(&context, (&mut scratch).into())?;
                    block += &scratch;
                }
                blocks.push((dofs, block));
            }
        }
        if !self.boundary_face.is_empty() {
            for face in mesh.boundary_faces() {
                let element1 = self.space.element(face.element);
                let xi1 = mesh.local_face_coordinate(face.element, face.vertex);
                let context = FaceContext {
                    element1: &element1,
                    element2: None,
                    xi1,
                    xi2: None,
                    normal: xi1 + xi1 - T::one(),
                };
                let n1 = self.space.element_dof_count(face.element);
                let mut dofs = vec![0; n1];
                self.space.populate_element_dofs(&mut dofs, face.element);
                let mut block = DMatrix::zeros(n1, n1);
                scratch.resize_mut(n1, n1, T::zero());
                for integrator in &self.boundary_face {
                    integrator.assemble_face_matrix_into(&context, (&mut scratch).into())?;
                    block += &scratch;
                }
                blocks.push((dofs, block));
            }
        }

        Ok(PartialAssemblyOperator {
            dimension: self.space.num_dofs(),
            blocks,
        })
    }
}

/// A linear form: a finite element space together with the integrators and point
/// sources that define its right-hand side vector.
pub struct LinearForm<'a, T: Real, S> {
    space: &'a S,
    domain: Vec<Box<dyn ElementVectorIntegrator<T> + Sync + 'a>>,
    boundary_face: Vec<Box<dyn FaceVectorIntegrator<T> + Sync + 'a>>,
    point_sources: Vec<(Point1<T>, T)>,
}

impl<'a, T, S> LinearForm<'a, T, S>
where
    T: Real,
    S: FiniteElementSpace<T>,
{
    pub fn new(space: &'a S) -> Self {
        Self {
            space,
            domain: Vec::new(),
            boundary_face: Vec::new(),
            point_sources: Vec::new(),
        }
    }

    pub fn add_domain_integrator(
        &mut self,
        integrator: impl ElementVectorIntegrator<T> + Sync + 'a,
    ) -> &mut Self {
        self.domain.push(Box::new(integrator));
        self
    }

    pub fn add_boundary_face_integrator(
        &mut self,
        integrator: impl FaceVectorIntegrator<T> + Sync + 'a,
    ) -> &mut Self {
        self.boundary_face.push(Box::new(integrator));
        self
    }

    /// Adds a Dirac point load `magnitude * delta(x - point)`. The load is
    /// attributed to the first element containing the point.
    pub fn add_point_source(&mut self, point: Point1<T>, magnitude: T) -> &mut Self {
        self.point_sources.push((point, magnitude));
        self
    }

    fn assemble_local_vector(
        &self,
        index: usize,
        element: &SegmentElement<T>,
        accumulator: &mut DVector<T>,
        scratch: &mut DVector<T>,
    ) -> eyre::Result<()> {
        let n = self.space.element_dof_count(index);
        accumulator.resize_vertically_mut(n, T::zero());
        accumulator.fill(T::zero());
        scratch.resize_vertically_mut(n, T::zero());
        for integrator in &self.domain {
            let quadrature = integrator.quadrature(element);
            integrator.assemble_element_vector_into(
                index,
                element,
                &quadrature,
                (&mut *scratch).into(),
            )?;
            *accumulator += &*scratch;
        }
        Ok(())
    }

    pub fn assemble(&self) -> eyre::Result<DVector<T>> {
        let mut vector = DVector::zeros(self.space.num_dofs());
        let mut accumulator = DVector::zeros(0);
        let mut scratch = DVector::zeros(0);
        let mut dofs = Vec::new();

        if !self.domain.is_empty() {
            for index in 0..self.space.num_elements() {
                let element = self.space.element(index);
                self.assemble_local_vector(index, &element, &mut accumulator, &mut scratch)?;
                dofs.resize(self.space.element_dof_count(index), 0);
                self.space.populate_element_dofs(&mut dofs, index);
                for (local, &dof) in dofs.iter().enumerate() {
                    vector[dof] += accumulator[local];
                }
            }
        }

        if !self.boundary_face.is_empty() {
            let mesh = self.space.mesh();
            for face in mesh.boundary_faces() {
                let element1 = self.space.element(face.element);
                let xi1 = mesh.local_face_coordinate(face.element, face.vertex);
                let context = FaceContext {
                    element1: &element1,
                    element2: None,
                    xi1,
                    xi2: None,
                    normal: xi1 + xi1 - T::one(),
                };
                let n1 = self.space.element_dof_count(face.element);
                scratch.resize_vertically_mut(n1, T::zero());
                dofs.resize(n1, 0);
                self.space.populate_element_dofs(&mut dofs, face.element);
                for integrator in &self.boundary_face {
                    integrator.assemble_face_vector_into(&context, (&mut scratch).into())?;
                    for (local, &dof) in dofs.iter().enumerate() {
                        vector[dof] += scratch[local];
                    }
                }
            }
        }

        for (point, magnitude) in &self.point_sources {
            self.add_point_source_contribution(&mut vector, point, *magnitude)?;
        }
        Ok(vector)
    }

    fn add_point_source_contribution(
        &self,
        vector: &mut DVector<T>,
        point: &Point1<T>,
        magnitude: T,
    ) -> eyre::Result<()> {
        for index in 0..self.space.num_elements() {
            let element = self.space.element(index);
            if element.contains_physical(point) {
                let n = self.space.element_dof_count(index);
                let mut basis = vec![T::zero(); n];
                element.populate_physical_basis(&mut basis, point);
                let mut dofs = vec![0; n];
                self.space.populate_element_dofs(&mut dofs, index);
                for (phi, &dof) in basis.iter().zip(&dofs) {
                    vector[dof] += magnitude * *phi;
                }
                return Ok(());
            }
        }
        Err(eyre!("point source at {:?} lies outside the mesh", point))
    }
}

/// Adds a dense local matrix into the CSR matrix along the given global indices.
///
/// `permutation` is scratch space holding a sorted permutation of the local
/// indices, so each CSR row is merged in a single forward pass.
fn add_local_matrix_to_csr<T: Real>(
    matrix: &mut CsrMatrix<T>,
    dofs: &[usize],
    local: &DMatrix<T>,
    permutation: &mut Vec<usize>,
) {
    permutation.clear();
    permutation.extend(0..dofs.len());
    permutation.sort_unstable_by_key(|&i| dofs[i]);

    for (local_row, &global_row) in dofs.iter().enumerate() {
        let mut row = matrix.row_mut(global_row);
        let (cols, values) = row.cols_and_values_mut();
        let mut k = 0;
        for &p in permutation.iter() {
            let global_col = dofs[p];
            while cols[k] < global_col {
                k += 1;
            }
            debug_assert_eq!(cols[k], global_col);
            values[k] += local[(local_row, p)];
        }
    }
}

/// A matrix-free operator assembled from local blocks.
///
/// Application gathers the local part of the input vector, multiplies by the
/// stored block and scatters the result, so the global matrix is never formed.
pub struct PartialAssemblyOperator<T: Real> {
    dimension: usize,
    blocks: Vec<(Vec<usize>, DMatrix<T>)>,
}

impl<T: Real> PartialAssemblyOperator<T> {
    /// The diagonal of the operator, for use in diagonal preconditioning.
    pub fn diagonal(&self) -> DVector<T> {
        let mut diagonal = DVector::zeros(self.dimension);
        for (dofs, block) in &self.blocks {
            for (local, &dof) in dofs.iter().enumerate() {
                diagonal[dof] += block[(local, local)];
            }
        }
        diagonal
    }
}

impl<T: Real> LinearOperator<T> for PartialAssemblyOperator<T> {
    fn size(&self) -> usize {
        self.dimension
    }

    fn apply_to(&self, y: &mut DVector<T>, x: &DVector<T>) {
        assert_eq!(x.len(), self.dimension);
        assert_eq!(y.len(), self.dimension);
        y.fill(T::zero());
        let mut local_x = DVector::zeros(0);
        let mut local_y = DVector::zeros(0);
        for (dofs, block) in &self.blocks {
            let n = dofs.len();
            local_x.resize_vertically_mut(n, T::zero());
            local_y.resize_vertically_mut(n, T::zero());
            for (local, &dof) in dofs.iter().enumerate() {
                local_x[local] = x[dof];
            }
            block.mul_to(&local_x, &mut local_y);
            for (local, &dof) in dofs.iter().enumerate() {
                y[dof] += local_y[local];
            }
        }
    }
}

/// A statically condensed system for continuous spaces: element-interior degrees
/// of freedom are eliminated through per-element Schur complements, leaving a
/// global system over the vertex degrees of freedom only.
///
/// The condensed degrees of freedom are numbered identically to the mesh
/// vertices, so essential boundary conditions from
/// [`essential_boundary_dofs`](FiniteElementSpace::essential_boundary_dofs)
/// apply to the condensed system unchanged.
pub struct CondensedSystem<T: Real> {
    matrix: CsrMatrix<T>,
    rhs: DVector<T>,
    num_dofs: usize,
    elements: Vec<CondensedElement<T>>,
}

struct CondensedElement<T: Real> {
    exposed_dofs: [usize; 2],
    interior_dofs: Vec<usize>,
    interior_inverse: DMatrix<T>,
    coupling: DMatrix<T>,
    interior_rhs: DVector<T>,
}

impl<T: Real> CondensedSystem<T> {
    /// Condenses a bilinear and linear form over a continuous space.
    ///
    /// The bilinear form must consist of domain integrators only; face coupling
    /// would break the element-local block structure the elimination relies on.
    pub fn assemble(
        bilinear: &BilinearForm<T, H1Space<T>>,
        linear: &LinearForm<T, H1Space<T>>,
    ) -> eyre::Result<Self> {
        if !bilinear.interior_face.is_empty() || !bilinear.boundary_face.is_empty() {
            return Err(eyre!(
                "static condensation requires a bilinear form with domain integrators only"
            ));
        }
        let space = bilinear.space;
        let num_vertices = space.mesh().vertices().len();
        let interior_locals: Vec<usize> = space.interior_local_dofs().collect();
        let num_interior = interior_locals.len();

        // Vertex adjacency pattern
        let mut rows = vec![BTreeSet::new(); num_vertices];
        for conn in space.mesh().connectivity() {
            let [a, b] = *conn.vertex_indices();
            for &i in &[a, b] {
                for &j in &[a, b] {
                    rows[i].insert(j);
                }
            }
        }
        let mut offsets = Vec::with_capacity(num_vertices + 1);
        let mut indices = Vec::new();
        offsets.push(0);
        for row in &rows {
            indices.extend(row.iter().copied());
            offsets.push(indices.len());
        }
        let pattern =
            SparsityPattern::try_from_offsets_and_indices(num_vertices, num_vertices, offsets, indices)
                .map_err(|err| eyre!("invalid sparsity pattern: {:?}", err))?;
        let nnz = pattern.nnz();
        let mut matrix = CsrMatrix::try_from_pattern_and_values(pattern, vec![T::zero(); nnz])
            .map_err(|err| eyre!("CSR construction failed: {:?}", err))?;
        let mut rhs = DVector::zeros(num_vertices);

        let mut accumulator = DMatrix::zeros(0, 0);
        let mut scratch = DMatrix::zeros(0, 0);
        let mut rhs_accumulator = DVector::zeros(0);
        let mut rhs_scratch = DVector::zeros(0);
        let mut permutation = Vec::new();
        let mut elements = Vec::with_capacity(space.num_elements());

        for index in 0..space.num_elements() {
            let element = space.element(index);
            bilinear.assemble_local_matrix(index, &element, &mut accumulator, &mut scratch)?;
            linear.assemble_local_vector(index, &element, &mut rhs_accumulator, &mut rhs_scratch)?;

            let mut dofs = vec![0; space.element_dof_count(index)];
            space.populate_element_dofs(&mut dofs, index);
            let exposed_dofs = [dofs[0], dofs[1]];

            let a_ee = accumulator.view((0, 0), (2, 2)).into_owned();
            let a_ei = accumulator.view((0, 2), (2, num_interior)).into_owned();
            let a_ie = accumulator.view((2, 0), (num_interior, 2)).into_owned();
            let a_ii = accumulator
                .view((2, 2), (num_interior, num_interior))
                .into_owned();
            let b_e = rhs_accumulator.rows(0, 2).into_owned();
            let b_i = rhs_accumulator.rows(2, num_interior).into_owned();

            let interior_inverse = a_ii.try_inverse().ok_or_else(|| {
                eyre!("singular interior block in element {}", index)
            })?;

            let schur = &a_ee - &a_ei * &interior_inverse * &a_ie;
            let condensed_rhs = &b_e - &a_ei * &interior_inverse * &b_i;

            add_local_matrix_to_csr(&mut matrix, &exposed_dofs, &schur, &mut permutation);
            rhs[exposed_dofs[0]] += condensed_rhs[0];
            rhs[exposed_dofs[1]] += condensed_rhs[1];

            elements.push(CondensedElement {
                exposed_dofs,
                interior_dofs: interior_locals.iter().map(|&l| dofs[l]).collect(),
                interior_inverse,
                coupling: a_ie,
                interior_rhs: b_i,
            });
        }

        Ok(Self {
            matrix,
            rhs,
            num_dofs: space.num_dofs(),
            elements,
        })
    }

    pub fn matrix(&self) -> &CsrMatrix<T> {
        &self.matrix
    }

    pub fn matrix_mut(&mut self) -> &mut CsrMatrix<T> {
        &mut self.matrix
    }

    pub fn rhs(&self) -> &DVector<T> {
        &self.rhs
    }

    pub fn rhs_mut(&mut self) -> &mut DVector<T> {
        &mut self.rhs
    }

    /// Recovers the full solution from the condensed (vertex) solution by
    /// back-substituting the eliminated interior degrees of freedom.
    pub fn recover(&self, condensed_solution: &DVector<T>) -> DVector<T> {
        let mut full = DVector::zeros(self.num_dofs);
        for i in 0..condensed_solution.len() {
            full[i] = condensed_solution[i];
        }
        for element in &self.elements {
            let u_e = DVector::from_iterator(
                2,
                element.exposed_dofs.iter().map(|&d| condensed_solution[d]),
            );
            let u_i = &element.interior_inverse * (&element.interior_rhs - &element.coupling * u_e);
            for (local, &dof) in element.interior_dofs.iter().enumerate() {
                full[dof] = u_i[local];
            }
        }
        full
    }
}
