use matrixcompare::assert_matrix_eq;
use nalgebra::{DMatrix, DVector, Point1};

use nalgebra::Vector1;

use varfem::assembly::global::{BilinearForm, CondensedSystem, LinearForm};
use varfem::assembly::local::{
    AdvectionIntegrator, DiffusionIntegrator, ElementMatrixIntegrator, MassIntegrator,
    SourceIntegrator, Transposed,
};
use varfem::assembly::bc::apply_dirichlet_csr;
use varfem::coefficient::{Constant, VectorFunction};
use varfem::element::SegmentElement;
use varfem::mesh::SegmentMesh;
use varfem::solver::{ConjugateGradient, LinearOperator};
use varfem::space::{FiniteElementSpace, H1Space};

#[test]
fn linear_mass_matrix_matches_closed_form() {
    // For P1 elements of size h the element mass matrix is h/6 [[2, 1], [1, 2]]
    let n = 4;
    let h = 1.0 / n as f64;
    let mesh = SegmentMesh::uniform(n);
    let space = H1Space::new(mesh, 1);
    let mut form = BilinearForm::new(&space);
    form.add_domain_integrator(MassIntegrator::new(Constant(1.0)));
    let matrix = DMatrix::from(&form.assemble_csr().unwrap());

    assert!((matrix[(0, 0)] - 2.0 * h / 6.0).abs() < 1e-14);
    assert!((matrix[(0, 1)] - h / 6.0).abs() < 1e-14);
    assert!((matrix[(1, 1)] - 4.0 * h / 6.0).abs() < 1e-14);
    assert!((matrix[(1, 2)] - h / 6.0).abs() < 1e-14);
    assert_matrix_eq!(matrix, matrix.transpose(), comp = abs, tol = 1e-15);
}

#[test]
fn linear_stiffness_matrix_matches_closed_form() {
    // For P1 elements of size h the element stiffness matrix is 1/h [[1, -1], [-1, 1]]
    let n = 5;
    let h = 1.0 / n as f64;
    let mesh = SegmentMesh::uniform(n);
    let space = H1Space::new(mesh, 1);
    let mut form = BilinearForm::new(&space);
    form.add_domain_integrator(DiffusionIntegrator::new(Constant(1.0)));
    let matrix = DMatrix::from(&form.assemble_csr().unwrap());

    assert!((matrix[(0, 0)] - 1.0 / h).abs() < 1e-12);
    assert!((matrix[(1, 1)] - 2.0 / h).abs() < 1e-12);
    assert!((matrix[(1, 2)] + 1.0 / h).abs() < 1e-12);
    // Constants lie in the kernel of the interior rows
    let ones = DVector::from_element(space.num_dofs(), 1.0);
    let action = &matrix * &ones;
    for i in 1..n {
        assert!(action[i].abs() < 1e-12);
    }
}

#[test]
fn advection_element_matrix_matches_closed_form() {
    // On [0, 1] with P1 shapes and v(x) = x, the entries are
    // integrals of phi_i phi_j' x: [[-1/6, 1/6], [-1/3, 1/3]]
    let element = SegmentElement::from_interval([0.0, 1.0], 1);
    let velocity = VectorFunction(|x: &Point1<f64>| Vector1::new(x[0]));
    let integrator = AdvectionIntegrator::new(velocity, 1.0);
    let quadrature = integrator.quadrature(&element);

    let mut matrix = DMatrix::zeros(2, 2);
    integrator
        .assemble_element_matrix_into(0, &element, &quadrature, (&mut matrix).into())
        .unwrap();
    let expected = DMatrix::from_row_slice(2, 2, &[-1.0 / 6.0, 1.0 / 6.0, -1.0 / 3.0, 1.0 / 3.0]);
    assert_matrix_eq!(matrix, expected, comp = abs, tol = 1e-14);

    let transposed = Transposed(AdvectionIntegrator::new(
        VectorFunction(|x: &Point1<f64>| Vector1::new(x[0])),
        1.0,
    ));
    let mut matrix_t = DMatrix::zeros(2, 2);
    transposed
        .assemble_element_matrix_into(0, &element, &quadrature, (&mut matrix_t).into())
        .unwrap();
    assert_matrix_eq!(matrix_t, expected.transpose(), comp = abs, tol = 1e-14);
}

#[test]
fn parallel_assembly_agrees_with_serial_assembly() {
    let mesh = SegmentMesh::uniform(17);
    let space = H1Space::new(mesh, 3);
    let mut form = BilinearForm::new(&space);
    form.add_domain_integrator(MassIntegrator::new(Constant(1.0)));
    form.add_domain_integrator(DiffusionIntegrator::new(Constant(0.5)));

    let serial = form.assemble_csr().unwrap();
    let parallel = form.assemble_csr_par().unwrap();
    assert_matrix_eq!(serial, parallel, comp = abs, tol = 0.0);
}

#[test]
fn matrix_free_operator_matches_assembled_matrix() {
    let mesh = SegmentMesh::uniform(9);
    let space = H1Space::new(mesh, 2);
    let mut form = BilinearForm::new(&space);
    form.add_domain_integrator(MassIntegrator::new(Constant(2.0)));
    form.add_domain_integrator(DiffusionIntegrator::new(Constant(0.1)));

    let matrix = form.assemble_csr().unwrap();
    let operator = form.assemble_operator().unwrap();

    let x = DVector::from_fn(space.num_dofs(), |i, _| ((i * 7 % 13) as f64) - 6.0);
    let mut y_matrix = DVector::zeros(space.num_dofs());
    let mut y_operator = DVector::zeros(space.num_dofs());
    matrix.apply_to(&mut y_matrix, &x);
    operator.apply_to(&mut y_operator, &x);
    assert!((y_matrix - y_operator).amax() < 1e-12);

    // The diagonal of the operator matches the assembled diagonal
    let diagonal = operator.diagonal();
    let dense = DMatrix::from(&matrix);
    for i in 0..space.num_dofs() {
        assert!((diagonal[i] - dense[(i, i)]).abs() < 1e-13);
    }
}

#[test]
fn condensed_solve_agrees_with_full_solve() {
    // Screened Poisson with a source, cubic elements: eliminate interior dofs
    // and verify the recovered solution matches the uncondensed solve.
    let mesh = SegmentMesh::uniform(8);
    let space = H1Space::new(mesh, 3);
    let source = |x: &Point1<f64>| (2.0 * x[0]).cos();

    let mut form = BilinearForm::new(&space);
    form.add_domain_integrator(MassIntegrator::new(Constant(1.0)));
    form.add_domain_integrator(DiffusionIntegrator::new(Constant(0.3)));
    let mut rhs_form = LinearForm::new(&space);
    rhs_form.add_domain_integrator(SourceIntegrator::new(source));

    let bcs: Vec<_> = space
        .essential_boundary_dofs(&[true, true])
        .into_iter()
        .map(|dof| (dof, 1.0))
        .collect();
    let cg = ConjugateGradient::new()
        .with_rel_tolerance(1e-14)
        .with_max_iterations(1000);

    let mut matrix = form.assemble_csr().unwrap();
    let mut rhs = rhs_form.assemble().unwrap();
    apply_dirichlet_csr(&mut matrix, &mut rhs, &bcs);
    let full = cg.solve(&matrix, &rhs).unwrap().solution;

    let mut condensed = CondensedSystem::assemble(&form, &rhs_form).unwrap();
    let mut condensed_rhs = condensed.rhs().clone();
    apply_dirichlet_csr(condensed.matrix_mut(), &mut condensed_rhs, &bcs);
    let vertex_solution = cg.solve(condensed.matrix(), &condensed_rhs).unwrap().solution;
    let recovered = condensed.recover(&vertex_solution);

    assert!((full - recovered).amax() < 1e-9);
}

#[test]
fn point_source_loads_the_containing_element() {
    let mesh = SegmentMesh::uniform(4);
    let space = H1Space::new(mesh, 1);
    let mut rhs_form = LinearForm::new(&space);
    rhs_form.add_point_source(Point1::new(0.375_f64), 2.0);
    let rhs = rhs_form.assemble().unwrap();

    // x = 0.375 is the midpoint of element [0.25, 0.5]: both hat functions get
    // half the magnitude
    assert!((rhs[1] - 1.0).abs() < 1e-14);
    assert!((rhs[2] - 1.0).abs() < 1e-14);
    assert!(rhs[0].abs() < 1e-14);
    assert!(rhs[3].abs() < 1e-14);
}

#[test]
fn point_source_outside_the_mesh_is_an_error() {
    let mesh = SegmentMesh::uniform(4);
    let space = H1Space::new(mesh, 1);
    let mut rhs_form = LinearForm::new(&space);
    rhs_form.add_point_source(Point1::new(1.5_f64), 1.0);
    assert!(rhs_form.assemble().is_err());
}
