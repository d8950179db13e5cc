//! Convergence of the discontinuous Galerkin upwind transport scheme.
//!
//! The manufactured problem follows the steady transport equation with velocity
//! `v = -1` and solution `u = exp(x)` on the unit interval: the advection term
//! is integrated by parts onto the test function and inflow data is imposed
//! weakly at `x = 1`.

use nalgebra::{DVector, Point1, Vector1};

use varfem::assembly::global::{BilinearForm, LinearForm};
use varfem::assembly::local::{
    AdvectionIntegrator, InflowBoundaryIntegrator, SourceIntegrator, Transposed,
    UpwindFaceIntegrator,
};
use varfem::coefficient::ConstantVector;
use varfem::error::estimate_l2_error;
use varfem::mesh::SegmentMesh;
use varfem::solver::{BlockJacobiPreconditioner, Gmres};
use varfem::space::DgSpace;

fn exact(x: &Point1<f64>) -> f64 {
    x[0].exp()
}

fn solve_transport(num_elements: usize, order: usize) -> (DgSpace<f64>, DVector<f64>) {
    let mesh = SegmentMesh::uniform(num_elements);
    let space = DgSpace::new(mesh, order);

    let velocity = ConstantVector(Vector1::new(-1.0));
    let source = |x: &Point1<f64>| -x[0].exp();

    let (matrix, rhs) = {
        let mut form = BilinearForm::new(&space);
        form.add_domain_integrator(Transposed(AdvectionIntegrator::new(velocity, -1.0)));
        form.add_interior_face_integrator(Transposed(UpwindFaceIntegrator::new(velocity)));
        form.add_boundary_face_integrator(Transposed(UpwindFaceIntegrator::new(velocity)));

        let mut rhs_form = LinearForm::new(&space);
        rhs_form.add_domain_integrator(SourceIntegrator::new(source));
        rhs_form.add_boundary_face_integrator(InflowBoundaryIntegrator::new(velocity, exact));

        (form.assemble_csr().unwrap(), rhs_form.assemble().unwrap())
    };

    let preconditioner = BlockJacobiPreconditioner::from_csr(&matrix, order + 1).unwrap();
    let output = Gmres::new()
        .with_rel_tolerance(1e-12)
        .with_max_iterations(2000)
        .solve_preconditioned(&matrix, &preconditioner, &rhs)
        .unwrap();
    let solution = output.solution;
    (space, solution)
}

#[test]
fn upwind_scheme_resolves_the_manufactured_solution() {
    let (space, solution) = solve_transport(20, 1);
    let error = estimate_l2_error(&space, &solution, &exact);
    assert!(error < 1e-2, "L2 error too large: {}", error);
}

#[test]
fn upwind_scheme_converges_under_refinement() {
    let mut errors = Vec::new();
    for n in [10, 20, 40, 80] {
        let (space, solution) = solve_transport(n, 1);
        errors.push(estimate_l2_error(&space, &solution, &exact));
    }
    for pair in errors.windows(2) {
        assert!(
            pair[1] < pair[0] / 2.0,
            "refinement did not reduce the error: {:?}",
            errors
        );
    }
    // Better than first order overall
    assert!(errors[3] < errors[0] / 16.0);
}

#[test]
fn piecewise_constant_elements_converge_at_first_order() {
    // Order 0 is the upwind finite-volume scheme: no volume term survives, the
    // face fluxes alone propagate the inflow data.
    let mut errors = Vec::new();
    for n in [10, 20, 40] {
        let (space, solution) = solve_transport(n, 0);
        errors.push(estimate_l2_error(&space, &solution, &exact));
    }
    assert!(errors[0] < 0.2, "L2 error too large: {:?}", errors);
    for pair in errors.windows(2) {
        assert!(
            pair[1] < pair[0] / 1.8,
            "refinement did not reduce the error: {:?}",
            errors
        );
    }
}

#[test]
fn higher_order_elements_are_sharper_on_the_same_mesh() {
    let (space1, solution1) = solve_transport(16, 1);
    let (space2, solution2) = solve_transport(16, 2);
    let error1 = estimate_l2_error(&space1, &solution1, &exact);
    let error2 = estimate_l2_error(&space2, &solution2, &exact);
    assert!(error2 < error1 / 10.0);
}
