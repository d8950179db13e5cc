//! Convergence of the heat-kernel distance computation on the unit interval.
//!
//! The screened Poisson problem `w - t w'' = 0`, `w(0) = w(1) = 1` has the
//! closed-form solution `w(x) = cosh((x - 1/2) / sqrt(t)) / cosh(1 / (2 sqrt(t)))`,
//! which the discrete solution must approach under refinement. The transformed
//! field `u = -sqrt(t) ln w` approximates the boundary distance `min(x, 1 - x)`
//! up to a fixed defect of order `sqrt(t)` at the midpoint, so its error
//! plateaus near `sqrt(t) ln 2` rather than vanishing.

use nalgebra::{DVector, Point1};

use varfem::assembly::bc::{apply_dirichlet_csr, ConstrainedOperator};
use varfem::assembly::global::{BilinearForm, LinearForm};
use varfem::assembly::local::{DiffusionIntegrator, MassIntegrator};
use varfem::coefficient::Constant;
use varfem::error::{estimate_l1_error, estimate_l2_error, estimate_max_error};
use varfem::mesh::SegmentMesh;
use varfem::solver::{AlgebraicMultigrid, ConjugateGradient, JacobiPreconditioner};
use varfem::space::{FiniteElementSpace, H1Space};

const T_PARAM: f64 = 1e-2;

fn screened_poisson_solution(num_elements: usize, order: usize) -> (H1Space<f64>, DVector<f64>) {
    let mesh = SegmentMesh::uniform(num_elements);
    let space = H1Space::new(mesh, order);

    let (mut matrix, mut rhs) = {
        let mut form = BilinearForm::new(&space);
        form.add_domain_integrator(MassIntegrator::new(Constant(1.0)));
        form.add_domain_integrator(DiffusionIntegrator::new(Constant(T_PARAM)));
        let rhs_form = LinearForm::new(&space);
        (form.assemble_csr().unwrap(), rhs_form.assemble().unwrap())
    };

    let bcs: Vec<(usize, f64)> = space
        .essential_boundary_dofs(&[true, true])
        .into_iter()
        .map(|dof| (dof, 1.0))
        .collect();
    apply_dirichlet_csr(&mut matrix, &mut rhs, &bcs);

    let amg = AlgebraicMultigrid::new(&matrix).unwrap();
    let output = ConjugateGradient::new()
        .with_rel_tolerance(1e-12)
        .with_max_iterations(5000)
        .solve_preconditioned(&matrix, &amg, &rhs)
        .unwrap();
    (space, output.solution)
}

fn exact_w(x: &Point1<f64>) -> f64 {
    let s = T_PARAM.sqrt();
    ((x[0] - 0.5) / s).cosh() / (1.0 / (2.0 * s)).cosh()
}

#[test]
fn screened_poisson_converges_to_the_closed_form_solution() {
    let mut errors = Vec::new();
    for n in [8, 16, 32, 64] {
        let (space, w) = screened_poisson_solution(n, 2);
        errors.push(estimate_l2_error(&space, &w, &exact_w));
    }
    for pair in errors.windows(2) {
        assert!(
            pair[1] < pair[0] / 2.5,
            "refinement did not reduce the error: {:?}",
            errors
        );
    }
    assert!(errors.last().unwrap() < &1e-4);
}

#[test]
fn transformed_field_approximates_the_boundary_distance() {
    let (space, w) = screened_poisson_solution(64, 2);
    let sqrt_t = T_PARAM.sqrt();
    let u = w.map(|w_i| -sqrt_t * w_i.max(f64::MIN_POSITIVE).ln());

    let distance = |x: &Point1<f64>| x[0].min(1.0 - x[0]);
    let max_error = estimate_max_error(&space, &u, &distance);
    let l1_error = estimate_l1_error(&space, &u, &distance);

    // The Varadhan transform carries an O(sqrt(t)) defect where the two
    // boundary contributions overlap; ln(2) sqrt(t) at the midpoint
    assert!(max_error < 2.0 * sqrt_t);
    assert!(max_error > 0.5 * sqrt_t * 2.0f64.ln());
    assert!(l1_error < max_error);
}

#[test]
fn matrix_free_path_matches_the_assembled_path() {
    let mesh = SegmentMesh::uniform(32);
    let space = H1Space::new(mesh, 2);

    let mut form = BilinearForm::new(&space);
    form.add_domain_integrator(MassIntegrator::new(Constant(1.0)));
    form.add_domain_integrator(DiffusionIntegrator::new(Constant(T_PARAM)));
    let rhs_form = LinearForm::new(&space);

    let bcs: Vec<(usize, f64)> = space
        .essential_boundary_dofs(&[true, true])
        .into_iter()
        .map(|dof| (dof, 1.0))
        .collect();
    let cg = ConjugateGradient::new()
        .with_rel_tolerance(1e-12)
        .with_max_iterations(5000);

    let mut matrix = form.assemble_csr().unwrap();
    let mut rhs = rhs_form.assemble().unwrap();
    apply_dirichlet_csr(&mut matrix, &mut rhs, &bcs);
    let assembled = cg.solve(&matrix, &rhs).unwrap().solution;

    let operator = form.assemble_operator().unwrap();
    let constrained = ConstrainedOperator::new(&operator, &bcs);
    let mut free_rhs = rhs_form.assemble().unwrap();
    constrained.eliminate_rhs(&mut free_rhs);
    let mut diagonal = operator.diagonal();
    for &(dof, _) in &bcs {
        diagonal[dof] = 1.0;
    }
    let jacobi = JacobiPreconditioner::from_diagonal(diagonal).unwrap();
    let matrix_free = cg
        .solve_preconditioned(&constrained, &jacobi, &free_rhs)
        .unwrap()
        .solution;

    assert!((assembled - matrix_free).amax() < 1e-8);
}
