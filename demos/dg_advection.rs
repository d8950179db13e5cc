//! Steady linear transport on the unit interval, discretized with a
//! discontinuous Galerkin upwind scheme: `v . grad u = f` with velocity
//! `v = -1`, manufactured solution `u = exp(x)` and weak inflow data at
//! `x = 1`. The advection term is integrated by parts onto the test function,
//! so the volume term appears transposed and the upwind flux couples the
//! element traces.

use std::process::exit;

use nalgebra::{Point1, Vector1};

use varfem::assembly::global::{BilinearForm, LinearForm};
use varfem::assembly::local::{
    AdvectionIntegrator, InflowBoundaryIntegrator, SourceIntegrator, Transposed,
    UpwindFaceIntegrator,
};
use varfem::coefficient::ConstantVector;
use varfem::error::estimate_l2_error;
use varfem::mesh::SegmentMesh;
use varfem::solver::{BlockJacobiPreconditioner, Gmres};
use varfem::space::{DgSpace, FiniteElementSpace};

fn usage() -> ! {
    eprintln!("usage: dg_advection [-n <elements>] [-o <order>]");
    eprintln!("  -n   number of elements (default 20)");
    eprintln!("  -o   polynomial order, 0 for piecewise constants (default 1)");
    exit(1);
}

fn parse_value<T: std::str::FromStr>(args: &mut impl Iterator<Item = String>) -> T {
    args.next()
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| usage())
}

fn main() -> eyre::Result<()> {
    let mut num_elements = 20usize;
    let mut order = 1usize;
    let mut args = std::env::args().skip(1);
    while let Some(flag) = args.next() {
        match flag.as_str() {
            "-n" => num_elements = parse_value(&mut args),
            "-o" => order = parse_value(&mut args),
            _ => usage(),
        }
    }
    if num_elements == 0 {
        usage();
    }

    let mesh = SegmentMesh::uniform(num_elements);
    let space = DgSpace::new(mesh, order);
    println!(
        "dg transport on {} elements, order {}, {} unknowns",
        space.num_elements(),
        order,
        space.num_dofs()
    );

    let velocity = ConstantVector(Vector1::new(-1.0));
    let exact = |x: &Point1<f64>| x[0].exp();
    let source = |x: &Point1<f64>| -x[0].exp();

    let mut form = BilinearForm::new(&space);
    form.add_domain_integrator(Transposed(AdvectionIntegrator::new(velocity, -1.0)));
    form.add_interior_face_integrator(Transposed(UpwindFaceIntegrator::new(velocity)));
    form.add_boundary_face_integrator(Transposed(UpwindFaceIntegrator::new(velocity)));

    let mut rhs_form = LinearForm::new(&space);
    rhs_form.add_domain_integrator(SourceIntegrator::new(source));
    rhs_form.add_boundary_face_integrator(InflowBoundaryIntegrator::new(velocity, exact));

    let matrix = form.assemble_csr()?;
    let rhs = rhs_form.assemble()?;

    let preconditioner = BlockJacobiPreconditioner::from_csr(&matrix, order + 1)?;
    let output = Gmres::new()
        .with_rel_tolerance(1e-12)
        .with_max_iterations(2000)
        .solve_preconditioned(&matrix, &preconditioner, &rhs)?;
    println!("gmres converged in {} iterations", output.iterations);

    let l2 = estimate_l2_error(&space, &output.solution, &exact);
    println!("L2 error vs exp(x): {:.3e}", l2);
    Ok(())
}
