//! Distance-to-boundary computation through the heat-kernel (Varadhan)
//! approach: solve the screened Poisson problem `w - t w'' = 0` with `w = 1`
//! on the boundary, then transform `u = -sqrt(t) ln w`. As `t -> 0`, `u`
//! approaches the distance to the boundary, `min(x, 1 - x)` on the unit
//! interval.

use std::process::exit;

use nalgebra::Point1;

use varfem::assembly::bc::{apply_dirichlet_csr, ConstrainedOperator};
use varfem::assembly::global::{BilinearForm, CondensedSystem, LinearForm};
use varfem::assembly::local::{DiffusionIntegrator, MassIntegrator};
use varfem::coefficient::Constant;
use varfem::error::{estimate_l1_error, estimate_max_error};
use varfem::mesh::SegmentMesh;
use varfem::solver::{AlgebraicMultigrid, ConjugateGradient, JacobiPreconditioner};
use varfem::space::{FiniteElementSpace, H1Space};

struct Options {
    num_elements: usize,
    order: usize,
    refinements: usize,
    t: f64,
    static_condensation: bool,
    partial_assembly: bool,
}

fn usage() -> ! {
    eprintln!("usage: distance [-n <elements>] [-o <order>] [-rs <refinements>] [-t <t>] [-sc] [-pa]");
    eprintln!("  -n   number of elements of the initial mesh (default 10)");
    eprintln!("  -o   polynomial order (default 2)");
    eprintln!("  -rs  uniform refinement levels (default 2)");
    eprintln!("  -t   heat-kernel parameter (default 1e-2)");
    eprintln!("  -sc  eliminate element-interior unknowns by static condensation");
    eprintln!("  -pa  matrix-free operator with Jacobi preconditioning");
    exit(1);
}

fn parse_value<T: std::str::FromStr>(args: &mut impl Iterator<Item = String>) -> T {
    args.next()
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| usage())
}

fn parse_options() -> Options {
    let mut options = Options {
        num_elements: 10,
        order: 2,
        refinements: 2,
        t: 1e-2,
        static_condensation: false,
        partial_assembly: false,
    };
    let mut args = std::env::args().skip(1);
    while let Some(flag) = args.next() {
        match flag.as_str() {
            "-n" => options.num_elements = parse_value(&mut args),
            "-o" => options.order = parse_value(&mut args),
            "-rs" => options.refinements = parse_value(&mut args),
            "-t" => options.t = parse_value(&mut args),
            "-sc" => options.static_condensation = true,
            "-pa" => options.partial_assembly = true,
            _ => usage(),
        }
    }
    if options.order < 1 || options.num_elements == 0 || options.t <= 0.0 {
        usage();
    }
    if options.static_condensation && options.partial_assembly {
        eprintln!("-sc and -pa are mutually exclusive");
        exit(1);
    }
    options
}

fn main() -> eyre::Result<()> {
    let options = parse_options();

    let mut mesh = SegmentMesh::uniform(options.num_elements);
    for _ in 0..options.refinements {
        mesh.refine_uniformly();
    }
    let space = H1Space::new(mesh, options.order);
    println!(
        "screened Poisson on {} elements, order {}, {} unknowns, t = {}",
        space.num_elements(),
        options.order,
        space.num_dofs(),
        options.t
    );

    let mut form = BilinearForm::new(&space);
    form.add_domain_integrator(MassIntegrator::new(Constant(1.0)));
    form.add_domain_integrator(DiffusionIntegrator::new(Constant(options.t)));
    let rhs_form = LinearForm::new(&space);

    let boundary_values: Vec<(usize, f64)> = space
        .essential_boundary_dofs(&[true, true])
        .into_iter()
        .map(|dof| (dof, 1.0))
        .collect();

    let cg = ConjugateGradient::new()
        .with_rel_tolerance(1e-12)
        .with_max_iterations(5000);

    let w = if options.partial_assembly {
        let operator = form.assemble_operator()?;
        let constrained = ConstrainedOperator::new(&operator, &boundary_values);
        let mut rhs = rhs_form.assemble()?;
        constrained.eliminate_rhs(&mut rhs);

        let mut diagonal = operator.diagonal();
        for &(dof, _) in &boundary_values {
            diagonal[dof] = 1.0;
        }
        let jacobi = JacobiPreconditioner::from_diagonal(diagonal)?;
        let output = cg.solve_preconditioned(&constrained, &jacobi, &rhs)?;
        println!("cg converged in {} iterations (matrix-free)", output.iterations);
        output.solution
    } else if options.static_condensation {
        let mut condensed = CondensedSystem::assemble(&form, &rhs_form)?;
        let mut rhs = condensed.rhs().clone();
        apply_dirichlet_csr(condensed.matrix_mut(), &mut rhs, &boundary_values);
        let amg = AlgebraicMultigrid::new(condensed.matrix())?;
        let output = cg.solve_preconditioned(condensed.matrix(), &amg, &rhs)?;
        println!("cg converged in {} iterations (condensed)", output.iterations);
        condensed.recover(&output.solution)
    } else {
        let mut matrix = form.assemble_csr_par()?;
        let mut rhs = rhs_form.assemble()?;
        apply_dirichlet_csr(&mut matrix, &mut rhs, &boundary_values);
        let amg = AlgebraicMultigrid::new(&matrix)?;
        let output = cg.solve_preconditioned(&matrix, &amg, &rhs)?;
        println!("cg converged in {} iterations", output.iterations);
        output.solution
    };

    // Varadhan transform: u = -sqrt(t) ln w
    let sqrt_t = options.t.sqrt();
    let u = w.map(|w_i| -sqrt_t * w_i.max(f64::MIN_POSITIVE).ln());

    let exact = |x: &Point1<f64>| x[0].min(1.0 - x[0]);
    let l1 = estimate_l1_error(&space, &u, &exact);
    let max = estimate_max_error(&space, &u, &exact);
    println!("distance error vs min(x, 1 - x): L1 = {:.3e}, max = {:.3e}", l1, max);
    Ok(())
}
