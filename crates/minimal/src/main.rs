use std::process::ExitCode;

use tnlp_minimal::{MinimalNlp, RunError, exit_status, run};
use tnlp_solvers::Application;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("Minimal NLP example");
    println!("Minimize: (x-2)^2");
    println!("Subject to: x >= 0");
    println!("Starting point: x = 5");

    let mut app = application();
    app.set_option("print_level", 5);

    let mut problem = MinimalNlp::new();
    let outcome = run(&mut app, &mut problem);

    if let Some(final_point) = problem.solution() {
        println!("\n=== Solution ===");
        println!("x = {}", final_point.x[0]);
        println!("f(x) = {}", final_point.objective);
        println!("Expected: x = 2.0, f(x) = 0.0");
    }

    match &outcome {
        Ok(_) => println!("\nOptimization succeeded!"),
        Err(RunError::Initialize(error)) => {
            log::error!("{error}");
            eprintln!("initialization failed!");
        }
        Err(RunError::Optimize(error)) => eprintln!("\nOptimization failed: {error}"),
        Err(RunError::Failed(status)) => {
            eprintln!("\nOptimization failed with status {status}");
        }
    }

    ExitCode::from(exit_status(&outcome))
}

#[cfg(not(feature = "ipopt"))]
fn application() -> Application<tnlp_solvers::ProjectedNewton> {
    Application::new(tnlp_solvers::ProjectedNewton)
}

#[cfg(feature = "ipopt")]
fn application() -> Application<tnlp_solvers::ipopt::IpoptBackend> {
    let mut app = Application::new(tnlp_solvers::ipopt::IpoptBackend);
    app.set_option("linear_solver", "mumps")
        .set_option("mu_strategy", "adaptive");
    app
}
