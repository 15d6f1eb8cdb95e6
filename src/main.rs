//! Command-line entry point.
//!
//! Usage: `hdg [config.toml]` (default `hdg.toml`). Exit codes: 0 on
//! completion, 1 on CLI misuse, 2 on configuration or integration failure
//! with a diagnostic on stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use hdg_rs::output::{PlotFiles, DEFAULT_SAMPLES};
use hdg_rs::time::allocate_initial_state;
use hdg_rs::{BackwardEuler, RunConfig, TransientOptions};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = match args.len() {
        0 => PathBuf::from("hdg.toml"),
        1 => PathBuf::from(&args[0]),
        _ => {
            eprintln!("Usage: hdg [config.toml]");
            return ExitCode::from(1);
        }
    };

    match run(&config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::from(2)
        }
    }
}

fn run(config_path: &std::path::Path) -> Result<(), String> {
    let config = RunConfig::from_file(config_path).map_err(|e| e.to_string())?;
    let (mut system, profile) = config.build().map_err(|e| e.to_string())?;

    let (mut y, mut yp) =
        allocate_initial_state(&mut system, &profile).map_err(|e| e.to_string())?;

    let mut plots =
        PlotFiles::create(config_path, config.n_vars).map_err(|e| e.to_string())?;
    plots
        .write_frames(&system, 0.0, DEFAULT_SAMPLES, &y, &yp)
        .map_err(|e| e.to_string())?;

    let driver = BackwardEuler::new(TransientOptions {
        rtol: config.rtol,
        atol: config.atol,
        ..Default::default()
    });

    // internal step is half the print interval; a final time shorter than
    // one interval prints a single frame at t_final
    let print_dt = config.delta_t.min(config.t_final);
    let step_dt = print_dt * 0.5;

    let mut t = 0.0;
    while t < config.t_final - 1e-12 * config.t_final {
        let t_next = (t + print_dt).min(config.t_final);
        driver
            .advance(&mut system, t, t_next, step_dt, &mut y, &mut yp)
            .map_err(|e| format!("integration failed: {}", e))?;
        t = t_next;
        println!("t = {}", t);
        plots
            .write_frames(&system, t, DEFAULT_SAMPLES, &y, &yp)
            .map_err(|e| e.to_string())?;
    }

    plots.flush().map_err(|e| e.to_string())?;
    Ok(())
}
