//! Command-line front-end for the pipeline simulator.
//!
//! Loads an assembly program, runs it to completion on the pipelined
//! engine, and prints the final register values and a diagnostics summary.

use std::path::PathBuf;
use std::process;

use clap::Parser;

use riscv_pipesim::config::Config;
use riscv_pipesim::core::Engine;

#[derive(Parser, Debug)]
#[command(about = "Cycle-accurate five-stage RISC-V 32I pipeline simulator")]
struct Args {
    /// Assembly source file to load and run.
    program: PathBuf,

    /// Optional TOML config (memory sizing, latency table).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("failed to load config '{}': {err}", path.display());
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    let mut engine = match Engine::from_config(&config) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("failed to create engine: {err}");
            process::exit(1);
        }
    };

    if let Err(err) = engine.load_program(&args.program) {
        eprintln!("failed to load '{}': {err}", args.program.display());
        process::exit(1);
    }

    let result = engine.run_pipelined();

    let regs = engine.registers();
    for i in (0..32).step_by(2) {
        println!("x{:<2} = {:<11} x{:<2} = {}", i, regs[i], i + 1, regs[i + 1]);
    }
    print!("{}", engine.diagnostics().summary());

    if let Err(err) = result {
        eprintln!("execution fault: {err}");
        process::exit(1);
    }
}
