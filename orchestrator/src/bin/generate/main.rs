use std::process::ExitCode;

use clap::Parser;

use common::{log_error, log_info};
use orchestrator::{
    archive,
    args::{CommonArgs, OutputFormat, SweepArgs},
    encode::Encoder,
    settings::{self, BenchConfig},
    solve::Solver,
    sweep::Sweeper,
};

/// Generates hard summle benchmarks: every puzzle of the sweep is encoded into CNF
/// and kept (compressed) only if the solver cannot settle it within the limits.
#[derive(Parser, Debug)]
#[command(name = "summle-generate")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
    #[command(flatten)]
    sweep: SweepArgs,
    /// The format of the per-instance report printed on the standard output
    #[arg(long, default_value = "csv")]
    output_format: OutputFormat,
    /// Do not print the per-instance report
    #[arg(short, long, action)]
    silent: bool,
}

fn main() -> ExitCode {
    orchestrator::logging::init_logging();

    let args = Args::parse();
    let config = match settings::load_config() {
        Ok(mut config) => {
            args.common.apply(&mut config);
            args.sweep.apply(&mut config);
            config
        }
        Err(e) => {
            log_error!("Failed to read configurations: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = std::fs::create_dir_all(&config.workdir) {
        log_error!(
            "Could not create the output directory {}: {e}",
            config.workdir.display()
        );
        return ExitCode::FAILURE;
    }

    let sweeper = build_sweeper(&config, (!args.silent).then_some(args.output_format));
    log_info!(
        "Starting the sweep with {} puzzles",
        config.sweep.puzzles().count()
    );
    sweeper.run(&config.sweep);
    ExitCode::SUCCESS
}

fn build_sweeper(config: &BenchConfig, output_format: Option<OutputFormat>) -> Sweeper {
    let limits = config.solver_limits();
    Sweeper {
        encoder: Encoder::new(&config.cbmc, config.encoding.clone()),
        solver: Solver::new(&config.solver, limits),
        comparison_solvers: config
            .comparison_solvers
            .iter()
            .map(|s| Solver::new(s, limits))
            .collect(),
        archiver: archive::archiver(config.archiver, &config.gzip),
        workdir: config.workdir.clone(),
        output_format,
    }
}
