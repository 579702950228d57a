use std::{path::PathBuf, process::ExitCode};

use clap::Parser;

use common::log_error;
use orchestrator::{args::CommonArgs, encode, settings};

/// Produces the SMT2 encodings (one per array UF mode) of the puzzle
/// described by the name of a CNF artifact, e.g., `summle_X8651_steps8_I1-2-2-4-4-8-25-100.cnf.gz`.
#[derive(Parser, Debug)]
#[command(name = "summle-smt2-from-cnf")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
    /// The CNF artifact (only its name is used)
    cnf_file: PathBuf,
}

fn main() -> ExitCode {
    orchestrator::logging::init_logging();

    let args = Args::parse();
    let mut config = match settings::load_config() {
        Ok(config) => config,
        Err(e) => {
            log_error!("Failed to read configurations: {e}");
            return ExitCode::FAILURE;
        }
    };
    args.common.apply(&mut config);

    if let Err(e) = std::fs::create_dir_all(&config.workdir) {
        log_error!(
            "Could not create the output directory {}: {e}",
            config.workdir.display()
        );
        return ExitCode::FAILURE;
    }

    let encoder = encode::Encoder::new(&config.cbmc, config.encoding.clone());
    match encode::smt2_from_artifact(&encoder, &args.cnf_file, &config.workdir) {
        Ok(outputs) => {
            outputs
                .iter()
                .for_each(|output| println!("{}", output.display()));
            ExitCode::SUCCESS
        }
        Err(e) => {
            log_error!("{e}");
            ExitCode::FAILURE
        }
    }
}
