use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::{archive::ArchiverKind, settings::BenchConfig};

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    #[value(alias("jsonl"))]
    JsonLines,
}

/// Options shared by the tools that run the model checker.
/// Anything given here overrides the configuration files and the environment.
#[derive(Args, Debug, Default)]
pub struct CommonArgs {
    /// Path to the model checker (CBMC)
    #[arg(long)]
    pub cbmc: Option<PathBuf>,
    /// The C program of the puzzle
    #[arg(long)]
    pub source: Option<PathBuf>,
    /// Directory to write the artifacts to
    #[arg(short = 'd', long)]
    pub workdir: Option<PathBuf>,
    /// The C type of the numbers in the puzzle, e.g., "unsigned int"
    #[arg(long)]
    pub int_type: Option<String>,
    /// Loop unwinding bound of the model checker
    #[arg(long)]
    pub unwind: Option<u32>,
    /// Depth bound of the model checker
    #[arg(long)]
    pub depth: Option<u32>,
}

impl CommonArgs {
    pub fn apply(&self, config: &mut BenchConfig) {
        override_with(&mut config.cbmc, &self.cbmc);
        override_with(&mut config.encoding.source, &self.source);
        override_with(&mut config.workdir, &self.workdir);
        override_with(&mut config.encoding.int_type, &self.int_type);
        override_with(&mut config.encoding.unwind, &self.unwind);
        override_with(&mut config.encoding.depth, &self.depth);
    }
}

/// Options of the benchmark sweep.
#[derive(Args, Debug, Default)]
pub struct SweepArgs {
    /// The SAT solver deciding whether an instance is kept
    #[arg(long)]
    pub solver: Option<PathBuf>,
    /// Additional solvers to measure on every instance, without affecting what is kept
    #[arg(long = "compare-with")]
    pub comparison_solvers: Vec<PathBuf>,
    /// CPU time limit of the solver in seconds, 0 means no limit
    #[arg(long)]
    pub cpu_limit: Option<u64>,
    /// Wall-clock limit of the solver in seconds, 0 means no limit
    #[arg(long)]
    pub wall_timeout: Option<u64>,
    /// How unsolved instances are compressed
    #[arg(long)]
    pub archiver: Option<ArchiverKind>,
    /// Goals around which the sweep happens
    #[arg(long = "goal", value_delimiter = ',', allow_negative_numbers = true)]
    pub base_goals: Vec<i64>,
    /// Goals in `base - radius .. base + radius` are generated
    #[arg(long)]
    pub goal_radius: Option<i64>,
    /// Step counts to generate
    #[arg(long, value_delimiter = ',')]
    pub steps: Vec<u32>,
    /// The input numbers of the puzzles
    #[arg(long, value_delimiter = ',')]
    pub inputs: Vec<u64>,
}

impl SweepArgs {
    pub fn apply(&self, config: &mut BenchConfig) {
        override_with(&mut config.solver, &self.solver);
        config
            .comparison_solvers
            .extend(self.comparison_solvers.iter().cloned());
        override_with(&mut config.cpu_limit_s, &self.cpu_limit);
        if self.wall_timeout.is_some() {
            config.wall_timeout_s = self.wall_timeout;
        }
        override_with(&mut config.archiver, &self.archiver);
        override_with(&mut config.sweep.goal_radius, &self.goal_radius);
        override_with_list(&mut config.sweep.base_goals, &self.base_goals);
        override_with_list(&mut config.sweep.steps, &self.steps);
        override_with_list(&mut config.sweep.inputs, &self.inputs);
    }
}

fn override_with<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

fn override_with_list<T: Clone>(target: &mut Vec<T>, values: &[T]) {
    if !values.is_empty() {
        *target = values.to_vec();
    }
}
