use std::{
    io,
    path::{Path, PathBuf},
};

use derive_more as dm;

use crate::utils::{CallParams, Limits, Measurement, OutputSink, measure_call};

/// Exit code of SAT solvers (minisat convention) for a satisfiable formula.
pub const EXIT_SAT: i32 = 10;
/// Exit code of SAT solvers (minisat convention) for an unsatisfiable formula.
pub const EXIT_UNSAT: i32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, dm::Display)]
pub enum Verdict {
    #[display("sat")]
    Satisfiable,
    #[display("unsat")]
    Unsatisfiable,
    /// Timeout, crash, or anything else that does not settle the formula.
    #[display("unknown")]
    Inconclusive,
}

impl Verdict {
    pub fn from_status_code(code: i32) -> Self {
        match code {
            EXIT_SAT => Verdict::Satisfiable,
            EXIT_UNSAT => Verdict::Unsatisfiable,
            _ => Verdict::Inconclusive,
        }
    }

    pub fn is_definitive(&self) -> bool {
        !matches!(self, Verdict::Inconclusive)
    }
}

impl Measurement {
    pub fn verdict(&self) -> Verdict {
        Verdict::from_status_code(self.status_code)
    }
}

/// A SAT solver binary taking a DIMACS file as its only argument.
#[derive(Debug, Clone)]
pub struct Solver {
    program: PathBuf,
    limits: Limits,
}

impl Solver {
    pub fn new(program: impl Into<PathBuf>, limits: Limits) -> Self {
        Self {
            program: program.into(),
            limits,
        }
    }

    /// A short name for reports.
    pub fn name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    /// Runs the solver on the formula with its output discarded.
    #[tracing::instrument(level = "debug", skip(self), fields(solver = %self.name()))]
    pub fn solve(&self, formula: &Path) -> Result<Measurement, io::Error> {
        measure_call(
            CallParams::new(&self.program, [formula])
                .stdout(OutputSink::Null)
                .limits(self.limits),
        )
        .map(|output| output.measurement)
    }
}
