//! Generation of benchmarks by sweeping over puzzle parameters.
//!
//! Every puzzle of the plan is encoded into CNF and given to the solver.
//! The ones settled within the limits are dropped, the rest are compressed and kept.
//! Already compressed artifacts are never regenerated, so an interrupted sweep
//! can simply be restarted.

use std::{
    fs,
    path::{Path, PathBuf},
};

use common::{
    log_info, log_warn,
    naming::{self, ArtifactKind},
    puzzle::Puzzle,
};
use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::{
    archive::{Archiver, Retention, retain},
    args::OutputFormat,
    encode::Encoder,
    solve::Solver,
    utils::Measurement,
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SweepPlan {
    /// The goals around which the sweep happens.
    #[serde(default = "default_base_goals")]
    pub base_goals: Vec<i64>,
    /// Goals in `base - radius .. base + radius` are generated.
    #[serde(default = "default_goal_radius")]
    pub goal_radius: i64,
    #[serde(default = "default_steps")]
    pub steps: Vec<u32>,
    #[serde(default = "default_inputs")]
    pub inputs: Vec<u64>,
}

fn default_base_goals() -> Vec<i64> {
    vec![11110, 111111, 111113]
}

fn default_goal_radius() -> i64 {
    10
}

fn default_steps() -> Vec<u32> {
    vec![5, 6, 7, 8]
}

fn default_inputs() -> Vec<u64> {
    vec![1, 2, 2, 4, 4, 8, 25, 100]
}

impl Default for SweepPlan {
    fn default() -> Self {
        Self {
            base_goals: default_base_goals(),
            goal_radius: default_goal_radius(),
            steps: default_steps(),
            inputs: default_inputs(),
        }
    }
}

impl SweepPlan {
    /// The puzzles in the order they are processed: base goal, then goal, then steps.
    /// Goals out of the `i64` range are left out.
    pub fn puzzles(&self) -> impl Iterator<Item = Puzzle> + '_ {
        iproduct!(
            self.base_goals.iter(),
            self.goal_radius.saturating_neg()..self.goal_radius,
            self.steps.iter()
        )
        .filter_map(|(base, offset, steps)| {
            base.checked_add(offset)
                .map(|goal| Puzzle::new(goal, *steps, self.inputs.clone()))
        })
    }
}

/// What happened to a single puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Outcome {
    /// Its archive already exists.
    #[display("skipped")]
    Skipped,
    #[display("encoding failed")]
    EncodingFailed,
    #[display("solving failed")]
    SolvingFailed,
    #[display("{_0}")]
    Retained(Retention),
    /// The artifact could not be dropped or archived.
    #[display("retention failed")]
    RetentionFailed,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepSummary {
    pub skipped: usize,
    pub failed: usize,
    pub dropped: usize,
    pub kept: usize,
}

impl SweepSummary {
    fn notify(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Skipped => self.skipped += 1,
            Outcome::EncodingFailed | Outcome::SolvingFailed | Outcome::RetentionFailed => {
                self.failed += 1
            }
            Outcome::Retained(Retention::Dropped) => self.dropped += 1,
            Outcome::Retained(Retention::Kept) => self.kept += 1,
        }
    }
}

/// A line of the sweep report.
#[derive(Debug, Clone, Serialize)]
pub struct SolveRecord<'a> {
    pub file: &'a Path,
    pub goal: i64,
    pub steps: u32,
    pub solver: &'a str,
    #[serde(flatten)]
    pub measurement: Measurement,
    /// `dropped` or `kept` for the primary solver, `measured` for the comparison ones.
    pub action: String,
}

pub fn report_record(record: &SolveRecord, output_format: &OutputFormat) {
    match output_format {
        OutputFormat::Csv => println!(
            "{}, {}, {}, {}, {:.3}, {:.3}, {}, {}",
            record.file.display(),
            record.goal,
            record.steps,
            record.solver,
            record.measurement.cpu_time_s,
            record.measurement.wall_time_s,
            record.measurement.status_code,
            record.action,
        ),
        OutputFormat::JsonLines => match serde_json::to_string(record) {
            Ok(line) => println!("{line}"),
            Err(e) => log_warn!("Failed to serialize the record: {e}"),
        },
    }
}

const ACTION_MEASURED: &str = "measured";

pub struct Sweeper {
    pub encoder: Encoder,
    /// Decides whether an artifact is kept.
    pub solver: Solver,
    /// Only measured and reported, for comparison against the primary solver.
    pub comparison_solvers: Vec<Solver>,
    pub archiver: Box<dyn Archiver>,
    pub workdir: PathBuf,
    pub output_format: Option<OutputFormat>,
}

impl Sweeper {
    pub fn run(&self, plan: &SweepPlan) -> SweepSummary {
        let mut summary = SweepSummary::default();
        for puzzle in plan.puzzles() {
            summary.notify(self.process(&puzzle));
        }
        log_info!(
            "Sweep finished. Skipped: {}, failed: {}, dropped: {}, kept: {}",
            summary.skipped,
            summary.failed,
            summary.dropped,
            summary.kept,
        );
        summary
    }

    pub fn artifact_path(&self, puzzle: &Puzzle) -> PathBuf {
        self.workdir.join(naming::encode(puzzle, ArtifactKind::Cnf))
    }

    pub fn archive_path(&self, puzzle: &Puzzle) -> PathBuf {
        self.workdir
            .join(naming::compressed(&naming::encode(puzzle, ArtifactKind::Cnf)))
    }

    #[tracing::instrument(level = "info", skip(self), fields(puzzle = %puzzle))]
    pub fn process(&self, puzzle: &Puzzle) -> Outcome {
        let file = self.artifact_path(puzzle);
        let zipped_file = self.archive_path(puzzle);
        if zipped_file.exists() {
            log_info!("Found file already, skipping");
            return Outcome::Skipped;
        }
        log_info!(
            "File does not already exist, solving ({})",
            zipped_file.display()
        );

        if let Err(e) = self.encoder.encode_cnf(puzzle, &file) {
            log_warn!("Received error when running CBMC: {e}");
            // No partial artifacts.
            let _ = fs::remove_file(&file);
            return Outcome::EncodingFailed;
        }

        let measurement = match self.solver.solve(&file) {
            Ok(measurement) => measurement,
            Err(e) => {
                log_warn!("Failed to run solver `{}`: {e}", self.solver.name());
                return Outcome::SolvingFailed;
            }
        };

        for solver in &self.comparison_solvers {
            match solver.solve(&file) {
                Ok(other) => self.report(puzzle, &file, solver, other, ACTION_MEASURED),
                Err(e) => log_warn!("Failed to run comparison solver `{}`: {e}", solver.name()),
            }
        }

        match retain(&file, measurement.verdict(), self.archiver.as_ref()) {
            Ok(retention) => {
                self.report(puzzle, &file, &self.solver, measurement, &retention.to_string());
                Outcome::Retained(retention)
            }
            Err(e) => {
                log_warn!("Failed to drop or archive `{}`: {e}", file.display());
                Outcome::RetentionFailed
            }
        }
    }

    fn report(
        &self,
        puzzle: &Puzzle,
        file: &Path,
        solver: &Solver,
        measurement: Measurement,
        action: &str,
    ) {
        let Some(output_format) = &self.output_format else {
            return;
        };
        report_record(
            &SolveRecord {
                file,
                goal: puzzle.goal,
                steps: puzzle.steps,
                solver: &solver.name(),
                measurement,
                action: action.to_string(),
            },
            output_format,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_plan_order() {
        let plan = SweepPlan::default();
        let puzzles = plan.puzzles().collect::<Vec<_>>();
        assert_eq!(puzzles.len(), 3 * 20 * 4);
        assert_eq!(puzzles[0], Puzzle::new(11100, 5, [1, 2, 2, 4, 4, 8, 25, 100]));
        assert_eq!(puzzles[1].steps, 6);
        assert_eq!(puzzles[4].goal, 11101);
        assert_eq!(puzzles.last().unwrap().goal, 111122);
        assert_eq!(puzzles.last().unwrap().steps, 8);
    }

    #[test]
    fn test_empty_radius_yields_nothing() {
        let plan = SweepPlan {
            goal_radius: 0,
            ..Default::default()
        };
        assert_eq!(plan.puzzles().count(), 0);
    }

    #[test]
    fn test_out_of_range_goals_are_left_out() {
        let plan = SweepPlan {
            base_goals: vec![i64::MAX, i64::MIN],
            goal_radius: 2,
            steps: vec![5],
            inputs: vec![1],
        };
        let goals = plan.puzzles().map(|p| p.goal).collect::<Vec<_>>();
        assert_eq!(
            goals,
            [
                i64::MAX - 2,
                i64::MAX - 1,
                i64::MAX,
                i64::MIN,
                i64::MIN + 1,
            ]
        );

        let plan = SweepPlan {
            goal_radius: i64::MIN,
            ..Default::default()
        };
        assert_eq!(plan.puzzles().count(), 0);
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = SweepSummary::default();
        [
            Outcome::Skipped,
            Outcome::EncodingFailed,
            Outcome::Retained(Retention::Dropped),
            Outcome::Retained(Retention::Kept),
            Outcome::Retained(Retention::Kept),
        ]
        .into_iter()
        .for_each(|o| summary.notify(o));
        assert_eq!(
            summary,
            SweepSummary {
                skipped: 1,
                failed: 1,
                dropped: 1,
                kept: 2,
            }
        );
    }

    #[test]
    fn test_record_json() {
        let record = SolveRecord {
            file: Path::new("summle_X1_steps2_I3.cnf"),
            goal: 1,
            steps: 2,
            solver: "minisat",
            measurement: Measurement {
                cpu_time_s: 0.5,
                wall_time_s: 1.0,
                status_code: 10,
            },
            action: "dropped".to_string(),
        };
        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();
        assert_eq!(value["status_code"], 10);
        assert_eq!(value["action"], "dropped");
        assert_eq!(value["file"], "summle_X1_steps2_I3.cnf");
    }
}
