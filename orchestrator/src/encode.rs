//! Invocations of the model checker (CBMC) producing the encodings of puzzles.

use core::error::Error;
use std::{
    ffi::OsString,
    io,
    path::{Path, PathBuf},
};

use common::{
    log_debug, log_info,
    naming::{self, ArtifactKind, NameError},
    puzzle::{Puzzle, UfMode},
};
use derive_more as dm;
use serde::Deserialize;

use crate::utils::{CallParams, OutputSink, measure_call};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EncodingOptions {
    /// The C type of the numbers in the puzzle program.
    #[serde(default = "default_int_type")]
    pub int_type: String,
    #[serde(default = "default_unwind")]
    pub unwind: u32,
    #[serde(default = "default_depth")]
    pub depth: u32,
    #[serde(default = "default_object_bits")]
    pub object_bits: u32,
    /// The property whose violation encodes a solution.
    #[serde(default = "default_property")]
    pub property: String,
    /// The puzzle program.
    #[serde(default = "default_source")]
    pub source: PathBuf,
}

fn default_int_type() -> String {
    "unsigned short".to_string()
}

fn default_unwind() -> u32 {
    10
}

fn default_depth() -> u32 {
    2000
}

fn default_object_bits() -> u32 {
    16
}

fn default_property() -> String {
    "main.assertion.1".to_string()
}

fn default_source() -> PathBuf {
    PathBuf::from("main.c")
}

impl Default for EncodingOptions {
    fn default() -> Self {
        Self {
            int_type: default_int_type(),
            unwind: default_unwind(),
            depth: default_depth(),
            object_bits: default_object_bits(),
            property: default_property(),
            source: default_source(),
        }
    }
}

#[derive(Debug, dm::Display)]
pub enum EncodeError {
    #[display("Failed to launch the encoder `{}`: {_1}", _0.display())]
    Launch(PathBuf, io::Error),
    #[display("Encoder exited with status {status} while producing `{}`", output.display())]
    Tool { status: i32, output: PathBuf },
    #[display("Encoder finished but `{}` was not produced", _0.display())]
    NoOutput(PathBuf),
}

impl Error for EncodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Launch(_, err) => Some(err),
            _ => None,
        }
    }
}

/// Either the artifact name did not describe a puzzle or encoding it failed.
#[derive(Debug, dm::Display, dm::From)]
pub enum Smt2Error {
    #[display("Invalid artifact name: {_0}")]
    Name(NameError),
    #[display("{_0}")]
    Encode(EncodeError),
}

impl Error for Smt2Error {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Name(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Encoder {
    cbmc: PathBuf,
    options: EncodingOptions,
}

impl Encoder {
    pub fn new(cbmc: impl Into<PathBuf>, options: EncodingOptions) -> Self {
        Self {
            cbmc: cbmc.into(),
            options,
        }
    }

    /// The arguments requesting the encoding of `puzzle` in the given form into `output`.
    pub fn args(&self, puzzle: &Puzzle, kind: ArtifactKind, output: &Path) -> Vec<OsString> {
        let EncodingOptions {
            int_type,
            unwind,
            depth,
            object_bits,
            property,
            source,
        } = &self.options;

        let format_flag = match kind {
            ArtifactKind::Cnf => "--dimacs",
            ArtifactKind::Smt2(_) => "--smt2",
        };
        let uf_flag = match kind {
            ArtifactKind::Smt2(mode) => mode.flag(),
            ArtifactKind::Cnf => None,
        };

        let mut args: Vec<OsString> = vec![
            "--property".into(),
            property.into(),
            format_flag.into(),
            "--outfile".into(),
            output.into(),
            "--trace".into(),
            "--trace-hex".into(),
            "--object-bits".into(),
            object_bits.to_string().into(),
        ];
        args.extend(uf_flag.map(OsString::from));
        args.extend(
            [
                "--unwind".to_string(),
                unwind.to_string(),
                "--depth".to_string(),
                depth.to_string(),
                // Passed without a shell, so no quotes around the type.
                format!("-DTYPE={int_type}"),
                format!("-DGOAL={}", puzzle.goal),
                format!("-DINPUTS={}", puzzle.listed_inputs()),
                format!("-DSTEPS={}", puzzle.steps),
            ]
            .map(OsString::from),
        );
        args.push(source.into());
        args
    }

    /// Writes the DIMACS CNF encoding of `puzzle` to `output`.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn encode_cnf(&self, puzzle: &Puzzle, output: &Path) -> Result<(), EncodeError> {
        self.run(puzzle, ArtifactKind::Cnf, output, OutputSink::Null)
    }

    /// Writes the three SMT2 encodings of `puzzle` (one per UF mode) into `dir`.
    /// The runs are sequential and the first failure stops the rest.
    pub fn encode_smt2_all(&self, puzzle: &Puzzle, dir: &Path) -> Result<Vec<PathBuf>, EncodeError> {
        UfMode::ALL
            .into_iter()
            .map(|mode| {
                log_info!("Encoding with UF mode `{}`", mode.tag());
                let kind = ArtifactKind::Smt2(mode);
                let output = dir.join(naming::encode(puzzle, kind));
                self.run(puzzle, kind, &output, OutputSink::Inherit)
                    .map(|_| output)
            })
            .collect()
    }

    fn run(
        &self,
        puzzle: &Puzzle,
        kind: ArtifactKind,
        output: &Path,
        console: OutputSink,
    ) -> Result<(), EncodeError> {
        let args = self.args(puzzle, kind, output);
        log_debug!("Trying to run CBMC with {:?}", args);
        let result = measure_call(
            CallParams::new(&self.cbmc, args)
                .stdout(console.clone())
                .stderr(console),
        )
        .map_err(|e| EncodeError::Launch(self.cbmc.clone(), e))?;

        if result.status_code != 0 {
            return Err(EncodeError::Tool {
                status: result.status_code,
                output: output.to_owned(),
            });
        }
        if !output.exists() {
            return Err(EncodeError::NoOutput(output.to_owned()));
        }
        log_debug!(
            "Encoded {} in {:.2}s",
            output.display(),
            result.wall_time_s
        );
        Ok(())
    }
}

/// Produces the SMT2 encodings of the puzzle described by an existing artifact's name.
/// The outputs are placed in `dir`.
#[tracing::instrument(level = "info", skip(encoder))]
pub fn smt2_from_artifact(
    encoder: &Encoder,
    artifact: &Path,
    dir: &Path,
) -> Result<Vec<PathBuf>, Smt2Error> {
    let decoded = naming::decode(artifact)?;
    log_info!("Retrieved goal: {}", decoded.puzzle.goal);
    log_info!("Retrieved steps: {}", decoded.puzzle.steps);
    log_info!("Retrieved inputs: {:?}", decoded.puzzle.inputs);

    Ok(encoder.encode_smt2_all(&decoded.puzzle, dir)?)
}
