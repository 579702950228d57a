use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter},
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use common::{log_debug, log_info, naming};
use flate2::{Compression, write::GzEncoder};
use serde::Deserialize;

use crate::{
    solve::Verdict,
    utils::{CallParams, measure_call, measure_time},
};

/// Compresses an artifact in place: only `<file>.gz` remains afterwards.
pub trait Archiver {
    fn archive(&self, file: &Path) -> Result<PathBuf, io::Error>;
}

#[derive(ValueEnum, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArchiverKind {
    /// The external `gzip` utility.
    #[default]
    Gzip,
    /// In-process gzip compression.
    Builtin,
}

pub fn archiver(kind: ArchiverKind, gzip: &Path) -> Box<dyn Archiver> {
    match kind {
        ArchiverKind::Gzip => Box::new(GzipCommand::new(gzip)),
        ArchiverKind::Builtin => Box::new(BuiltinGzip::default()),
    }
}

/// Runs `gzip -f <file>`.
pub struct GzipCommand {
    program: PathBuf,
}

impl GzipCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Archiver for GzipCommand {
    fn archive(&self, file: &Path) -> Result<PathBuf, io::Error> {
        let output = measure_call(CallParams::new(&self.program, [Path::new("-f"), file]))?;
        if output.status_code != 0 {
            return Err(io::Error::other(format!(
                "`{}` exited with status {}",
                self.program.display(),
                output.status_code
            )));
        }
        Ok(compressed_path(file))
    }
}

pub struct BuiltinGzip {
    level: Compression,
}

impl Default for BuiltinGzip {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl Archiver for BuiltinGzip {
    fn archive(&self, file: &Path) -> Result<PathBuf, io::Error> {
        let target = compressed_path(file);
        let (result, elapsed) = measure_time(|| -> Result<(), io::Error> {
            let mut reader = BufReader::new(File::open(file)?);
            let mut encoder = GzEncoder::new(BufWriter::new(File::create(&target)?), self.level);
            io::copy(&mut reader, &mut encoder)?;
            encoder.finish()?.into_inner().map_err(|e| e.into_error())?;
            Ok(())
        });
        if let Err(err) = result {
            // No partial archives.
            let _ = fs::remove_file(&target);
            return Err(err);
        }
        fs::remove_file(file)?;
        log_debug!("Compressed in {:.2}s", elapsed.as_secs_f32());
        Ok(target)
    }
}

fn compressed_path(file: &Path) -> PathBuf {
    let name = file
        .file_name()
        .map(|n| naming::compressed(&n.to_string_lossy()))
        .unwrap_or_default();
    file.with_file_name(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Retention {
    /// Solved within the limits, not interesting.
    #[display("dropped")]
    Dropped,
    /// Unsolved within the limits, kept compressed.
    #[display("kept")]
    Kept,
}

/// Deletes an artifact whose verdict is definitive, otherwise archives it.
#[tracing::instrument(level = "debug", skip(archiver))]
pub fn retain(
    file: &Path,
    verdict: Verdict,
    archiver: &dyn Archiver,
) -> Result<Retention, io::Error> {
    if verdict.is_definitive() {
        log_info!("Solved successfully within timeout ({verdict}), dropping");
        fs::remove_file(file)?;
        Ok(Retention::Dropped)
    } else {
        log_info!("Unsolved file during timeout, keeping");
        archiver.archive(file)?;
        Ok(Retention::Kept)
    }
}
