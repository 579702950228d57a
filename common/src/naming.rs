//! The naming scheme of the benchmark artifacts.
//!
//! An artifact's file name is the only record of the puzzle it encodes:
//! ```text
//! summle_X<goal>_steps<steps>_I<i1>-<i2>-...-<in>.cnf
//! summle_X<goal>_steps<steps>_I<i1>-<i2>-...-<in>_UF<mode>.smt2
//! ```
//! Compressed artifacts carry an extra extension (e.g., `.cnf.gz`),
//! which is ignored by the decoder.

use core::{error::Error, fmt::Display};
use std::path::Path;

use derive_more as dm;

use crate::puzzle::{Puzzle, UfMode};

pub const TAG: &str = "summle";
const PREFIX_GOAL: &str = "X";
const PREFIX_STEPS: &str = "steps";
const PREFIX_INPUTS: &str = "I";
const PREFIX_UF: &str = "UF";
const SEP_SEGMENT: char = '_';
const SEP_INPUT: char = '-';
const SEP_EXTENSION: char = '.';

pub const EXT_CNF: &str = "cnf";
pub const EXT_SMT2: &str = "smt2";
pub const EXT_GZIP: &str = "gz";

#[derive(Debug, Clone, Copy, PartialEq, Eq, dm::Display)]
pub enum ArtifactKind {
    #[display("cnf")]
    Cnf,
    #[display("smt2 (UF: {_0:?})")]
    Smt2(UfMode),
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Cnf => EXT_CNF,
            ArtifactKind::Smt2(_) => EXT_SMT2,
        }
    }
}

/// Produces the file name of the artifact encoding `puzzle` in the given form.
pub fn encode(puzzle: &Puzzle, kind: ArtifactKind) -> String {
    let mut name = format!(
        "{TAG}{SEP_SEGMENT}{PREFIX_GOAL}{goal}{SEP_SEGMENT}{PREFIX_STEPS}{steps}{SEP_SEGMENT}{PREFIX_INPUTS}{inputs}",
        goal = puzzle.goal,
        steps = puzzle.steps,
        inputs = puzzle.dashed_inputs(),
    );
    if let ArtifactKind::Smt2(mode) = kind {
        name.push(SEP_SEGMENT);
        name.push_str(PREFIX_UF);
        name.push_str(mode.tag());
    }
    name.push(SEP_EXTENSION);
    name.push_str(kind.extension());
    name
}

/// The name of the compressed form of an artifact.
pub fn compressed(name: &str) -> String {
    format!("{name}{SEP_EXTENSION}{EXT_GZIP}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedName {
    pub puzzle: Puzzle,
    /// Present only for names carrying a UF segment.
    pub uf_mode: Option<UfMode>,
    /// Everything after the first dot, e.g., `cnf.gz`. Empty if there is none.
    pub extension: String,
}

/// The reason a file name is not a valid artifact name.
/// Each variant names the segment that failed the validation.
#[derive(Debug, Clone, PartialEq, Eq, dm::Display)]
pub enum NameError {
    #[display("No file name found in `{_0}`")]
    Empty(String),
    #[display("Not a summle artifact, first segment is `{_0}`")]
    Tag(String),
    #[display("No goal segment (`X<int>`) found, got `{_0}`")]
    Goal(String),
    #[display("No steps segment (`steps<int>`) found, got `{_0}`")]
    Steps(String),
    #[display("No input segment (`I<int>-<int>...`) found, got `{_0}`")]
    Inputs(String),
    #[display("Invalid UF segment (`UFnever|UFalways|UF`), got `{_0}`")]
    UfMode(String),
    #[display("Unexpected trailing segments `{_0}`")]
    Trailing(String),
}

impl Error for NameError {}

/// Recovers the puzzle from an artifact's file name (or a path to it).
pub fn decode(name: impl AsRef<Path>) -> Result<DecodedName, NameError> {
    let full = name.as_ref();
    let file_name = full
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| NameError::Empty(full.display().to_string()))?;

    let (stem, extension) = file_name
        .split_once(SEP_EXTENSION)
        .unwrap_or((file_name, ""));
    let mut segments = stem.split(SEP_SEGMENT);

    let tag = segments.next().unwrap_or_default();
    if tag != TAG {
        return Err(NameError::Tag(tag.to_string()));
    }

    let goal = parse_segment(segments.next(), PREFIX_GOAL, NameError::Goal)?;
    let steps = parse_segment(segments.next(), PREFIX_STEPS, NameError::Steps)?;
    let inputs = parse_inputs(segments.next())?;

    let uf_mode = segments
        .next()
        .map(|segment| {
            segment
                .strip_prefix(PREFIX_UF)
                .and_then(UfMode::from_tag)
                .ok_or_else(|| NameError::UfMode(segment.to_string()))
        })
        .transpose()?;

    let rest = segments.collect::<Vec<_>>();
    if !rest.is_empty() {
        return Err(NameError::Trailing(rest.join("_")));
    }

    Ok(DecodedName {
        puzzle: Puzzle {
            goal,
            steps,
            inputs,
        },
        uf_mode,
        extension: extension.to_string(),
    })
}

/// Only the numerals `encode` writes are accepted: no sign, no leading zeros.
fn parse_numeral<T: core::str::FromStr + ToString>(text: &str) -> Option<T> {
    text.parse::<T>()
        .ok()
        .filter(|value| value.to_string() == text)
}

fn parse_segment<T: core::str::FromStr + ToString>(
    segment: Option<&str>,
    prefix: &str,
    error: impl FnOnce(String) -> NameError,
) -> Result<T, NameError> {
    let segment = segment.unwrap_or_default();
    segment
        .strip_prefix(prefix)
        .and_then(parse_numeral)
        .ok_or_else(|| error(segment.to_string()))
}

fn parse_inputs(segment: Option<&str>) -> Result<Vec<u64>, NameError> {
    let segment = segment.unwrap_or_default();
    let error = || NameError::Inputs(segment.to_string());
    let values = segment.strip_prefix(PREFIX_INPUTS).ok_or_else(error)?;
    if values.is_empty() {
        return Err(error());
    }
    values
        .split(SEP_INPUT)
        .map(|v| parse_numeral(v).ok_or_else(error))
        .collect()
}

impl Display for DecodedName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.puzzle)?;
        if let Some(mode) = self.uf_mode {
            write!(f, ", UF: {mode:?}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Puzzle {
        Puzzle::new(8651, 8, [1, 2, 2, 4, 4, 8, 25, 100])
    }

    #[test]
    fn test_encode_cnf() {
        assert_eq!(
            encode(&sample(), ArtifactKind::Cnf),
            "summle_X8651_steps8_I1-2-2-4-4-8-25-100.cnf"
        );
    }

    #[test]
    fn test_encode_smt2() {
        let puzzle = sample();
        assert_eq!(
            encode(&puzzle, ArtifactKind::Smt2(UfMode::Never)),
            "summle_X8651_steps8_I1-2-2-4-4-8-25-100_UFnever.smt2"
        );
        assert_eq!(
            encode(&puzzle, ArtifactKind::Smt2(UfMode::Always)),
            "summle_X8651_steps8_I1-2-2-4-4-8-25-100_UFalways.smt2"
        );
        assert_eq!(
            encode(&puzzle, ArtifactKind::Smt2(UfMode::Default)),
            "summle_X8651_steps8_I1-2-2-4-4-8-25-100_UF.smt2"
        );
    }

    #[test]
    fn test_compressed_name() {
        assert_eq!(compressed("summle_X1_steps2_I3.cnf"), "summle_X1_steps2_I3.cnf.gz");
    }

    #[test]
    fn test_round_trip() {
        let puzzles = [
            sample(),
            Puzzle::new(4, 4, [2, 2, 4, 5, 8, 8, 11, 25]),
            Puzzle::new(0, 0, [0]),
            Puzzle::new(-3, 1, [7]),
            Puzzle::new(i64::MAX, u32::MAX, [u64::MAX, 0, u64::MAX]),
        ];
        for puzzle in puzzles {
            let decoded = decode(encode(&puzzle, ArtifactKind::Cnf)).unwrap();
            assert_eq!(decoded.puzzle, puzzle);
            assert_eq!(decoded.uf_mode, None);
            assert_eq!(decoded.extension, EXT_CNF);

            for mode in UfMode::ALL {
                let decoded = decode(encode(&puzzle, ArtifactKind::Smt2(mode))).unwrap();
                assert_eq!(decoded.puzzle, puzzle);
                assert_eq!(decoded.uf_mode, Some(mode));
                assert_eq!(decoded.extension, EXT_SMT2);
            }
        }
    }

    #[test]
    fn test_decode_compressed_path() {
        let decoded = decode("/tmp/bench/summle_X8651_steps8_I1-2-2-4-4-8-25-100.cnf.gz").unwrap();
        assert_eq!(decoded.puzzle, sample());
        assert_eq!(decoded.extension, "cnf.gz");
    }

    #[test]
    fn test_decode_rejects_tag() {
        assert_eq!(
            decode("puzzle_X1_steps2_I3.cnf"),
            Err(NameError::Tag("puzzle".to_string()))
        );
        assert!(matches!(decode("summle.cnf"), Err(NameError::Goal(_))));
    }

    #[test]
    fn test_decode_rejects_goal() {
        assert!(matches!(
            decode("summle_Y1_steps2_I3.cnf"),
            Err(NameError::Goal(s)) if s == "Y1"
        ));
        assert!(matches!(
            decode("summle_Xabc_steps2_I3.cnf"),
            Err(NameError::Goal(_))
        ));
        assert!(matches!(decode("summle_X_steps2_I3.cnf"), Err(NameError::Goal(_))));
    }

    #[test]
    fn test_decode_rejects_steps() {
        assert!(matches!(
            decode("summle_X1_step2_I3.cnf"),
            Err(NameError::Steps(s)) if s == "step2"
        ));
        assert!(matches!(decode("summle_X1_steps-2_I3.cnf"), Err(NameError::Steps(_))));
        assert!(matches!(decode("summle_X1"), Err(NameError::Steps(_))));
    }

    #[test]
    fn test_decode_rejects_inputs() {
        assert!(matches!(
            decode("summle_X1_steps2_J3.cnf"),
            Err(NameError::Inputs(s)) if s == "J3"
        ));
        assert!(matches!(decode("summle_X1_steps2_I.cnf"), Err(NameError::Inputs(_))));
        assert!(matches!(decode("summle_X1_steps2_I3--4.cnf"), Err(NameError::Inputs(_))));
        assert!(matches!(decode("summle_X1_steps2"), Err(NameError::Inputs(_))));
    }

    #[test]
    fn test_decode_rejects_uf_and_trailing() {
        assert!(matches!(
            decode("summle_X1_steps2_I3_UFsometimes.smt2"),
            Err(NameError::UfMode(_))
        ));
        assert!(matches!(
            decode("summle_X1_steps2_I3_extra.smt2"),
            Err(NameError::UfMode(_))
        ));
        assert!(matches!(
            decode("summle_X1_steps2_I3_UFnever_x.smt2"),
            Err(NameError::Trailing(s)) if s == "x"
        ));
    }

    #[test]
    fn test_decode_rejects_non_canonical_numerals() {
        assert!(matches!(decode("summle_X+5_steps2_I3.cnf"), Err(NameError::Goal(_))));
        assert!(matches!(decode("summle_X007_steps2_I3.cnf"), Err(NameError::Goal(_))));
        assert!(matches!(decode("summle_X-0_steps2_I3.cnf"), Err(NameError::Goal(_))));
        assert!(matches!(decode("summle_X7_steps+2_I3.cnf"), Err(NameError::Steps(_))));
        assert!(matches!(decode("summle_X7_steps02_I3.cnf"), Err(NameError::Steps(_))));
        assert!(matches!(decode("summle_X7_steps2_I03-4.cnf"), Err(NameError::Inputs(_))));
        assert!(matches!(decode("summle_X7_steps2_I3-+4.cnf"), Err(NameError::Inputs(_))));
        assert_eq!(
            decode("summle_X-7_steps0_I0-10.cnf").unwrap().puzzle,
            Puzzle::new(-7, 0, [0, 10])
        );
    }

    #[test]
    fn test_error_names_segment() {
        let message = decode("summle_X1_steps2_J3.cnf").unwrap_err().to_string();
        assert!(message.contains("input segment"), "{message}");
    }
}
