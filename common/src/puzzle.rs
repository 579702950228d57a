use derive_more as dm;

use crate::utils::{comma_separated, dash_separated, Separated};

/// A single summle puzzle instance: reach `goal` from `inputs` in at most `steps` operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, dm::Display)]
#[display("X={goal}, steps={steps}, inputs=[{}]", comma_separated(inputs))]
pub struct Puzzle {
    pub goal: i64,
    pub steps: u32,
    /// Ordered, duplicates allowed.
    pub inputs: Vec<u64>,
}

impl Puzzle {
    pub fn new(goal: i64, steps: u32, inputs: impl Into<Vec<u64>>) -> Self {
        Self {
            goal,
            steps,
            inputs: inputs.into(),
        }
    }

    /// The inputs as they appear in artifact names.
    pub fn dashed_inputs(&self) -> Separated<'_, u64> {
        dash_separated(&self.inputs)
    }

    /// The inputs as they are passed to the C preprocessor.
    pub fn listed_inputs(&self) -> Separated<'_, u64> {
        comma_separated(&self.inputs)
    }
}

/// The strategy of the model checker for encoding arrays as uninterpreted functions
/// in SMT2 output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, dm::Display)]
pub enum UfMode {
    #[display("never")]
    Never,
    #[display("always")]
    Always,
    /// No flag is passed; the tool decides.
    #[default]
    #[display("")]
    Default,
}

impl UfMode {
    /// All the modes, in the order the SMT2 encodings are produced.
    pub const ALL: [UfMode; 3] = [UfMode::Never, UfMode::Always, UfMode::Default];

    pub fn tag(self) -> &'static str {
        match self {
            UfMode::Never => "never",
            UfMode::Always => "always",
            UfMode::Default => "",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.tag() == tag)
    }

    /// The model checker flag selecting this mode, if any.
    pub fn flag(self) -> Option<&'static str> {
        match self {
            UfMode::Never => Some("--arrays-uf-never"),
            UfMode::Always => Some("--arrays-uf-always"),
            UfMode::Default => None,
        }
    }
}
