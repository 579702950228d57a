use std::path::PathBuf;

use common::log_info;
use config::ConfigError;
use serde::Deserialize;

use crate::{
    archive::ArchiverKind, encode::EncodingOptions, sweep::SweepPlan, utils::Limits,
};

pub const CONFIG_ENV_PREFIX: &str = "SUMMLE";
const CONFIG_FILENAME: &str = "summle_config";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BenchConfig {
    #[serde(default = "default_cbmc")]
    pub cbmc: PathBuf,
    #[serde(default = "default_solver")]
    pub solver: PathBuf,
    #[serde(default)]
    pub comparison_solvers: Vec<PathBuf>,
    #[serde(default)]
    pub archiver: ArchiverKind,
    #[serde(default = "default_gzip")]
    pub gzip: PathBuf,
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,
    /// 0 means no limit.
    #[serde(default = "default_cpu_limit_s")]
    pub cpu_limit_s: u64,
    #[serde(default)]
    pub wall_timeout_s: Option<u64>,
    #[serde(default)]
    pub encoding: EncodingOptions,
    #[serde(default)]
    pub sweep: SweepPlan,
}

fn default_cbmc() -> PathBuf {
    PathBuf::from("../cbmc/src/cbmc/cbmc")
}

fn default_solver() -> PathBuf {
    PathBuf::from("minisat")
}

fn default_gzip() -> PathBuf {
    PathBuf::from("gzip")
}

fn default_workdir() -> PathBuf {
    PathBuf::from(".")
}

fn default_cpu_limit_s() -> u64 {
    30
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            cbmc: default_cbmc(),
            solver: default_solver(),
            comparison_solvers: Vec::default(),
            archiver: ArchiverKind::default(),
            gzip: default_gzip(),
            workdir: default_workdir(),
            cpu_limit_s: default_cpu_limit_s(),
            wall_timeout_s: None,
            encoding: EncodingOptions::default(),
            sweep: SweepPlan::default(),
        }
    }
}

impl BenchConfig {
    pub fn solver_limits(&self) -> Limits {
        Limits::new(self.cpu_limit_s, self.wall_timeout_s)
    }
}

/// Reads the configuration from `summle_config.*` and `SUMMLE_*` variables.
pub fn load_config() -> Result<BenchConfig, ConfigError> {
    common::config::load_config(CONFIG_FILENAME, CONFIG_ENV_PREFIX, |b| Ok(b))
        .and_then(|c| c.try_deserialize())
        .inspect(|c| log_info!("Loaded configurations: {:?}", c))
}
