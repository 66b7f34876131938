use std::fs;
use std::path::{Path, PathBuf};

use dd_core::{DdError, ErrorInfo};
use serde::{Deserialize, Serialize};

use crate::inits::InitPolicy;
use crate::summary::Reducer;

/// YAML-configurable parameters governing a single model fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    /// Iterations per chain, warm-up included.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Warm-up iterations per chain.
    #[serde(default = "default_warmup")]
    pub warmup: usize,
    /// Number of chains.
    #[serde(default = "default_one")]
    pub chains: usize,
    /// Requested worker count; capped to local parallelism.
    #[serde(default = "default_one")]
    pub cores: usize,
    /// Thinning interval.
    #[serde(default = "default_one")]
    pub thin: usize,
    /// Initial-value strategy.
    #[serde(default)]
    pub inits: InitPolicy,
    /// Reducer used for per-subject point estimates.
    #[serde(default)]
    pub ind_pars: Reducer,
    /// Archive output configuration.
    #[serde(default)]
    pub output: OutputConfig,
    /// Address notified once the fit completes.
    #[serde(default)]
    pub email: Option<String>,
    /// Export of model-based regressors. Not available for this model.
    #[serde(default)]
    pub model_regressor: bool,
    /// Sampler tuning knobs.
    #[serde(default)]
    pub tuning: TuningConfig,
    /// Master seed and label.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
}

fn default_iterations() -> usize {
    3000
}

fn default_warmup() -> usize {
    1000
}

fn default_one() -> usize {
    1
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            warmup: default_warmup(),
            chains: 1,
            cores: 1,
            thin: 1,
            inits: InitPolicy::default(),
            ind_pars: Reducer::default(),
            output: OutputConfig::default(),
            email: None,
            model_regressor: false,
            tuning: TuningConfig::default(),
            seed_policy: SeedPolicy::default(),
        }
    }
}

impl FitConfig {
    /// Loads a configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, DdError> {
        let contents =
            fs::read_to_string(path).map_err(|err| DdError::io("config-read", err, path))?;
        serde_yaml::from_str(&contents).map_err(|err| DdError::io("config-parse", err, path))
    }

    /// Checks iteration counts and tuning values.
    ///
    /// The initial-value vector is checked separately when it is resolved.
    pub fn validate(&self) -> Result<(), DdError> {
        if self.iterations <= self.warmup {
            return Err(DdError::InvalidConfig(
                ErrorInfo::new(
                    "iterations-not-above-warmup",
                    "iterations must exceed the warm-up count",
                )
                .with_context("iterations", self.iterations.to_string())
                .with_context("warmup", self.warmup.to_string()),
            ));
        }
        if self.chains == 0 {
            return Err(DdError::invalid_config(
                "zero-chains",
                "at least one chain is required",
                "chains",
                self.chains,
            ));
        }
        if self.thin == 0 {
            return Err(DdError::invalid_config(
                "zero-thin",
                "thinning interval must be at least 1",
                "thin",
                self.thin,
            ));
        }
        self.tuning.validate()
    }
}

/// Tuning knobs forwarded to the sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningConfig {
    /// Target acceptance probability.
    #[serde(default = "default_adapt_delta")]
    pub adapt_delta: f64,
    /// Initial step size.
    #[serde(default = "default_stepsize")]
    pub stepsize: f64,
    /// Maximum tree depth.
    #[serde(default = "default_max_treedepth")]
    pub max_treedepth: usize,
}

fn default_adapt_delta() -> f64 {
    0.95
}

fn default_stepsize() -> f64 {
    1.0
}

fn default_max_treedepth() -> usize {
    10
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            adapt_delta: default_adapt_delta(),
            stepsize: default_stepsize(),
            max_treedepth: default_max_treedepth(),
        }
    }
}

impl TuningConfig {
    fn validate(&self) -> Result<(), DdError> {
        if !(self.adapt_delta > 0.0 && self.adapt_delta < 1.0) {
            return Err(DdError::invalid_config(
                "adapt-delta-range",
                "adapt_delta must lie strictly between 0 and 1",
                "adapt_delta",
                self.adapt_delta,
            ));
        }
        if !(self.stepsize > 0.0 && self.stepsize.is_finite()) {
            return Err(DdError::invalid_config(
                "stepsize-range",
                "stepsize must be positive",
                "stepsize",
                self.stepsize,
            ));
        }
        if self.max_treedepth == 0 {
            return Err(DdError::invalid_config(
                "treedepth-range",
                "max_treedepth must be at least 1",
                "max_treedepth",
                self.max_treedepth,
            ));
        }
        Ok(())
    }
}

/// Seeding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedPolicy {
    /// Master seed; chain seeds are derived from it.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// Optional label copied into the run provenance.
    #[serde(default)]
    pub label: Option<String>,
}

fn default_master_seed() -> u64 {
    0x0DD0_C5EE_D5EE_DD15_u64
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            master_seed: default_master_seed(),
            label: None,
        }
    }
}

/// Where fit archives go.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the timestamped archive. Created if missing.
    #[serde(default)]
    pub save_dir: Option<PathBuf>,
}
