use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{DdError, ErrorInfo};

/// Input bundle handed to a sampler backend.
///
/// Per-subject rows are padded with zeros up to `max_trials`; only the first
/// `trials_per_subject[i]` entries of row `i` are observations. Field names
/// serialize to the names the compiled model reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelData {
    /// Number of subjects.
    #[serde(rename = "N")]
    pub n_subjects: usize,
    /// Largest per-subject trial count.
    #[serde(rename = "T")]
    pub max_trials: usize,
    /// Trial count for each subject.
    #[serde(rename = "Tsubj")]
    pub trials_per_subject: Vec<usize>,
    /// Delay of the later option, `N x T`.
    pub delay_later: Vec<Vec<f64>>,
    /// Amount of the later option, `N x T`.
    pub amount_later: Vec<Vec<f64>>,
    /// Delay of the sooner option, `N x T`.
    pub delay_sooner: Vec<Vec<f64>>,
    /// Amount of the sooner option, `N x T`.
    pub amount_sooner: Vec<Vec<f64>>,
    /// Observed choice (1 = later), `N x T`.
    pub choice: Vec<Vec<i32>>,
}

/// One named initial value: a scalar or a vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InitValue {
    /// Scalar parameter.
    Scalar(f64),
    /// Vector parameter.
    Vector(Vec<f64>),
}

/// Initial values for a single chain, keyed by model parameter name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InitValues {
    /// Parameter name to starting value.
    pub values: BTreeMap<String, InitValue>,
}

impl InitValues {
    /// Adds a value, returning the updated set.
    pub fn with(mut self, name: impl Into<String>, value: InitValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Looks up a value by parameter name.
    pub fn get(&self, name: &str) -> Option<&InitValue> {
        self.values.get(name)
    }
}

/// Tuning and bookkeeping passed to a sampler backend for one fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerSettings {
    /// Iterations per chain, warm-up included.
    pub iterations: usize,
    /// Warm-up iterations per chain, discarded before draws are kept.
    pub warmup: usize,
    /// Number of independent chains.
    pub chains: usize,
    /// Keep every `thin`-th post warm-up iteration.
    pub thin: usize,
    /// Worker count the backend may use to run chains concurrently.
    pub cores: usize,
    /// Target acceptance probability for step-size adaptation.
    pub adapt_delta: f64,
    /// Initial integrator step size.
    pub stepsize: f64,
    /// Maximum recursion depth of the trajectory search.
    pub max_treedepth: usize,
    /// Master seed; chain seeds are derived from it.
    pub seed: u64,
    /// Parameters whose draws must be returned.
    pub parameters: Vec<String>,
    /// Per-chain initial values; `None` lets the backend choose randomly.
    pub inits: Option<Vec<InitValues>>,
}

impl SamplerSettings {
    /// Number of draws each chain keeps after warm-up and thinning.
    pub fn kept_draws_per_chain(&self) -> usize {
        let sampling = self.iterations.saturating_sub(self.warmup);
        if self.thin == 0 {
            return 0;
        }
        sampling.div_ceil(self.thin)
    }
}

/// Draws of one parameter across chains.
///
/// Each draw is a vector of `width` elements; scalars have width 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDraws {
    width: usize,
    chains: Vec<Vec<Vec<f64>>>,
}

impl ParameterDraws {
    /// Creates an empty collection for a parameter with `width` elements.
    pub fn new(width: usize) -> Self {
        Self {
            width,
            chains: Vec::new(),
        }
    }

    /// Number of elements in each draw.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Draws grouped by chain.
    pub fn chains(&self) -> &[Vec<Vec<f64>>] {
        &self.chains
    }

    /// Total number of draws over all chains.
    pub fn draw_count(&self) -> usize {
        self.chains.iter().map(Vec::len).sum()
    }

    /// Appends a draw to `chain`, creating intermediate chains as needed.
    pub fn push(&mut self, chain: usize, draw: Vec<f64>) -> Result<(), DdError> {
        if draw.len() != self.width {
            return Err(DdError::Sampler(
                ErrorInfo::new("draw-width", "draw width does not match parameter width")
                    .with_context("expected", self.width.to_string())
                    .with_context("actual", draw.len().to_string()),
            ));
        }
        if self.chains.len() <= chain {
            self.chains.resize_with(chain + 1, Vec::new);
        }
        self.chains[chain].push(draw);
        Ok(())
    }

    /// Values of element `index` from every draw, chains concatenated in order.
    pub fn element(&self, index: usize) -> Vec<f64> {
        self.chains
            .iter()
            .flat_map(|chain| chain.iter().filter_map(move |draw| draw.get(index).copied()))
            .collect()
    }

    /// Values of element `index`, one vector per chain.
    pub fn element_by_chain(&self, index: usize) -> Vec<Vec<f64>> {
        self.chains
            .iter()
            .map(|chain| {
                chain
                    .iter()
                    .filter_map(|draw| draw.get(index).copied())
                    .collect()
            })
            .collect()
    }
}

/// Posterior draws keyed by parameter name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PosteriorDraws {
    parameters: BTreeMap<String, ParameterDraws>,
}

impl PosteriorDraws {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the draws of a parameter.
    pub fn insert(&mut self, name: impl Into<String>, draws: ParameterDraws) {
        self.parameters.insert(name.into(), draws);
    }

    /// Returns the draws of a parameter.
    pub fn get(&self, name: &str) -> Option<&ParameterDraws> {
        self.parameters.get(name)
    }

    /// Returns the draws of a parameter, creating an empty entry of `width`.
    pub fn entry(&mut self, name: &str, width: usize) -> &mut ParameterDraws {
        self.parameters
            .entry(name.to_string())
            .or_insert_with(|| ParameterDraws::new(width))
    }

    /// Iterates over parameter names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parameters.keys().map(String::as_str)
    }

    /// Iterates over `(name, draws)` pairs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterDraws)> {
        self.parameters
            .iter()
            .map(|(name, draws)| (name.as_str(), draws))
    }

    /// Returns `true` when no parameter has been recorded.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}
