use std::fmt;
use std::str::FromStr;

use dd_core::{DdError, ErrorInfo, InitValue, InitValues};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// Default starting values for `r`, `s` and `beta`.
pub const FIXED_INITS: [f64; 3] = [0.1, 1.0, 1.0];

/// Upper bounds of `r`, `s` and `beta`; all three are bounded below by 0.
pub const PARAMETER_UPPER: [f64; 3] = [1.0, 10.0, 5.0];

const PARAMETER_LABELS: [&str; 3] = ["r", "s", "beta"];

/// How chains are started.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "InitRepr", into = "InitRepr")]
pub enum InitPolicy {
    /// Start every chain from [`FIXED_INITS`].
    Fixed,
    /// Let the sampler pick random starting values.
    #[default]
    Random,
    /// Caller-supplied values for `r`, `s` and `beta`, in that order.
    Custom(Vec<f64>),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum InitRepr {
    Named(String),
    Values(Vec<f64>),
}

impl TryFrom<InitRepr> for InitPolicy {
    type Error = String;

    fn try_from(repr: InitRepr) -> Result<Self, Self::Error> {
        match repr {
            InitRepr::Named(name) => match name.as_str() {
                "fixed" => Ok(InitPolicy::Fixed),
                "random" => Ok(InitPolicy::Random),
                other => Err(format!("unknown init policy `{other}`")),
            },
            InitRepr::Values(values) => Ok(InitPolicy::Custom(values)),
        }
    }
}

impl From<InitPolicy> for InitRepr {
    fn from(policy: InitPolicy) -> Self {
        match policy {
            InitPolicy::Fixed => InitRepr::Named("fixed".into()),
            InitPolicy::Random => InitRepr::Named("random".into()),
            InitPolicy::Custom(values) => InitRepr::Values(values),
        }
    }
}

impl FromStr for InitPolicy {
    type Err = String;

    /// Accepts `fixed`, `random`, or a comma separated list of numbers.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "fixed" => Ok(InitPolicy::Fixed),
            "random" => Ok(InitPolicy::Random),
            list => list
                .split(',')
                .map(|item| {
                    item.trim()
                        .parse::<f64>()
                        .map_err(|err| format!("invalid init value `{item}`: {err}"))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(InitPolicy::Custom),
        }
    }
}

impl fmt::Display for InitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitPolicy::Fixed => write!(f, "fixed"),
            InitPolicy::Random => write!(f, "random"),
            InitPolicy::Custom(values) => {
                let rendered: Vec<String> = values.iter().map(f64::to_string).collect();
                write!(f, "{}", rendered.join(","))
            }
        }
    }
}

/// Resolves the policy into per-chain initial values.
///
/// Returns `Ok(None)` for [`InitPolicy::Random`]. Fixed and custom values are
/// mapped onto the model's unconstrained scale; every chain gets the same
/// values.
pub fn resolve(
    policy: &InitPolicy,
    n_subjects: usize,
    chains: usize,
) -> Result<Option<Vec<InitValues>>, DdError> {
    let values = match policy {
        InitPolicy::Random => return Ok(None),
        InitPolicy::Fixed => FIXED_INITS.to_vec(),
        InitPolicy::Custom(values) => values.clone(),
    };
    if values.len() != FIXED_INITS.len() {
        return Err(DdError::InvalidConfig(
            ErrorInfo::new(
                "inits-length",
                "initial values must supply exactly one value per parameter",
            )
            .with_context("expected", FIXED_INITS.len().to_string())
            .with_context("actual", values.len().to_string())
            .with_hint("use `fixed`, `random`, or three values for r, s and beta"),
        ));
    }

    let mut mu_p = Vec::with_capacity(values.len());
    for ((value, upper), label) in values.iter().zip(PARAMETER_UPPER).zip(PARAMETER_LABELS) {
        if !(*value > 0.0 && *value < upper) {
            return Err(DdError::InvalidConfig(
                ErrorInfo::new("inits-range", "initial value outside parameter support")
                    .with_context("parameter", label)
                    .with_context("value", value.to_string())
                    .with_context("upper", upper.to_string()),
            ));
        }
        mu_p.push(probit(value / upper)?);
    }

    let chain_values = InitValues::default()
        .with("mu_p", InitValue::Vector(mu_p.clone()))
        .with("sigma", InitValue::Vector(vec![1.0; mu_p.len()]))
        .with("r_pr", InitValue::Vector(vec![mu_p[0]; n_subjects]))
        .with("s_pr", InitValue::Vector(vec![mu_p[1]; n_subjects]))
        .with("beta_pr", InitValue::Vector(vec![mu_p[2]; n_subjects]));
    Ok(Some(vec![chain_values; chains]))
}

/// Inverse of the standard normal CDF.
///
/// `p` must lie in `[0, 1]`; the end points map to infinities.
pub fn probit(p: f64) -> Result<f64, DdError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(DdError::invalid_config(
            "probit-domain",
            "probability outside [0, 1]",
            "p",
            p,
        ));
    }
    let standard = Normal::new(0.0, 1.0)
        .map_err(|err| DdError::InvalidConfig(ErrorInfo::new("probit-normal", err.to_string())))?;
    Ok(standard.inverse_cdf(p))
}
