use std::fmt;
use std::str::FromStr;

use dd_core::{DdError, ErrorInfo, PosteriorDraws};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics, Statistics};

/// Per-subject quantities reduced into the summary table.
pub const TRACKED_PARAMETERS: [&str; 4] = ["r", "s", "beta", "logR"];

const KDE_GRID_POINTS: usize = 512;
const KDE_CUT: f64 = 3.0;

/// Reduction applied to a parameter's pooled draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reducer {
    /// Arithmetic mean.
    #[default]
    Mean,
    /// Sample median.
    Median,
    /// Peak of a Gaussian kernel density estimate.
    Mode,
}

impl Reducer {
    /// Reduces `values` to a single scalar.
    pub fn reduce(self, values: &[f64]) -> Result<f64, DdError> {
        if values.is_empty() {
            return Err(DdError::Data(ErrorInfo::new(
                "empty-draws",
                "cannot summarise an empty draw collection",
            )));
        }
        Ok(match self {
            Reducer::Mean => mean(values),
            Reducer::Median => median(values),
            Reducer::Mode => estimate_mode(values),
        })
    }
}

impl FromStr for Reducer {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "mean" => Ok(Reducer::Mean),
            "median" => Ok(Reducer::Median),
            "mode" => Ok(Reducer::Mode),
            other => Err(format!("unknown reducer `{other}` (expected mean, median or mode)")),
        }
    }
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reducer::Mean => "mean",
            Reducer::Median => "median",
            Reducer::Mode => "mode",
        };
        f.write_str(name)
    }
}

/// One row of the per-subject summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectEstimate {
    /// Subject identifier.
    #[serde(rename = "subjID")]
    pub subject: String,
    /// Discount rate.
    pub r: f64,
    /// Impatience exponent.
    pub s: f64,
    /// Inverse temperature.
    pub beta: f64,
    /// Log of the discount rate.
    #[serde(rename = "logR")]
    pub log_r: f64,
}

/// Reduces per-subject draws of every tracked parameter.
///
/// `subjects` gives the row order and must match the width of each tracked
/// parameter.
pub fn summarize(
    draws: &PosteriorDraws,
    subjects: &[String],
    reducer: Reducer,
) -> Result<Vec<SubjectEstimate>, DdError> {
    let mut columns = Vec::with_capacity(TRACKED_PARAMETERS.len());
    for name in TRACKED_PARAMETERS {
        let parameter = draws.get(name).ok_or_else(|| {
            DdError::Sampler(
                ErrorInfo::new("missing-parameter", "sampler returned no draws for parameter")
                    .with_context("parameter", name),
            )
        })?;
        if parameter.width() != subjects.len() {
            return Err(DdError::Sampler(
                ErrorInfo::new("parameter-width", "parameter width does not match subject count")
                    .with_context("parameter", name)
                    .with_context("width", parameter.width().to_string())
                    .with_context("subjects", subjects.len().to_string()),
            ));
        }
        let column = (0..subjects.len())
            .map(|index| reducer.reduce(&parameter.element(index)))
            .collect::<Result<Vec<_>, _>>()?;
        columns.push(column);
    }

    Ok(subjects
        .iter()
        .enumerate()
        .map(|(index, subject)| SubjectEstimate {
            subject: subject.clone(),
            r: columns[0][index],
            s: columns[1][index],
            beta: columns[2][index],
            log_r: columns[3][index],
        })
        .collect())
}

/// Arithmetic mean; `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().mean()
}

/// Median, averaging the two central values for even counts.
pub fn median(values: &[f64]) -> f64 {
    let sorted = sorted(values);
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        0.5 * (sorted[n / 2 - 1] + sorted[n / 2])
    }
}

/// Location of the highest point of a Gaussian kernel density estimate.
///
/// The density is evaluated on a fixed grid spanning the data range widened
/// by three bandwidths on each side.
pub fn estimate_mode(values: &[f64]) -> f64 {
    let sorted = sorted(values);
    if sorted.is_empty() {
        return f64::NAN;
    }
    let bandwidth = silverman_bandwidth(&sorted);
    let lo = sorted[0] - KDE_CUT * bandwidth;
    let hi = sorted[sorted.len() - 1] + KDE_CUT * bandwidth;
    let step = (hi - lo) / (KDE_GRID_POINTS - 1) as f64;

    let mut best = (f64::NEG_INFINITY, sorted[0]);
    for point in 0..KDE_GRID_POINTS {
        let x = lo + step * point as f64;
        let density: f64 = sorted
            .iter()
            .map(|value| {
                let z = (x - value) / bandwidth;
                (-0.5 * z * z).exp()
            })
            .sum();
        if density > best.0 {
            best = (density, x);
        }
    }
    best.1
}

/// Silverman's rule-of-thumb bandwidth for sorted data.
pub fn silverman_bandwidth(sorted: &[f64]) -> f64 {
    let n = sorted.len() as f64;
    let sd = if sorted.len() > 1 {
        sorted.iter().std_dev()
    } else {
        0.0
    };
    let iqr = Data::new(sorted.to_vec()).interquartile_range();
    let mut spread = sd.min(iqr / 1.34);
    if spread <= 0.0 {
        spread = if sd > 0.0 {
            sd
        } else if sorted[0] != 0.0 {
            sorted[0].abs()
        } else {
            1.0
        };
    }
    0.9 * spread * n.powf(-0.2)
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}
