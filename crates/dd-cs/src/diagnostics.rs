use std::collections::BTreeMap;

use dd_core::PosteriorDraws;

/// Split R-hat above which a parameter is reported as not converged.
pub const RHAT_THRESHOLD: f64 = 1.1;

/// Split R-hat for every parameter element, keyed `name` or `name[i]` (1-based).
///
/// Each chain is cut into two halves which are treated as separate chains.
/// Elements with fewer than two draws per half get `NaN`.
pub fn rhat(draws: &PosteriorDraws) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();
    for (name, parameter) in draws.iter() {
        for index in 0..parameter.width() {
            let label = if parameter.width() == 1 {
                name.to_string()
            } else {
                format!("{name}[{}]", index + 1)
            };
            out.insert(label, split_rhat(&parameter.element_by_chain(index)));
        }
    }
    out
}

/// Labels whose split R-hat exceeds [`RHAT_THRESHOLD`] or is not finite.
pub fn unconverged(rhats: &BTreeMap<String, f64>) -> Vec<&str> {
    rhats
        .iter()
        .filter(|(_, value)| !value.is_finite() || **value > RHAT_THRESHOLD)
        .map(|(label, _)| label.as_str())
        .collect()
}

/// Split R-hat of one scalar across chains.
pub fn split_rhat(chains: &[Vec<f64>]) -> f64 {
    let half = chains.iter().map(Vec::len).min().unwrap_or(0) / 2;
    if half < 2 {
        return f64::NAN;
    }
    let halves: Vec<&[f64]> = chains
        .iter()
        .flat_map(|chain| {
            let tail_start = chain.len() - half;
            [&chain[..half], &chain[tail_start..]]
        })
        .collect();

    let m = halves.len() as f64;
    let n = half as f64;
    let means: Vec<f64> = halves
        .iter()
        .map(|values| values.iter().sum::<f64>() / n)
        .collect();
    let variances: Vec<f64> = halves
        .iter()
        .zip(&means)
        .map(|(values, mean)| values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0))
        .collect();

    let grand_mean = means.iter().sum::<f64>() / m;
    let between = n * means.iter().map(|mu| (mu - grand_mean).powi(2)).sum::<f64>() / (m - 1.0);
    let within = variances.iter().sum::<f64>() / m;
    if within <= 0.0 {
        return if between <= 0.0 { 1.0 } else { f64::INFINITY };
    }
    let var_plus = ((n - 1.0) * within + between) / n;
    (var_plus / within).sqrt()
}
