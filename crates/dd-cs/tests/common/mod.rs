#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use dd_core::{
    chain_seed, DdError, ErrorInfo, InitValue, ModelData, ParameterDraws, PosteriorDraws,
    PosteriorSampler, SamplerSettings,
};
use dd_cs::notify::{Notification, Notifier};
use rand::distributions::Open01;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

pub const HEADER: &str =
    "subjID\tdelay_later\tamount_later\tdelay_sooner\tamount_sooner\tchoice";

/// Writes a tab-delimited table with the standard header and returns its path.
pub fn write_table(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut contents = String::from(HEADER);
    contents.push('\n');
    for row in rows {
        contents.push_str(row);
        contents.push('\n');
    }
    fs::write(&path, contents).unwrap();
    path
}

/// Two subjects, four trials each, later option always chosen when `later`.
pub fn two_subject_rows(later: bool) -> Vec<String> {
    let choice = if later { 1 } else { 0 };
    let trials = [(7.0, 15.0), (14.0, 20.0), (30.0, 25.0), (60.0, 30.0)];
    let mut rows = Vec::new();
    for subject in ["a", "b"] {
        for (delay, amount) in trials {
            rows.push(format!("{subject}\t{delay}\t{amount}\t0\t10\t{choice}"));
        }
    }
    rows
}

fn phi_approx(x: f64) -> f64 {
    1.0 / (1.0 + (-(0.07056 * x.powi(3) + 1.5976 * x)).exp())
}

fn log_inv_logit(z: f64) -> f64 {
    if z > 0.0 {
        -(-z).exp().ln_1p()
    } else {
        z - z.exp().ln_1p()
    }
}

/// Independent per-subject random-walk Metropolis over the CS likelihood.
///
/// Each subject's `(r, s, beta)` lives on the probit-like scale used by the
/// hierarchical model with standard normal priors; group parameters are
/// reported as across-subject means.
pub struct MetropolisSampler {
    pub proposal_scale: f64,
}

impl Default for MetropolisSampler {
    fn default() -> Self {
        Self {
            proposal_scale: 0.5,
        }
    }
}

fn constrain(x: &[f64; 3]) -> (f64, f64, f64) {
    (phi_approx(x[0]), phi_approx(x[1]) * 10.0, phi_approx(x[2]) * 5.0)
}

fn log_posterior(data: &ModelData, subject: usize, x: &[f64; 3]) -> f64 {
    let (r, s, beta) = constrain(x);
    let prior = -0.5 * x.iter().map(|v| v * v).sum::<f64>();
    let mut ll = 0.0;
    for t in 0..data.trials_per_subject[subject] {
        let ev_later =
            data.amount_later[subject][t] * (-(r * data.delay_later[subject][t]).powf(s)).exp();
        let ev_sooner =
            data.amount_sooner[subject][t] * (-(r * data.delay_sooner[subject][t]).powf(s)).exp();
        let z = beta * (ev_later - ev_sooner);
        ll += if data.choice[subject][t] == 1 {
            log_inv_logit(z)
        } else {
            log_inv_logit(-z)
        };
    }
    prior + ll
}

fn starting_point(
    settings: &SamplerSettings,
    chain: usize,
    subject: usize,
    rng: &mut StdRng,
) -> [f64; 3] {
    let from_init = settings.inits.as_ref().and_then(|inits| {
        let values = inits.get(chain)?;
        let mut x = [0.0; 3];
        for (slot, name) in ["r_pr", "s_pr", "beta_pr"].iter().enumerate() {
            match values.get(name)? {
                InitValue::Vector(v) => x[slot] = *v.get(subject)?,
                InitValue::Scalar(v) => x[slot] = *v,
            }
        }
        Some(x)
    });
    from_init.unwrap_or_else(|| {
        [
            0.5 * rng.sample::<f64, _>(StandardNormal),
            0.5 * rng.sample::<f64, _>(StandardNormal),
            0.5 * rng.sample::<f64, _>(StandardNormal),
        ]
    })
}

impl PosteriorSampler for MetropolisSampler {
    fn name(&self) -> &str {
        "metropolis-test"
    }

    fn sample(
        &self,
        data: &ModelData,
        settings: &SamplerSettings,
    ) -> Result<PosteriorDraws, DdError> {
        let n = data.n_subjects;
        let mut draws = PosteriorDraws::new();
        for chain in 0..settings.chains {
            let mut rng = StdRng::seed_from_u64(chain_seed(settings.seed, chain));
            let mut states: Vec<[f64; 3]> = (0..n)
                .map(|subject| starting_point(settings, chain, subject, &mut rng))
                .collect();
            let mut current: Vec<f64> = (0..n)
                .map(|subject| log_posterior(data, subject, &states[subject]))
                .collect();

            for iteration in 0..settings.iterations {
                for subject in 0..n {
                    let mut candidate = states[subject];
                    for value in candidate.iter_mut() {
                        *value += self.proposal_scale * rng.sample::<f64, _>(StandardNormal);
                    }
                    let proposed = log_posterior(data, subject, &candidate);
                    if rng.sample::<f64, _>(Open01).ln() < proposed - current[subject] {
                        states[subject] = candidate;
                        current[subject] = proposed;
                    }
                }
                if iteration < settings.warmup
                    || (iteration - settings.warmup) % settings.thin != 0
                {
                    continue;
                }
                let constrained: Vec<(f64, f64, f64)> = states.iter().map(constrain).collect();
                let r: Vec<f64> = constrained.iter().map(|c| c.0).collect();
                let s: Vec<f64> = constrained.iter().map(|c| c.1).collect();
                let beta: Vec<f64> = constrained.iter().map(|c| c.2).collect();
                let log_r: Vec<f64> = r.iter().map(|v| v.ln()).collect();
                let group = |values: &[f64]| vec![values.iter().sum::<f64>() / values.len() as f64];
                draws.entry("mu_r", 1).push(chain, group(&r))?;
                draws.entry("mu_s", 1).push(chain, group(&s))?;
                draws.entry("mu_beta", 1).push(chain, group(&beta))?;
                draws.entry("r", n).push(chain, r)?;
                draws.entry("s", n).push(chain, s)?;
                draws.entry("beta", n).push(chain, beta)?;
                draws.entry("logR", n).push(chain, log_r)?;
            }
        }
        Ok(draws)
    }
}

/// Returns the same draws on every call and remembers the settings it saw.
pub struct CannedSampler {
    draws: PosteriorDraws,
    pub calls: AtomicUsize,
    pub last_settings: Mutex<Option<SamplerSettings>>,
}

impl CannedSampler {
    pub fn new(draws: PosteriorDraws) -> Self {
        Self {
            draws,
            calls: AtomicUsize::new(0),
            last_settings: Mutex::new(None),
        }
    }

    /// Constant draws for `n` subjects: every element equals `value`.
    pub fn constant(n: usize, value: f64) -> Self {
        let mut draws = PosteriorDraws::new();
        for name in ["r", "s", "beta", "logR"] {
            let mut parameter = ParameterDraws::new(n);
            for _ in 0..10 {
                parameter.push(0, vec![value; n]).unwrap();
            }
            draws.insert(name, parameter);
        }
        Self::new(draws)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn settings(&self) -> Option<SamplerSettings> {
        self.last_settings.lock().unwrap().clone()
    }
}

impl PosteriorSampler for CannedSampler {
    fn name(&self) -> &str {
        "canned"
    }

    fn sample(
        &self,
        _data: &ModelData,
        settings: &SamplerSettings,
    ) -> Result<PosteriorDraws, DdError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_settings.lock().unwrap() = Some(settings.clone());
        Ok(self.draws.clone())
    }
}

/// Always fails the way a crashing backend would.
pub struct FailingSampler;

impl PosteriorSampler for FailingSampler {
    fn name(&self) -> &str {
        "failing"
    }

    fn sample(
        &self,
        _data: &ModelData,
        _settings: &SamplerSettings,
    ) -> Result<PosteriorDraws, DdError> {
        Err(DdError::Sampler(ErrorInfo::new("divergent", "sampler gave up")))
    }
}

/// Collects notifications instead of sending them.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

impl Notifier for RecordingNotifier {
    fn send(&self, message: &Notification) -> Result<(), DdError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Rejects every notification.
pub struct RefusingNotifier;

impl Notifier for RefusingNotifier {
    fn send(&self, message: &Notification) -> Result<(), DdError> {
        Err(DdError::Notify(
            ErrorInfo::new("notify-refused", "mail relay refused")
                .with_context("to", message.to.clone()),
        ))
    }
}
