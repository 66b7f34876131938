use chrono::Local;
use dd_core::{DdError, ErrorInfo, PosteriorSampler, RunProvenance, SamplerSettings};
use tracing::info;

use crate::config::FitConfig;
use crate::data::{self, DataSource};
use crate::inits;
use crate::marshal;
use crate::notify::{Notification, Notifier, SendmailNotifier};
use crate::parallel;
use crate::persist;
use crate::result::{FitHandle, FitResult};
use crate::summary;

/// Name of the constant-sensitivity discounting model.
pub const MODEL_NAME: &str = "dd_cs";

/// Parameters requested from every backend.
pub const MODEL_PARAMETERS: [&str; 8] = [
    "mu_r", "mu_s", "mu_beta", "sigma", "r", "s", "beta", "logR",
];

/// Fits the model, notifying through [`SendmailNotifier`] when an address is set.
pub fn fit<S>(source: &DataSource, config: &FitConfig, sampler: &S) -> Result<FitResult, DdError>
where
    S: PosteriorSampler + ?Sized,
{
    fit_with_notifier(source, config, sampler, &SendmailNotifier::default())
}

/// Fits the model with an explicit notifier.
///
/// Stages run in order: regressor check, config validation, data loading,
/// init resolution, marshaling, worker resolution, sampling, summarising,
/// then the optional archive and notification. The first failure aborts
/// the fit.
pub fn fit_with_notifier<S, N>(
    source: &DataSource,
    config: &FitConfig,
    sampler: &S,
    notifier: &N,
) -> Result<FitResult, DdError>
where
    S: PosteriorSampler + ?Sized,
    N: Notifier + ?Sized,
{
    if config.model_regressor {
        return Err(DdError::Unsupported(
            ErrorInfo::new(
                "model-regressor",
                "model-based regressors are not available for this model",
            )
            .with_context("model", MODEL_NAME)
            .with_hint("leave model_regressor disabled"),
        ));
    }
    config.validate()?;

    let started = Local::now();
    let table = data::load(source)?;
    let subjects = table.subjects();
    info!(
        source = %source,
        subjects = subjects.len(),
        trials = table.len(),
        "trial table loaded"
    );

    let inits = inits::resolve(&config.inits, subjects.len(), config.chains)?;
    let model_data = marshal::build_model_data(&table);
    let cores = parallel::resolve_cores(config.cores)?;

    let settings = SamplerSettings {
        iterations: config.iterations,
        warmup: config.warmup,
        chains: config.chains,
        thin: config.thin,
        cores,
        adapt_delta: config.tuning.adapt_delta,
        stepsize: config.tuning.stepsize,
        max_treedepth: config.tuning.max_treedepth,
        seed: config.seed_policy.master_seed,
        parameters: MODEL_PARAMETERS.iter().map(|name| name.to_string()).collect(),
        inits,
    };

    info!(
        backend = sampler.name(),
        iterations = settings.iterations,
        warmup = settings.warmup,
        chains = settings.chains,
        cores,
        inits = %config.inits,
        "sampling posterior"
    );
    let draws = sampler.sample(&model_data, &settings)?;
    let summary = summary::summarize(&draws, &subjects, config.ind_pars)?;
    let finished = Local::now();
    info!(reducer = %config.ind_pars, "posterior summarised");

    let provenance = RunProvenance {
        input_hash: table.input_hash.clone(),
        source_label: table.label.clone(),
        seed: settings.seed,
        seed_label: config.seed_policy.label.clone(),
        started_at: started.to_rfc3339(),
        finished_at: finished.to_rfc3339(),
        ..RunProvenance::default()
    }
    .with_tool(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    .with_tool("backend", sampler.name());

    let result = FitResult {
        model: MODEL_NAME.to_string(),
        reducer: config.ind_pars,
        summary,
        draws,
        fit: FitHandle {
            backend: sampler.name().to_string(),
            settings,
            model_data,
        },
        raw_data: table,
        provenance,
    };

    if let Some(dir) = &config.output.save_dir {
        persist::save_archive(&result, dir)?;
    }
    if let Some(address) = &config.email {
        let message = Notification::completed(
            address,
            &result.model,
            &result.raw_data.label,
            &result.provenance.started_at,
            &result.provenance.finished_at,
        );
        notifier.send(&message)?;
        info!(to = %address, "completion notification sent");
    }
    Ok(result)
}
