use std::error::Error;
use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use dd_cs::diagnostics::{self, RHAT_THRESHOLD};
use dd_cs::{fit, CmdStanSampler, DataSource, FitConfig, FitResult, InitPolicy, Reducer};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "dd-cli", about = "Hierarchical delay-discounting model fits")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit the constant-sensitivity model and print per-subject estimates.
    Fit(FitArgs),
    /// Print the summary of a saved fit archive.
    Inspect(InspectArgs),
}

#[derive(ClapArgs, Debug)]
struct FitArgs {
    /// Data file path, `choose` to be prompted, or `example` for bundled data.
    #[arg(long)]
    data: DataSource,
    /// Compiled CmdStan executable of the dd_cs model.
    #[arg(long)]
    model_exe: PathBuf,
    /// Keep CmdStan data, init and output files in this directory.
    #[arg(long)]
    work_dir: Option<PathBuf>,
    /// YAML configuration; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    iterations: Option<usize>,
    #[arg(long)]
    warmup: Option<usize>,
    #[arg(long)]
    chains: Option<usize>,
    #[arg(long)]
    cores: Option<usize>,
    #[arg(long)]
    thin: Option<usize>,
    /// `fixed`, `random`, or three comma separated values for r, s and beta.
    #[arg(long)]
    inits: Option<InitPolicy>,
    /// Point estimate per subject: `mean`, `median` or `mode`.
    #[arg(long)]
    ind_pars: Option<Reducer>,
    /// Directory receiving a timestamped JSON archive.
    #[arg(long)]
    save_dir: Option<PathBuf>,
    /// Address notified through sendmail when the fit completes.
    #[arg(long)]
    email: Option<String>,
    /// Request model-based regressors (not available for this model).
    #[arg(long)]
    model_regressor: bool,
    #[arg(long)]
    adapt_delta: Option<f64>,
    #[arg(long)]
    stepsize: Option<f64>,
    #[arg(long)]
    max_treedepth: Option<usize>,
    /// Master seed for chain seed derivation.
    #[arg(long)]
    seed: Option<u64>,
    /// Also write the full result as JSON to this path.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct InspectArgs {
    /// Archive written by `dd-cli fit`.
    #[arg(long)]
    archive: PathBuf,
    /// Report split R-hat for every parameter element.
    #[arg(long)]
    rhat: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing()?;
    let cli = Cli::parse();
    match cli.command {
        Command::Fit(args) => run_fit(args),
        Command::Inspect(args) => run_inspect(args),
    }
}

fn init_tracing() -> Result<(), Box<dyn Error>> {
    let log_format = std::env::var("DD_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("dd=info"))?;

    match log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init()?,
    }
    Ok(())
}

fn run_fit(args: FitArgs) -> Result<(), Box<dyn Error>> {
    let config = resolve_config(&args)?;
    let mut sampler = CmdStanSampler::new(&args.model_exe);
    if let Some(dir) = &args.work_dir {
        sampler = sampler.with_work_dir(dir);
    }

    let result = fit(&args.data, &config, &sampler)?;
    print!("{}", result.render_summary());

    if let Some(path) = &args.out {
        result.write(path)?;
        info!(path = %path.display(), "fit result written");
    }
    Ok(())
}

fn resolve_config(args: &FitArgs) -> Result<FitConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => FitConfig::load(path)?,
        None => FitConfig::default(),
    };
    apply_overrides(&mut config, args);
    Ok(config)
}

fn apply_overrides(config: &mut FitConfig, args: &FitArgs) {
    if let Some(value) = args.iterations {
        config.iterations = value;
    }
    if let Some(value) = args.warmup {
        config.warmup = value;
    }
    if let Some(value) = args.chains {
        config.chains = value;
    }
    if let Some(value) = args.cores {
        config.cores = value;
    }
    if let Some(value) = args.thin {
        config.thin = value;
    }
    if let Some(policy) = &args.inits {
        config.inits = policy.clone();
    }
    if let Some(reducer) = args.ind_pars {
        config.ind_pars = reducer;
    }
    if let Some(dir) = &args.save_dir {
        config.output.save_dir = Some(dir.clone());
    }
    if let Some(address) = &args.email {
        config.email = Some(address.clone());
    }
    if args.model_regressor {
        config.model_regressor = true;
    }
    if let Some(value) = args.adapt_delta {
        config.tuning.adapt_delta = value;
    }
    if let Some(value) = args.stepsize {
        config.tuning.stepsize = value;
    }
    if let Some(value) = args.max_treedepth {
        config.tuning.max_treedepth = value;
    }
    if let Some(seed) = args.seed {
        config.seed_policy.master_seed = seed;
    }
}

fn run_inspect(args: InspectArgs) -> Result<(), Box<dyn Error>> {
    let result = FitResult::load(&args.archive)?;
    println!(
        "model {} on `{}` ({} reducer, backend {})",
        result.model, result.raw_data.label, result.reducer, result.fit.backend
    );
    println!(
        "started {} finished {} seed {:#x}",
        result.provenance.started_at, result.provenance.finished_at, result.provenance.seed
    );
    print!("{}", result.render_summary());

    if args.rhat {
        let values = diagnostics::rhat(&result.draws);
        for (label, value) in &values {
            println!("{label:<16} {value:>8.4}");
        }
        let flagged = diagnostics::unconverged(&values);
        if !flagged.is_empty() {
            warn!(
                threshold = RHAT_THRESHOLD,
                parameters = ?flagged,
                "split R-hat above threshold"
            );
        }
        println!("{}", serde_json::to_string(&flagged)?);
    }
    Ok(())
}
