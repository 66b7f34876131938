use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;

use dd_core::{
    chain_seed, DdError, ErrorInfo, ModelData, PosteriorDraws, PosteriorSampler, SamplerSettings,
};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

const STDERR_TAIL_LINES: usize = 20;

/// Sampler backend running a pre-compiled CmdStan executable of the model.
///
/// Every chain is a separate process. Chains run on a rayon pool sized by
/// [`SamplerSettings::cores`].
#[derive(Debug, Clone)]
pub struct CmdStanSampler {
    executable: PathBuf,
    work_dir: Option<PathBuf>,
}

impl CmdStanSampler {
    /// Creates a backend for the compiled model at `executable`.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            work_dir: None,
        }
    }

    /// Keeps data, init and output files in `dir` instead of a temp directory.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    fn run_chain(
        &self,
        dir: &Path,
        settings: &SamplerSettings,
        chain: usize,
    ) -> Result<PathBuf, DdError> {
        let data_file = dir.join("data.json");
        let output_file = dir.join(format!("output-{}.csv", chain + 1));
        let init_file = settings
            .inits
            .as_ref()
            .map(|_| dir.join(format!("init-{}.json", chain + 1)));
        let args = chain_arguments(settings, chain, &data_file, init_file.as_deref(), &output_file);
        debug!(chain = chain + 1, args = ?args, "launching cmdstan chain");

        let output = Command::new(&self.executable)
            .args(&args)
            .current_dir(dir)
            .output()
            .map_err(|err| {
                DdError::Sampler(
                    ErrorInfo::new("chain-spawn", err.to_string())
                        .with_context("executable", self.executable.display().to_string())
                        .with_context("chain", (chain + 1).to_string()),
                )
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.lines().collect();
            let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
            return Err(DdError::Sampler(
                ErrorInfo::new("chain-failed", tail)
                    .with_context("chain", (chain + 1).to_string())
                    .with_context("status", output.status.to_string()),
            ));
        }
        info!(chain = chain + 1, "cmdstan chain finished");
        Ok(output_file)
    }
}

impl PosteriorSampler for CmdStanSampler {
    fn name(&self) -> &str {
        "cmdstan"
    }

    fn sample(
        &self,
        data: &ModelData,
        settings: &SamplerSettings,
    ) -> Result<PosteriorDraws, DdError> {
        if !self.executable.is_file() {
            return Err(DdError::Sampler(
                ErrorInfo::new("executable-missing", "compiled model executable not found")
                    .with_context("path", self.executable.display().to_string())
                    .with_hint("build the dd_cs model with CmdStan and pass its path"),
            ));
        }

        let scratch;
        let dir = match &self.work_dir {
            Some(dir) => {
                fs::create_dir_all(dir).map_err(|err| DdError::io("workdir-mkdir", err, dir))?;
                dir.clone()
            }
            None => {
                scratch = tempfile::tempdir().map_err(|err| {
                    DdError::Sampler(ErrorInfo::new("workdir-temp", err.to_string()))
                })?;
                scratch.path().to_path_buf()
            }
        };

        write_json(&dir.join("data.json"), data)?;
        if let Some(inits) = &settings.inits {
            for (chain, values) in inits.iter().enumerate() {
                write_json(&dir.join(format!("init-{}.json", chain + 1)), values)?;
            }
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(settings.cores.max(1))
            .build()
            .map_err(|err| DdError::Sampler(ErrorInfo::new("thread-pool", err.to_string())))?;
        let outputs: Vec<Result<PathBuf, DdError>> = pool.install(|| {
            (0..settings.chains)
                .into_par_iter()
                .map(|chain| self.run_chain(&dir, settings, chain))
                .collect()
        });

        let expected = settings.kept_draws_per_chain();
        let mut draws = PosteriorDraws::new();
        for (chain, output) in outputs.into_iter().enumerate() {
            let path = output?;
            let file =
                fs::File::open(&path).map_err(|err| DdError::io("output-read", err, &path))?;
            let rows = parse_output(file, chain, &settings.parameters, &mut draws)?;
            if rows != expected {
                return Err(DdError::Sampler(
                    ErrorInfo::new("output-draw-count", "chain kept an unexpected number of draws")
                        .with_context("chain", (chain + 1).to_string())
                        .with_context("expected", expected.to_string())
                        .with_context("actual", rows.to_string()),
                ));
            }
        }
        Ok(draws)
    }
}

/// Command-line arguments for one chain (0-based `chain`).
pub fn chain_arguments(
    settings: &SamplerSettings,
    chain: usize,
    data_file: &Path,
    init_file: Option<&Path>,
    output_file: &Path,
) -> Vec<String> {
    let mut args = vec![
        "sample".to_string(),
        format!("num_samples={}", settings.iterations.saturating_sub(settings.warmup)),
        format!("num_warmup={}", settings.warmup),
        format!("thin={}", settings.thin),
        "adapt".to_string(),
        format!("delta={}", settings.adapt_delta),
        "algorithm=hmc".to_string(),
        "engine=nuts".to_string(),
        format!("max_depth={}", settings.max_treedepth),
        format!("stepsize={}", settings.stepsize),
        format!("id={}", chain + 1),
        "data".to_string(),
        format!("file={}", data_file.display()),
    ];
    if let Some(init) = init_file {
        args.push(format!("init={}", init.display()));
    }
    args.push("random".to_string());
    args.push(format!("seed={}", chain_seed(settings.seed, chain) as u32));
    args.push("output".to_string());
    args.push(format!("file={}", output_file.display()));
    args
}

/// Parses a CmdStan output CSV, appending the draws of `wanted` parameters
/// to `chain`. Returns the number of draws read.
///
/// Comment lines start with `#`. A column `name.k` holds element `k`
/// (1-based) of vector parameter `name`.
pub fn parse_output<R: Read>(
    reader: R,
    chain: usize,
    wanted: &[String],
    draws: &mut PosteriorDraws,
) -> Result<usize, DdError> {
    let mut csv = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .has_headers(true)
        .from_reader(reader);
    let headers = csv
        .headers()
        .map_err(|err| DdError::Sampler(ErrorInfo::new("output-header", err.to_string())))?
        .clone();

    let mut layout: BTreeMap<&str, Vec<(usize, usize)>> = BTreeMap::new();
    for (column, header) in headers.iter().enumerate() {
        if header.ends_with("__") {
            continue;
        }
        let (base, element) = split_column(header);
        if let Some(name) = wanted.iter().find(|name| name.as_str() == base) {
            layout.entry(name.as_str()).or_default().push((column, element));
        }
    }
    for name in wanted {
        if !layout.contains_key(name.as_str()) {
            return Err(DdError::Sampler(
                ErrorInfo::new("output-missing-parameter", "sampler output lacks parameter")
                    .with_context("parameter", name.clone())
                    .with_context("chain", (chain + 1).to_string()),
            ));
        }
    }

    let mut rows = 0;
    for (row, record) in csv.records().enumerate() {
        let record = record.map_err(|err| {
            DdError::Sampler(
                ErrorInfo::new("output-row", err.to_string())
                    .with_context("row", (row + 1).to_string()),
            )
        })?;
        for (name, columns) in &layout {
            let width = columns.iter().map(|(_, element)| *element).max().unwrap_or(1);
            let mut draw = vec![f64::NAN; width];
            for (column, element) in columns {
                let cell = record.get(*column).unwrap_or_default();
                draw[element - 1] = cell.trim().parse().map_err(|_| {
                    DdError::Sampler(
                        ErrorInfo::new("output-cell", "non-numeric draw in sampler output")
                            .with_context("parameter", name.to_string())
                            .with_context("row", (row + 1).to_string())
                            .with_context("value", cell.to_string()),
                    )
                })?;
            }
            draws.entry(name, width).push(chain, draw)?;
        }
        rows += 1;
    }
    Ok(rows)
}

fn split_column(header: &str) -> (&str, usize) {
    match header.split_once('.') {
        Some((base, index)) => match index.parse::<usize>() {
            Ok(element) if element >= 1 => (base, element),
            _ => (header, 1),
        },
        None => (header, 1),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), DdError> {
    let json =
        serde_json::to_string(value).map_err(|err| DdError::io("json-serialize", err, path))?;
    fs::write(path, json).map_err(|err| DdError::io("json-write", err, path))
}
