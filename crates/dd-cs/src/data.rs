use std::fmt;
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use dd_core::{DdError, ErrorInfo};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Label used for the bundled example table.
pub const EXAMPLE_LABEL: &str = "dd_exampleData";

const EXAMPLE_TABLE: &str = include_str!("../data/dd_exampleData.txt");

/// One observed choice between a sooner and a later reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Subject identifier.
    #[serde(rename = "subjID")]
    pub subject: String,
    /// Delay of the later option.
    pub delay_later: f64,
    /// Amount of the later option.
    pub amount_later: f64,
    /// Delay of the sooner option.
    pub delay_sooner: f64,
    /// Amount of the sooner option.
    pub amount_sooner: f64,
    /// 1 when the later option was chosen, 0 otherwise.
    pub choice: i32,
}

/// Where the trial table comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// Tab-delimited file on disk.
    Path(PathBuf),
    /// Ask for a path on the terminal.
    Choose,
    /// Bundled example table.
    Example,
}

impl FromStr for DataSource {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value {
            "choose" => DataSource::Choose,
            "example" => DataSource::Example,
            other => DataSource::Path(PathBuf::from(other)),
        })
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Path(path) => write!(f, "{}", path.display()),
            DataSource::Choose => write!(f, "choose"),
            DataSource::Example => write!(f, "example"),
        }
    }
}

/// Parsed trial table together with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialTable {
    /// File stem of the source, or [`EXAMPLE_LABEL`].
    pub label: String,
    /// Path the table was read from, if any.
    pub source: Option<PathBuf>,
    /// Hex SHA-256 of the raw table bytes.
    pub input_hash: String,
    /// Trials in file order.
    pub records: Vec<TrialRecord>,
}

impl TrialTable {
    /// Distinct subject identifiers in order of first appearance.
    pub fn subjects(&self) -> Vec<String> {
        let set: IndexSet<&str> = self
            .records
            .iter()
            .map(|record| record.subject.as_str())
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Number of trials.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when the table holds no trials.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Loads the trial table named by `source`.
///
/// [`DataSource::Choose`] reads a path from standard input.
pub fn load(source: &DataSource) -> Result<TrialTable, DdError> {
    match source {
        DataSource::Path(path) => load_path(path),
        DataSource::Example => parse_table(EXAMPLE_TABLE.as_bytes(), EXAMPLE_LABEL, None),
        DataSource::Choose => {
            let stdin = std::io::stdin();
            let path = prompt_for_path(stdin.lock(), std::io::stderr())?;
            load_path(&path)
        }
    }
}

/// Prompts on `prompt` and reads one path from `input`.
pub fn prompt_for_path<R: BufRead, W: Write>(mut input: R, mut prompt: W) -> Result<PathBuf, DdError> {
    write!(prompt, "Path to tab-delimited data file: ")
        .and_then(|_| prompt.flush())
        .map_err(|err| DdError::Serde(ErrorInfo::new("prompt-write", err.to_string())))?;
    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|err| DdError::Serde(ErrorInfo::new("prompt-read", err.to_string())))?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(DdError::MissingInput(
            ErrorInfo::new("no-file-chosen", "no data file was chosen")
                .with_hint("enter the path of a tab-delimited file"),
        ));
    }
    Ok(PathBuf::from(trimmed))
}

/// Loads a tab-delimited trial table from disk.
pub fn load_path(path: &Path) -> Result<TrialTable, DdError> {
    if !path.is_file() {
        return Err(DdError::MissingInput(
            ErrorInfo::new("input-not-found", "data file does not exist")
                .with_context("path", path.display().to_string())
                .with_hint("check the file name or pass `example` for bundled data"),
        ));
    }
    let bytes = fs::read(path).map_err(|err| DdError::io("input-read", err, path))?;
    let label = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "data".to_string());
    parse_table(&bytes, &label, Some(path))
}

/// Parses table bytes. Columns beyond the six required ones are ignored.
pub fn parse_table(bytes: &[u8], label: &str, source: Option<&Path>) -> Result<TrialTable, DdError> {
    let origin = source
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| label.to_string());
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut records = Vec::new();
    for (row, result) in reader.deserialize::<TrialRecord>().enumerate() {
        let record = result.map_err(|err| {
            DdError::Data(
                ErrorInfo::new("table-parse", err.to_string())
                    .with_context("source", origin.clone())
                    .with_context("row", (row + 1).to_string())
                    .with_hint(
                        "required columns: subjID, delay_later, amount_later, delay_sooner, amount_sooner, choice",
                    ),
            )
        })?;
        records.push(record);
    }
    if records.is_empty() {
        return Err(DdError::Data(
            ErrorInfo::new("table-empty", "data table contains no trials")
                .with_context("source", origin),
        ));
    }

    Ok(TrialTable {
        label: label.to_string(),
        source: source.map(Path::to_path_buf),
        input_hash: hex::encode(Sha256::digest(bytes)),
        records,
    })
}
