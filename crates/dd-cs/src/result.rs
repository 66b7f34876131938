use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use dd_core::{DdError, ModelData, PosteriorDraws, RunProvenance, SamplerSettings};
use serde::{Deserialize, Serialize};

use crate::data::TrialTable;
use crate::summary::{Reducer, SubjectEstimate};

/// Handle describing how the model was fitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitHandle {
    /// Name of the sampler backend.
    pub backend: String,
    /// Settings the backend was invoked with.
    pub settings: SamplerSettings,
    /// Input bundle handed to the backend.
    pub model_data: ModelData,
}

/// Everything produced by one fit. Not modified after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    /// Model name.
    pub model: String,
    /// Reducer used for [`FitResult::summary`].
    pub reducer: Reducer,
    /// One row per subject, in first-appearance order.
    pub summary: Vec<SubjectEstimate>,
    /// Raw posterior draws as returned by the backend.
    pub draws: PosteriorDraws,
    /// Fitted-model handle.
    pub fit: FitHandle,
    /// Input table.
    pub raw_data: TrialTable,
    /// Seed, input hash and timing.
    pub provenance: RunProvenance,
}

impl FitResult {
    /// Summary row of a subject.
    pub fn subject(&self, id: &str) -> Option<&SubjectEstimate> {
        self.summary.iter().find(|row| row.subject == id)
    }

    /// Renders the summary table as aligned text.
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<12} {:>12} {:>12} {:>12} {:>12}",
            "subjID", "r", "s", "beta", "logR"
        );
        for row in &self.summary {
            let _ = writeln!(
                out,
                "{:<12} {:>12.6} {:>12.6} {:>12.6} {:>12.6}",
                row.subject, row.r, row.s, row.beta, row.log_r
            );
        }
        out
    }

    /// Writes the result to a JSON file, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<(), DdError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| DdError::io("archive-mkdir", err, parent))?;
        }
        let json =
            serde_json::to_string(self).map_err(|err| DdError::io("archive-serialize", err, path))?;
        fs::write(path, json).map_err(|err| DdError::io("archive-write", err, path))
    }

    /// Loads a result written by [`FitResult::write`].
    pub fn load(path: &Path) -> Result<Self, DdError> {
        let contents =
            fs::read_to_string(path).map_err(|err| DdError::io("archive-read", err, path))?;
        serde_json::from_str(&contents).map_err(|err| DdError::io("archive-parse", err, path))
    }
}
