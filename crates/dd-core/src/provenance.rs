//! Provenance attached to fit archives.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Provenance information attached to every persisted fit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RunProvenance {
    /// Hex SHA-256 of the raw input table bytes.
    pub input_hash: String,
    /// Label of the data source (file stem or bundled example name).
    pub source_label: String,
    /// Master seed from which chain seeds were derived.
    pub seed: u64,
    /// Free-form label attached to the seed, if one was configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_label: Option<String>,
    /// ISO-8601 timestamp recording when the fit started.
    pub started_at: String,
    /// ISO-8601 timestamp recording when the fit finished.
    pub finished_at: String,
    /// Version map for all tools involved in the run.
    pub tool_versions: BTreeMap<String, String>,
}

impl RunProvenance {
    /// Records a tool version, returning the updated provenance.
    pub fn with_tool(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.tool_versions.insert(name.into(), version.into());
        self
    }
}
