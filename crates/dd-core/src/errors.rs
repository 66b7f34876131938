//! Structured error types shared across the delay-discounting crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Code, message and key/value context carried by every [`DdError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable kebab-case code, e.g. `inits-length`.
    pub code: String,
    /// What went wrong.
    pub message: String,
    /// Offending values: paths, parameter names, expected and actual sizes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
    /// How to fix it, when that is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Payload with no context and no hint.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Records `key = value`, replacing an earlier value for `key`.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attaches a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for model fits.
///
/// Every family is fatal to the invocation that raised it; nothing in the
/// pipeline retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum DdError {
    /// A disabled feature was requested.
    #[error("unsupported feature: {0}")]
    Unsupported(ErrorInfo),
    /// The requested input file does not exist.
    #[error("missing input: {0}")]
    MissingInput(ErrorInfo),
    /// A configuration value is out of range or malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(ErrorInfo),
    /// The trial table could not be parsed or is empty.
    #[error("data error: {0}")]
    Data(ErrorInfo),
    /// Failure raised by, or inside the output of, a sampler backend.
    #[error("sampler error: {0}")]
    Sampler(ErrorInfo),
    /// Serialization, schema and filesystem errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
    /// Completion notification could not be delivered.
    #[error("notification error: {0}")]
    Notify(ErrorInfo),
}

impl Display for ErrorInfo {
    /// Renders `[code] message (key=value, ...); hint: ...`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        let mut pairs = self.context.iter();
        if let Some((key, value)) = pairs.next() {
            write!(f, " ({key}={value}")?;
            for (key, value) in pairs {
                write!(f, ", {key}={value}")?;
            }
            f.write_str(")")?;
        }
        match &self.hint {
            Some(hint) => write!(f, "; hint: {hint}"),
            None => Ok(()),
        }
    }
}

impl DdError {
    /// Payload shared by every family.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            DdError::Unsupported(info)
            | DdError::MissingInput(info)
            | DdError::InvalidConfig(info)
            | DdError::Data(info)
            | DdError::Sampler(info)
            | DdError::Serde(info)
            | DdError::Notify(info) => info,
        }
    }

    /// Shorthand for an [`DdError::InvalidConfig`] with a single context entry.
    pub fn invalid_config(
        code: &str,
        message: impl Into<String>,
        key: &str,
        value: impl ToString,
    ) -> Self {
        DdError::InvalidConfig(ErrorInfo::new(code, message).with_context(key, value.to_string()))
    }

    /// Wraps an I/O or codec failure against a path as a [`DdError::Serde`].
    pub fn io(code: &str, err: impl ToString, path: &std::path::Path) -> Self {
        DdError::Serde(
            ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
        )
    }
}
