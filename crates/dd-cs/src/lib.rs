#![deny(missing_docs)]

//! Hierarchical constant-sensitivity delay-discounting fits.
//!
//! The crate loads a tab-delimited table of sooner/later choices, hands it
//! to a [`dd_core::PosteriorSampler`] backend and reduces the posterior
//! draws to one row of estimates per subject.

/// CmdStan sampler backend.
pub mod cmdstan;
/// Fit configuration schema and defaults.
pub mod config;
/// Trial table sources and parsing.
pub mod data;
/// Split R-hat convergence diagnostics.
pub mod diagnostics;
/// Pipeline entry points.
pub mod fit;
/// Initial-value strategies.
pub mod inits;
/// Trial table to model input layout.
pub mod marshal;
/// Completion notifications.
pub mod notify;
/// Worker count resolution.
pub mod parallel;
/// Timestamped archives.
pub mod persist;
/// Fit result packaging.
pub mod result;
/// Posterior reducers and the per-subject summary table.
pub mod summary;

pub use cmdstan::CmdStanSampler;
pub use config::{FitConfig, OutputConfig, SeedPolicy, TuningConfig};
pub use data::{DataSource, TrialRecord, TrialTable};
pub use fit::{fit, fit_with_notifier, MODEL_NAME, MODEL_PARAMETERS};
pub use inits::InitPolicy;
pub use notify::{Notification, Notifier, SendmailNotifier};
pub use result::{FitHandle, FitResult};
pub use summary::{Reducer, SubjectEstimate};
