#![deny(missing_docs)]
#![doc = "Core types, error taxonomy and the sampler seam for delay-discounting model fits."]

pub mod errors;
pub mod provenance;
pub mod rng;
mod types;

pub use errors::{DdError, ErrorInfo};
pub use provenance::RunProvenance;
pub use rng::{chain_seed, derive_substream_seed};
pub use types::{
    InitValue, InitValues, ModelData, ParameterDraws, PosteriorDraws, SamplerSettings,
};

/// Backend that turns model input into posterior draws.
///
/// Implementations own the model definition, the sampling algorithm and all
/// convergence or numerical-stability behaviour. Errors they return are
/// propagated to the caller unchanged.
pub trait PosteriorSampler: Send + Sync {
    /// Short backend name recorded in fit results.
    fn name(&self) -> &str;

    /// Samples the posterior for `data`, returning draws for every name in
    /// `settings.parameters`.
    fn sample(
        &self,
        data: &ModelData,
        settings: &SamplerSettings,
    ) -> Result<PosteriorDraws, DdError>;
}
