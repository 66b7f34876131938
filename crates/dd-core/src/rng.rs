//! Per-chain seed derivation.
//!
//! Chain `k` of a run is seeded with `chain_seed(master_seed, k)`, never with
//! the master seed itself. Backends seed whatever generator they use from it.

use siphasher::sip::SipHasher13;
use std::hash::Hasher;

/// SipHash-1-3 (zero keys) of `(master_seed, substream)`.
pub fn derive_substream_seed(master_seed: u64, substream: u64) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(0, 0);
    hasher.write_u64(master_seed);
    hasher.write_u64(substream);
    hasher.finish()
}

/// Seed handed to chain `chain` (0-based) of a run.
pub fn chain_seed(master_seed: u64, chain: usize) -> u64 {
    derive_substream_seed(master_seed, chain as u64)
}
