use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

/// Create a deterministic RNG from a seed.
pub fn create_rng(seed: u64) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(seed)
}

/// Stream owned by one `PeakLayer`.
///
/// Every layer of a field refreshes and steers its peak from its own stream, so layers can
/// advance on separate rayon workers and a run is still reproduced exactly by `base_seed`.
pub fn derive_layer_rng(base_seed: u64, layer_index: usize) -> ChaCha12Rng {
    let offset = (layer_index as u64).wrapping_mul(crate::constants::RNG_DERIVATION_PRIME);
    ChaCha12Rng::seed_from_u64(base_seed.wrapping_add(offset))
}
