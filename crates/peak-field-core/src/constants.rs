/// Largest accepted grid extent along either axis (cells).
pub const MAX_GRID_DIM: usize = 4096;

/// Amount at or above which a cell counts as edible.
pub const EDIBLE_THRESHOLD: f64 = 1.0;

/// Number of ticks between opportunities to change movement direction.
pub const DIRECTION_PERIOD: u32 = 20;

/// Starting value of the logistic movement amplitude.
pub const INITIAL_MOVE_SCALAR: f64 = 0.5;

/// Prime multiplier used to derive per-layer RNG streams from a base seed.
/// Chosen so streams for consecutive layer indices have minimal overlap.
pub const RNG_DERIVATION_PRIME: u64 = 7919;

/// Upper bound on peak layers hosted by a single field.
pub const MAX_LAYERS: usize = 256;
