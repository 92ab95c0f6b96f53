//! Seeded PRNG hierarchy.
//!
//! A seed string hashes to a 32-bit state (FNV-1a) which seeds an
//! independent float stream. Streams can spawn child streams by consuming
//! exactly one value from themselves; parent and child never share output
//! after the spawn point. The renderer leans on this to give every visual
//! phase its own stream, so a change that consumes more draws in one phase
//! cannot reshuffle another phase's randomness.

/// Hash a seed string to a 32-bit stream state. Pure function of the bytes,
/// stable across platforms; the empty string is a valid seed.
pub fn hash_seed(seed: &str) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;

    let mut h = OFFSET_BASIS;
    for &b in seed.as_bytes() {
        h ^= u32::from(b);
        h = h.wrapping_mul(PRIME);
    }
    h
}

/// A deterministic stream of floats in [0,1).
#[derive(Clone, Debug)]
pub struct RngStream {
    inner: fastrand::Rng,
}

impl RngStream {
    /// Construct a stream directly from a 32-bit state.
    pub fn from_state(state: u32) -> Self {
        Self {
            inner: fastrand::Rng::with_seed(u64::from(state)),
        }
    }

    /// Construct a stream from a seed string via [`hash_seed`].
    pub fn from_seed_str(seed: &str) -> Self {
        Self::from_state(hash_seed(seed))
    }

    /// Next float in [0,1).
    pub fn next_f64(&mut self) -> f64 {
        self.inner.f64()
    }

    /// Next float in [lo, hi).
    pub fn in_range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Spawn an independent child stream, consuming exactly one draw from
    /// `self`. The draw is scaled to a 32-bit integer and used as the child
    /// state without re-hashing.
    pub fn child(&mut self) -> RngStream {
        let state = (self.next_f64() * 4_294_967_296.0) as u32;
        Self::from_state(state)
    }
}
