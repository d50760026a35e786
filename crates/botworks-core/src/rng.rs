//! Deterministic PRNG for the random draws commands consume.
//!
//! Uses the SplitMix64 algorithm: fast, 8 bytes of state, excellent
//! statistical properties, and trivially serializable for snapshots.
//! The generator is always passed in explicitly; nothing in the core
//! reads an ambient source of randomness.

use crate::fixed::Fixed64;

/// SplitMix64 pseudo-random number generator.
///
/// Deterministic across platforms, which is what makes replay exact.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform draw in `[0, 1)`.
    ///
    /// The upper 32 bits of the next output become the fractional bits of
    /// a Q32.32 value with a zero integer part.
    pub fn next_unit(&mut self) -> Fixed64 {
        Fixed64::from_bits((self.next_u64() >> 32) as i64)
    }

    /// Uniform draw in `[0, span)`.
    pub fn next_below(&mut self, span: Fixed64) -> Fixed64 {
        self.next_unit().saturating_mul(span)
    }
}
