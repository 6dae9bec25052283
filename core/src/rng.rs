//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulator may call any platform RNG.
//! All randomness flows through SimRng instances that the caller
//! owns and passes in explicitly.
//!
//! Batches of scenarios get their own streams, seeded deterministically
//! from (master_seed XOR stream_index). This means:
//!   - Adding a scenario to a batch never changes earlier scenarios' streams.
//!   - Each scenario's stream is fully reproducible in isolation.
//!   - Concurrent callers never share mutable generator state.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

use crate::types::DEFAULT_SEED;

const STREAM_MIX: u64 = 0x9e37_79b9_7f4a_7c15;

/// A named, deterministic RNG owned by a single simulation call.
#[derive(Clone, Debug)]
pub struct SimRng {
    /// Shown in simulator logs to tell streams apart.
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Stream `index` derived from `master_seed`. The index must stay
    /// stable for a given scenario or its results change.
    pub fn derived(master_seed: u64, index: u64) -> Self {
        Self::new(master_seed ^ index.wrapping_mul(STREAM_MIX))
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl Default for SimRng {
    fn default() -> Self {
        Self::new(DEFAULT_SEED).with_name("default")
    }
}

impl RngCore for SimRng {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

/// Hands out independent streams for a batch of simulation calls.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn for_scenario(&self, index: usize) -> SimRng {
        SimRng::derived(self.master_seed, index as u64).with_name("scenario")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = SimRng::new(7);
        let mut b = SimRng::new(7);
        for _ in 0..64 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn bank_streams_are_independent_of_each_other() {
        let bank = RngBank::new(42);
        let mut s0 = bank.for_scenario(0);
        let mut s1 = bank.for_scenario(1);
        assert_ne!(s0.next_u64(), s1.next_u64());

        // Re-deriving a stream reproduces it exactly.
        let mut again = RngBank::new(42).for_scenario(1);
        let mut s1_fresh = bank.for_scenario(1);
        assert_eq!(again.next_u64(), s1_fresh.next_u64());
    }

    #[test]
    fn stream_zero_matches_plain_seed() {
        let mut derived = SimRng::derived(99, 0);
        let mut plain = SimRng::new(99);
        assert_eq!(derived.next_u64(), plain.next_u64());
    }
}
