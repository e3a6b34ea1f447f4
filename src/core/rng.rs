//! Deterministic random number generation with per-context streams.
//!
//! ## Key Features
//!
//! - **Deterministic**: Same seed produces identical sequence
//! - **Context streams**: Independent sequences for different purposes
//!   (weight initialisation, split sampling, perturbation)
//!
//! ```
//! use rust_forkdrive::core::SimRng;
//!
//! let rng = SimRng::new(42);
//! let mut weights = rng.for_context("weights");
//! let mut again = SimRng::new(42).for_context("weights");
//! assert_eq!(weights.gen_range_u32(0..100), again.gen_range_u32(0..100));
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x1000_0000_01b3;

/// Deterministic RNG used by the network and the training controller.
///
/// Uses ChaCha8 for speed while maintaining good statistical quality.
#[derive(Clone, Debug)]
pub struct SimRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl SimRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create an independent stream for a specific context.
    ///
    /// The same context always produces the same stream from the same seed,
    /// on every platform and toolchain (FNV-1a over the seed and the name).
    #[must_use]
    pub fn for_context(&self, context: &str) -> Self {
        let bytes = self.seed.to_le_bytes().into_iter().chain(context.bytes());
        let hash = bytes.fold(FNV_OFFSET_BASIS, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
        });
        Self::new(hash)
    }

    /// Uniform float in `[0, 1)`.
    pub fn gen_f32(&mut self) -> f32 {
        self.inner.gen::<f32>()
    }

    /// Uniform float in the given half-open range.
    pub fn gen_range_f32(&mut self, range: std::ops::Range<f32>) -> f32 {
        self.inner.gen_range(range)
    }

    /// Uniform integer in the given half-open range. An empty range yields its start.
    pub fn gen_range_u32(&mut self, range: std::ops::Range<u32>) -> u32 {
        if range.is_empty() {
            return range.start;
        }
        self.inner.gen_range(range)
    }

    /// Uniform index in the given half-open range.
    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    /// Generate a random boolean with given probability of true.
    pub fn gen_bool(&mut self, probability: f64) -> bool {
        self.inner.gen_bool(probability.clamp(0.0, 1.0))
    }

    /// Choose a random element from a slice.
    #[must_use]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let mut rng1 = SimRng::new(42);
        let mut rng2 = SimRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.gen_range_u32(0..1000), rng2.gen_range_u32(0..1000));
        }
    }

    #[test]
    fn test_different_seeds() {
        let mut rng1 = SimRng::new(1);
        let mut rng2 = SimRng::new(2);

        let seq1: Vec<_> = (0..10).map(|_| rng1.gen_range_u32(0..1000)).collect();
        let seq2: Vec<_> = (0..10).map(|_| rng2.gen_range_u32(0..1000)).collect();

        assert_ne!(seq1, seq2);
    }

    #[test]
    fn test_context_produces_different_sequence() {
        let rng = SimRng::new(42);
        let mut ctx1 = rng.for_context("weights");
        let mut ctx2 = rng.for_context("perturb");

        let seq1: Vec<_> = (0..10).map(|_| ctx1.gen_range_u32(0..1000)).collect();
        let seq2: Vec<_> = (0..10).map(|_| ctx2.gen_range_u32(0..1000)).collect();

        assert_ne!(seq1, seq2);
    }

    #[test]
    fn test_context_is_deterministic() {
        let mut ctx1 = SimRng::new(42).for_context("split");
        let mut ctx2 = SimRng::new(42).for_context("split");

        for _ in 0..10 {
            assert_eq!(ctx1.gen_f32(), ctx2.gen_f32());
        }
    }

    #[test]
    fn test_context_seed_is_pinned() {
        // FNV-1a of 42u64 (little endian) followed by "weights".
        let mut ctx = SimRng::new(42).for_context("weights");
        let mut pinned = SimRng::new(0x9aa7_83d4_6a8f_9308);
        for _ in 0..10 {
            assert_eq!(ctx.gen_range_u32(0..1000), pinned.gen_range_u32(0..1000));
        }
    }

    #[test]
    fn test_ranges() {
        let mut rng = SimRng::new(7);
        for _ in 0..1000 {
            let f = rng.gen_range_f32(-0.5..0.5);
            assert!((-0.5..0.5).contains(&f));
            let u = rng.gen_f32();
            assert!((0.0..1.0).contains(&u));
        }
        assert_eq!(rng.gen_range_u32(5..5), 5);
    }

    #[test]
    fn test_choose() {
        let mut rng = SimRng::new(42);
        let items = vec![1, 2, 3, 4, 5];

        let chosen = rng.choose(&items);
        assert!(chosen.is_some());
        assert!(items.contains(chosen.unwrap()));

        let empty: Vec<i32> = vec![];
        assert!(rng.choose(&empty).is_none());
    }
}
