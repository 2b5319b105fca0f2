use rand::Rng;

/// A uniform integer generator, used both for initial element values and for per-iteration index
/// selection. Every worker owns its own instance.
pub trait UniformSource {
    /// Draw a value uniformly from `low..=high`.
    fn uniform(&mut self, low: u64, high: u64) -> u64;
}

/// Adapts any [rand::Rng] into a [UniformSource].
#[derive(Debug)]
pub struct RngSource<R: Rng>(pub R);

impl<R: Rng> UniformSource for RngSource<R> {
    fn uniform(&mut self, low: u64, high: u64) -> u64 {
        self.0.gen_range(low..=high)
    }
}

/// Derive an independent per-worker seed from a run seed.
///
/// SplitMix64-style mixing, so neighbouring worker ids get unrelated streams.
pub fn derive_worker_seed(seed: u64, worker: usize) -> u64 {
    let mut x: u64 = seed ^ ((worker as u64) << 1);
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

#[cfg(all(test, not(loom), not(feature = "shuttle")))]
mod tests {
    use super::{derive_worker_seed, RngSource, UniformSource};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_log::test;

    #[test]
    fn test_uniform_stays_within_inclusive_bounds() {
        let mut source: RngSource<StdRng> = RngSource(StdRng::seed_from_u64(1));
        for _ in 0..1000 {
            let value: u64 = source.uniform(3, 5);
            assert!((3..=5).contains(&value));
        }
        assert_eq!(source.uniform(4, 4), 4);
    }

    #[test]
    fn test_worker_seeds_differ() {
        assert_ne!(derive_worker_seed(42, 0), derive_worker_seed(42, 1));
        assert_eq!(derive_worker_seed(42, 3), derive_worker_seed(42, 3));
    }
}
