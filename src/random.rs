use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};

const DEFAULT_SEED: u64 = 3819201;

/// Source of randomness for expansion order and playout move choice.
///
/// Swapping the generator is how the search is made reproducible in tests.
pub trait RandomGenerator {
    /// Returns a uniformly distributed number in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Returns a uniformly distributed index in `0..len`. `len` must be non-zero.
    fn next_index(&mut self, len: usize) -> usize;

    fn get_random_from_slice<'a, K>(&mut self, items: &'a [K]) -> Option<&'a K> {
        if items.is_empty() {
            return None;
        }
        items.get(self.next_index(items.len()))
    }
}

impl<K: RandomGenerator + ?Sized> RandomGenerator for &mut K {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }

    fn next_index(&mut self, len: usize) -> usize {
        (**self).next_index(len)
    }
}

/// Draws from the thread-local generator.
pub struct StandardRandomGenerator {
    rng: ThreadRng,
}

impl Default for StandardRandomGenerator {
    fn default() -> Self {
        Self { rng: rand::rng() }
    }
}

impl RandomGenerator for StandardRandomGenerator {
    fn next_f64(&mut self) -> f64 {
        self.rng.random()
    }

    fn next_index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}

/// A generator that replays the same sequence for the same seed.
pub struct SeededRandomGenerator {
    rng: StdRng,
}

impl Default for SeededRandomGenerator {
    fn default() -> Self {
        SeededRandomGenerator::new(DEFAULT_SEED)
    }
}

impl RandomGenerator for SeededRandomGenerator {
    fn next_f64(&mut self) -> f64 {
        self.rng.random()
    }

    fn next_index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}

impl SeededRandomGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}
