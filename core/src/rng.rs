use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Seeded game RNG. Every random draw in a game flows through one instance, so
/// a seed fully determines spells and damage rolls.
pub struct GameRng {
    inner: Pcg32,
}

impl GameRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Pcg32::seed_from_u64(seed ^ 0x9E37_79B9_7F4A_7C15),
        }
    }

    /// Uniform pick, `None` for an empty slice.
    pub fn pick<T: Copy>(&mut self, items: &[T]) -> Option<T> {
        if items.is_empty() {
            return None;
        }
        Some(items[self.inner.gen_range(0..items.len())])
    }

    /// Integer damage in `[low, high)`.
    pub fn roll_damage(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            return low;
        }
        self.inner.gen_range(low..high)
    }
}
