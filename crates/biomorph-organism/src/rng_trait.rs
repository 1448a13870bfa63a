//! RNG trait abstraction for organism simulation
//!
//! Every random decision an organism makes (gene generation, mutation,
//! self-propulsion coin flips) goes through this trait so the world can
//! thread one seeded generator through a whole run.

/// Random number generator trait for organism simulation
pub trait SimRng {
    /// Generate random boolean with 50% probability
    fn coin_flip(&mut self) -> bool;

    /// Generate random f64 in [0.0, 1.0)
    fn unit_f64(&mut self) -> f64;

    /// Generate random index in [0, n); returns 0 when n is 0
    fn below(&mut self, n: usize) -> usize;

    /// Check if random value is less than probability threshold
    fn check_probability(&mut self, probability: f64) -> bool {
        self.unit_f64() < probability
    }

    /// Generate random f64 in [low, high)
    fn range_f64(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.unit_f64()
    }
}

// Blanket implementation for any type implementing rand::Rng
// This covers both seeded generators (tests, headless runs) and rand::rng()
impl<T: rand::Rng> SimRng for T {
    fn coin_flip(&mut self) -> bool {
        rand::Rng::random(self)
    }

    fn unit_f64(&mut self) -> f64 {
        rand::Rng::random(self)
    }

    fn below(&mut self, n: usize) -> usize {
        if n == 0 {
            0
        } else {
            rand::Rng::random_range(self, 0..n)
        }
    }
}
