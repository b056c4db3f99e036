//! Random source used by the exploration and uniform-fallback branches.
//!
//! The pipeline never touches a process-global generator: the router owns a
//! [`RandomSource`] and passes it in, so tests can seed it or script it.

use rand::Rng;

pub trait RandomSource {
    /// A uniform draw in `[0.0, 1.0)`.
    fn next_unit(&mut self) -> f64;

    /// A uniform index in `0..len`. `len` is never zero.
    fn pick_index(&mut self, len: usize) -> usize;
}

impl<R: Rng> RandomSource for R {
    fn next_unit(&mut self) -> f64 {
        self.random::<f64>()
    }

    fn pick_index(&mut self, len: usize) -> usize {
        self.random_range(0..len)
    }
}
