use std::collections::VecDeque;

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Source of uniform draws in `[0, 1)` behind every probabilistic choice of the simulator.
pub trait RandomSource: Send {
    fn next_f64(&mut self) -> f64;

    /// Uniform index into a collection of `len` items. `len` must be non-zero.
    fn choose_index(&mut self, len: usize) -> usize {
        let index = (self.next_f64() * len as f64) as usize;
        index.min(len.saturating_sub(1))
    }
}

#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of draws, then keeps returning `fallback`.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    draws: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedRandom {
    pub fn new<I>(draws: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        Self {
            draws: draws.into_iter().collect(),
            fallback: 0.5,
        }
    }

    pub fn constant(value: f64) -> Self {
        Self::new([]).with_fallback(value)
    }

    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&mut self) -> f64 {
        self.draws.pop_front().unwrap_or(self.fallback)
    }
}
