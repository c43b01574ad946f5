//! Deterministic random source consumed by arbitraries.

use num_bigint::{BigInt, RandBigInt};
use num_traits::One;
use rand::{Rng, RngCore};
use std::fmt;

/// A random engine that can be duplicated behind a trait object.
///
/// Any `RngCore + Clone` type qualifies, so callers can inject the engine of
/// their choice.
pub trait Engine: RngCore {
    fn clone_engine(&self) -> Box<dyn Engine>;
}

impl<R> Engine for R
where
    R: RngCore + Clone + 'static,
{
    fn clone_engine(&self) -> Box<dyn Engine> {
        Box::new(self.clone())
    }
}

/// Uniform integer source handed to every `generate` call.
///
/// Cloning yields an independent source whose future output is identical to
/// the original's at the time of the clone.
pub struct Random {
    engine: Box<dyn Engine>,
}

impl Random {
    /// Wrap an arbitrary engine.
    pub fn new<R>(engine: R) -> Self
    where
        R: RngCore + Clone + 'static,
    {
        Random {
            engine: Box::new(engine),
        }
    }

    /// Create a source using the default SplitMix64 engine.
    pub fn from_seed(seed: u64) -> Self {
        Random::new(SplitMix64::from_u64(seed))
    }

    /// Pick a fresh seed from the thread-local generator.
    pub fn random_seed() -> u64 {
        rand::thread_rng().gen()
    }

    /// Uniform integer in `[min, max]`.
    pub fn next_int(&mut self, min: i64, max: i64) -> i64 {
        debug_assert!(min <= max);
        self.engine.gen_range(min..=max)
    }

    /// Uniform arbitrary-precision integer in `[min, max]`.
    pub fn next_bigint(&mut self, min: &BigInt, max: &BigInt) -> BigInt {
        debug_assert!(min <= max);
        let upper = max + BigInt::one();
        self.engine.gen_bigint_range(min, &upper)
    }
}

impl Clone for Random {
    fn clone(&self) -> Self {
        Random {
            engine: self.engine.clone_engine(),
        }
    }
}

impl fmt::Debug for Random {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Random").finish_non_exhaustive()
    }
}

/// SplitMix64 engine, the default source behind [`Random::from_seed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitMix64 {
    state: u64,
    gamma: u64,
}

impl SplitMix64 {
    /// Create an engine from a single seed value.
    pub fn from_u64(value: u64) -> Self {
        let state = splitmix64_mix(value);
        let gamma = mix_gamma(state);
        SplitMix64 { state, gamma }
    }

    /// Split into two engines with independent streams.
    pub fn split(self) -> (Self, Self) {
        let new_state = self.state.wrapping_add(self.gamma);
        let output = splitmix64_mix(new_state);
        (
            SplitMix64 {
                state: new_state,
                gamma: self.gamma,
            },
            SplitMix64 {
                state: output,
                gamma: mix_gamma(output),
            },
        )
    }
}

impl RngCore for SplitMix64 {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(self.gamma);
        splitmix64_mix(self.state)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// SplitMix64 mixing function.
fn splitmix64_mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e3779b97f4a7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

fn mix_gamma(z: u64) -> u64 {
    let z = splitmix64_mix(z);
    // Gamma must be odd for a full period.
    (z | 1).wrapping_mul(0x9e3779b97f4a7c15)
}
