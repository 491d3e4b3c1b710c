//! Crash-point distribution.
//!
//! Three bands over a uniform draw `u`:
//!
//! | band            | mass | crash point                |
//! |-----------------|------|----------------------------|
//! | `u < 0.20`      | 20%  | 1.00 (instant crash)       |
//! | `u < 0.70`      | 50%  | `round(1 + u2, 2)`         |
//! | otherwise       | 30%  | `round(2 + u3 * 4.5, 2)`   |
//!
//! `u2` / `u3` are fresh draws from the same source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::collections::VecDeque;

use crate::types::round2;

const INSTANT_CRASH_BAND: f64 = 0.20;
const LOW_BAND: f64 = 0.70;

// ---------------------------------------------------------------------------
// Uniform sources
// ---------------------------------------------------------------------------

/// Source of uniform draws in `[0, 1)`.
pub trait UnitSource: Send {
    fn next_unit(&mut self) -> f64;
}

/// Uniform draws from a `rand` generator.
pub struct RngSource<R>(R);

impl RngSource<StdRng> {
    /// OS-seeded generator for production use.
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    /// Reproducible sequence, for simulations.
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send> UnitSource for RngSource<R> {
    fn next_unit(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

/// Replays a fixed list of draws, then yields `fallback` forever.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    draws: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedSource {
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            fallback: 0.0,
        }
    }

    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    /// Queue more draws behind the remaining ones.
    pub fn extend(&mut self, draws: impl IntoIterator<Item = f64>) {
        self.draws.extend(draws);
    }
}

impl UnitSource for ScriptedSource {
    fn next_unit(&mut self) -> f64 {
        self.draws.pop_front().unwrap_or(self.fallback)
    }
}

// ---------------------------------------------------------------------------
// Sampler
// ---------------------------------------------------------------------------

/// Draws crash points from a [`UnitSource`].
pub struct CrashPointSampler {
    source: Box<dyn UnitSource>,
}

impl CrashPointSampler {
    pub fn new(source: impl UnitSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    pub fn from_entropy() -> Self {
        Self::new(RngSource::from_entropy())
    }

    /// Draw the next crash point. Consumes one or two units.
    pub fn draw(&mut self) -> Decimal {
        let u = self.source.next_unit();
        if u < INSTANT_CRASH_BAND {
            Decimal::ONE
        } else if u < LOW_BAND {
            round2(Decimal::ONE + unit(self.source.next_unit()))
        } else {
            round2(dec!(2) + unit(self.source.next_unit()) * dec!(4.5))
        }
    }
}

impl std::fmt::Debug for CrashPointSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrashPointSampler").finish_non_exhaustive()
    }
}

/// Convert a draw to a decimal in `[0, 1]`. Out-of-range or NaN draws clamp.
fn unit(u: f64) -> Decimal {
    let u = if u.is_nan() { 0.0 } else { u.clamp(0.0, 1.0) };
    Decimal::from_f64(u).unwrap_or(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
