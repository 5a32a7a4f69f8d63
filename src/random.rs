//! Random variates used by the simulation.
//!
//! Every function takes the generator explicitly so that a whole run can be driven by the single
//! seeded [`SimRng`] owned by the engine. Nothing here keeps state of its own.

use log::trace;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use statrs::distribution::{ContinuousCDF, Normal as NormalCurve};

use crate::error::AirborneError;

/// The generator type threaded through a simulation.
pub type SimRng = SmallRng;

/// Creates the generator for a run from its seed.
#[must_use]
pub fn seeded_rng(seed: u64) -> SimRng {
    trace!("creating new RNG (seed={seed})");
    SimRng::seed_from_u64(seed)
}

/// Draws from `Normal(mean, sd)`. A spread of zero (or an invalid one) yields `mean` without
/// consuming any randomness.
pub fn sample_normal<R: Rng>(rng: &mut R, mean: f64, sd: f64) -> f64 {
    match Normal::new(mean, sd) {
        Ok(normal) if sd > 0.0 => normal.sample(rng),
        _ => mean,
    }
}

/// Draws from `Normal(mean, sd)`, rounds half to even, and clamps the result at `floor`.
pub fn sample_rounded_normal<R: Rng>(rng: &mut R, mean: f64, sd: f64, floor: u32) -> u32 {
    let value = sample_normal(rng, mean, sd).round_ties_even();
    if value <= f64::from(floor) {
        floor
    } else if value >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        // In range and integral after the checks above.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = value as u32;
        value
    }
}

/// A single Bernoulli trial with success probability `p`. Probabilities are clamped to `[0, 1]`.
pub fn bernoulli<R: Rng>(rng: &mut R, p: f64) -> bool {
    if p.is_nan() || p <= 0.0 {
        return false;
    }
    rng.random_bool(p.min(1.0))
}

/// The day-by-day hazard of dying derived from a continuous time-to-death distribution.
///
/// The probability of dying on day `d` of an infection is the mass of
/// `Normal(death_mean, death_sd)` falling in `(d - 1, d]`, scaled by the overall case mortality.
#[derive(Debug, Clone)]
pub struct DeathCurve {
    mortality_rate: f64,
    curve: NormalCurve,
}

impl DeathCurve {
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if `death_sd` is not strictly positive or either moment is
    /// not finite.
    pub fn new(mortality_rate: f64, death_mean: f64, death_sd: f64) -> Result<Self, AirborneError> {
        let curve = NormalCurve::new(death_mean, death_sd).map_err(|e| {
            AirborneError::configuration(format!(
                "invalid days-to-die distribution ({death_mean}, {death_sd}): {e}"
            ))
        })?;
        Ok(DeathCurve {
            mortality_rate,
            curve,
        })
    }

    /// Probability of dying on the given day of infection.
    #[must_use]
    pub fn daily_probability(&self, days_infected: u32) -> f64 {
        if self.mortality_rate <= 0.0 {
            return 0.0;
        }
        let day = f64::from(days_infected);
        let mass = self.curve.cdf(day) - self.curve.cdf(day - 1.0);
        (self.mortality_rate * mass).clamp(0.0, 1.0)
    }
}
