//! # Driving Profile Generator
//!
//! Produces the next wheel speed and ambient temperature for a battery entity
//! as a bounded random walk. Each tick the speed moves up or down by a
//! uniform delta in [0, 3) m/s (clamped to [0, max]) and the ambient
//! temperature drifts by a uniform delta in [0, 0.5) °C with no clamping.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MAX_SPEED_DELTA_MPS: f64 = 3.0;
const MAX_AMBIENT_DELTA_C: f64 = 0.5;

/// Per-entity random walk over speed and ambient temperature.
///
/// Each battery task owns its own generator; a seed makes a run
/// reproducible.
pub struct DrivingProfileGenerator {
    rng: StdRng,
}

impl DrivingProfileGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Advance the walk one step.
    ///
    /// Returns `(speed_mps, ambient_c)`; the caller commits both to entity
    /// state. Speed is clamped to `[0, max_speed_mps]`, ambient drift is
    /// unbounded.
    pub fn advance(
        &mut self,
        prev_speed_mps: f64,
        prev_ambient_c: f64,
        max_speed_mps: f64,
    ) -> (f64, f64) {
        let speed_delta = self.rng.gen_range(0.0..MAX_SPEED_DELTA_MPS);
        let speed = if self.rng.gen_bool(0.5) {
            prev_speed_mps + speed_delta
        } else {
            prev_speed_mps - speed_delta
        };
        let speed = speed.clamp(0.0, max_speed_mps);

        let ambient_delta = self.rng.gen_range(0.0..MAX_AMBIENT_DELTA_C);
        let ambient = if self.rng.gen_bool(0.5) {
            prev_ambient_c + ambient_delta
        } else {
            prev_ambient_c - ambient_delta
        };

        (speed, ambient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_generator_is_reproducible() {
        let mut a = DrivingProfileGenerator::new(Some(42));
        let mut b = DrivingProfileGenerator::new(Some(42));

        for _ in 0..100 {
            assert_eq!(a.advance(10.0, 18.3, 69.0), b.advance(10.0, 18.3, 69.0));
        }
    }

    #[test]
    fn test_speed_stays_within_bounds() {
        let mut gen = DrivingProfileGenerator::new(Some(7));
        let max_speed = 20.0;
        let mut speed = max_speed * 0.5;
        let mut ambient = 18.3;

        for _ in 0..10_000 {
            let (new_speed, new_ambient) = gen.advance(speed, ambient, max_speed);
            assert!((0.0..=max_speed).contains(&new_speed));
            speed = new_speed;
            ambient = new_ambient;
        }
    }

    #[test]
    fn test_step_deltas_are_bounded() {
        let mut gen = DrivingProfileGenerator::new(Some(99));
        let mut speed = 30.0;
        let mut ambient = 18.3;

        for _ in 0..10_000 {
            let (new_speed, new_ambient) = gen.advance(speed, ambient, 69.0);
            // Clamping can only shrink a move, never grow it.
            assert!((new_speed - speed).abs() < MAX_SPEED_DELTA_MPS);
            assert!((new_ambient - ambient).abs() < MAX_AMBIENT_DELTA_C);
            speed = new_speed;
            ambient = new_ambient;
        }
    }

    #[test]
    fn test_ambient_walk_moves_both_directions() {
        let mut gen = DrivingProfileGenerator::new(Some(3));
        let mut ambient = 18.3;
        let (mut rose, mut fell) = (false, false);

        for _ in 0..1_000 {
            let (_, new_ambient) = gen.advance(10.0, ambient, 69.0);
            if new_ambient > ambient {
                rose = true;
            }
            if new_ambient < ambient {
                fell = true;
            }
            ambient = new_ambient;
        }

        assert!(rose && fell);
    }
}
