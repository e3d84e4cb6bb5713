// Simulated probe for hardware-free runs
//
// Produces readings around a configurable centre with bounded uniform
// noise. Used for demos and tests when no probe is attached; the seeded
// constructor makes runs reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::SensorError;
use crate::sensor::RawPhSource;

/// Simulated probe producing centre plus-or-minus uniform noise
pub struct SimulatedPhSensor {
    centre: f64,
    noise: f64,
    rng: StdRng,
}

impl SimulatedPhSensor {
    /// Create a simulated probe
    ///
    /// # Arguments
    /// * `centre` - Value the readings settle around
    /// * `noise` - Half-width of the uniform noise band (0.0 for exact readings)
    pub fn new(centre: f64, noise: f64) -> Self {
        Self::with_seed(centre, noise, rand::random())
    }

    /// Create a simulated probe with a fixed RNG seed
    pub fn with_seed(centre: f64, noise: f64, seed: u64) -> Self {
        Self {
            centre,
            noise: noise.abs(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Move the simulated probe to a new centre (e.g. a different buffer)
    pub fn set_centre(&mut self, centre: f64) {
        self.centre = centre;
    }
}

impl RawPhSource for SimulatedPhSensor {
    fn next_raw_reading(&mut self) -> Result<f64, SensorError> {
        if self.noise == 0.0 {
            return Ok(self.centre);
        }
        Ok(self.centre + self.rng.gen_range(-self.noise..=self.noise))
    }
}
