//! Synthetic meter generation
//!
//! Produces S-meter, power, and SWR readings that move the way a real
//! radio's needles do: exponential smoothing toward a target that depends
//! on the control settings and transmit state.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Control settings the simulator reacts to
#[derive(Debug, Clone, Copy)]
pub struct SimInputs {
    /// RF gain 0-100; attenuates the received signal
    pub rf_gain: u8,
    /// Power level 0-100; scales transmit power output
    pub power_level: u8,
    pub transmitting: bool,
}

/// One tick's worth of meter values, 0-255 each
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeterReadings {
    pub signal: u8,
    pub power_out: u8,
    pub swr: u8,
}

/// Smoothed synthetic meter state
///
/// Internal levels are kept as floats so the smoothing does not quantize;
/// readings are clamped to 0-255 on the way out.
#[derive(Debug)]
pub struct MeterSimulator {
    signal: f64,
    power: f64,
    swr: f64,
    rng: StdRng,
}

impl MeterSimulator {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic simulator for tests
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            signal: 0.0,
            power: 0.0,
            swr: 0.0,
            rng,
        }
    }

    /// Advance one tick
    ///
    /// `elapsed_secs` is time since simulator start; it drives the slow
    /// fading pattern on the received signal.
    pub fn advance(&mut self, elapsed_secs: f64, inputs: &SimInputs) -> MeterReadings {
        // Received signal fades with time, attenuated by RF gain
        let base_signal = (elapsed_secs * 5.0).sin().abs() * 200.0;
        let target_signal = base_signal * (inputs.rf_gain as f64 / 100.0);

        if inputs.transmitting {
            let mut target_power = (inputs.power_level as f64 / 100.0) * 250.0;
            target_power += self.rng.gen_range(-5i32..=5) as f64;
            target_power = target_power.clamp(0.0, 255.0);
            self.power += (target_power - self.power) * 0.3;

            // SWR sits low into a matched antenna, with the occasional spike
            let target_swr = if self.rng.gen_bool(0.05) {
                self.rng.gen_range(80i32..=150) as f64
            } else {
                self.rng.gen_range(20i32..=50) as f64
            };
            self.swr += (target_swr - self.swr) * 0.3;
        } else {
            self.power *= 0.7;
            self.swr *= 0.7;
        }

        self.signal += (target_signal - self.signal) * 0.2;

        MeterReadings {
            signal: clamp_reading(self.signal),
            power_out: clamp_reading(self.power),
            swr: clamp_reading(self.swr),
        }
    }
}

impl Default for MeterSimulator {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_reading(level: f64) -> u8 {
    level.clamp(0.0, 255.0) as u8
}
