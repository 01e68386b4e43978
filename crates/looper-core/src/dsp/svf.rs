//! Two-pole (12dB/octave) state-variable filter

use super::ResonantFilter;
use crate::types::SAMPLE_RATE;

/// Lowest cutoff the filter accepts
pub const MIN_CUTOFF_HZ: f32 = 20.0;

/// Trapezoidal-integrator SVF with simultaneous low/band/high outputs
///
/// Resonance is normalized (0.0 = gentle, 1.0 = near self-oscillation) and
/// mapped onto the damping term. Drive is a pre-gain into the filter.
#[derive(Debug, Clone)]
pub struct Svf {
    sample_rate: f32,
    cutoff: f32,
    resonance: f32,
    drive: f32,
    // State
    ic1eq: f32,
    ic2eq: f32,
    // Coefficients
    k: f32,
    a1: f32,
    a2: f32,
    a3: f32,
    // Last outputs
    low: f32,
    band: f32,
    high: f32,
}

impl Svf {
    pub fn new() -> Self {
        let mut f = Self {
            sample_rate: SAMPLE_RATE as f32,
            cutoff: 1000.0,
            resonance: 0.0,
            drive: 0.0,
            ic1eq: 0.0,
            ic2eq: 0.0,
            k: 2.0,
            a1: 0.0,
            a2: 0.0,
            a3: 0.0,
            low: 0.0,
            band: 0.0,
            high: 0.0,
        };
        f.update_coefficients();
        f
    }

    fn update_coefficients(&mut self) {
        // Keep the cutoff safely below Nyquist so tan() stays finite
        let max_cutoff = self.sample_rate * 0.45;
        let cutoff = self.cutoff.clamp(MIN_CUTOFF_HZ, max_cutoff.max(MIN_CUTOFF_HZ));
        let g = (std::f32::consts::PI * cutoff / self.sample_rate).tan();

        self.k = 2.0 * (1.0 - self.resonance).max(0.025);
        self.a1 = 1.0 / (1.0 + g * (g + self.k));
        self.a2 = g * self.a1;
        self.a3 = g * self.a2;
    }
}

impl Default for Svf {
    fn default() -> Self {
        Self::new()
    }
}

impl ResonantFilter for Svf {
    fn init(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
        self.reset();
        self.update_coefficients();
    }

    fn set_frequency(&mut self, hz: f32) {
        self.cutoff = hz;
        self.update_coefficients();
    }

    fn set_drive(&mut self, drive: f32) {
        self.drive = drive.clamp(0.0, 1.0);
    }

    fn set_resonance(&mut self, resonance: f32) {
        self.resonance = resonance.clamp(0.0, 1.0);
        self.update_coefficients();
    }

    #[inline]
    fn process(&mut self, input: f32) {
        let input = input * (1.0 + self.drive);

        let v3 = input - self.ic2eq;
        let v1 = self.a1 * self.ic1eq + self.a2 * v3;
        let v2 = self.ic2eq + self.a2 * self.ic1eq + self.a3 * v3;
        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        self.low = v2;
        self.band = v1;
        self.high = input - self.k * v1 - v2;
    }

    #[inline]
    fn low(&self) -> f32 {
        self.low
    }

    #[inline]
    fn band(&self) -> f32 {
        self.band
    }

    #[inline]
    fn high(&self) -> f32 {
        self.high
    }

    fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
        self.low = 0.0;
        self.band = 0.0;
        self.high = 0.0;
    }
}
