//! DSP collaborators used by the stereo looper
//!
//! The looper core only depends on the traits defined here:
//! - [`Saturator`]: stateless soft clip on the input and on every mix point
//! - [`ResonantFilter`]: filter in the feedback and frozen-output paths
//! - [`Crossfader`]: equal-power dry/wet blend at the output
//!
//! Default implementations are provided so the engine works out of the box.

mod crossfade;
mod saturator;
mod svf;

pub use crossfade::EqualPowerCrossfade;
pub use saturator::{soft_clip, SoftClipper};
pub use svf::Svf;

use serde::{Deserialize, Serialize};

/// Which filter response feeds the signal path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    LowPass,
    #[default]
    BandPass,
    HighPass,
}

/// Stateless soft clipper
pub trait Saturator {
    fn process(&self, sample: f32) -> f32;
}

/// Resonant multi-mode filter
///
/// `process` runs one sample through the filter; the three responses are
/// then read back through [`ResonantFilter::output`].
pub trait ResonantFilter {
    fn init(&mut self, sample_rate: f32);
    fn set_frequency(&mut self, hz: f32);
    fn set_drive(&mut self, drive: f32);
    fn set_resonance(&mut self, resonance: f32);
    fn process(&mut self, input: f32);
    fn low(&self) -> f32;
    fn band(&self) -> f32;
    fn high(&self) -> f32;
    fn reset(&mut self);

    /// Response selected by `mode` for the last processed sample
    #[inline]
    fn output(&self, mode: FilterMode) -> f32 {
        match mode {
            FilterMode::LowPass => self.low(),
            FilterMode::BandPass => self.band(),
            FilterMode::HighPass => self.high(),
        }
    }
}

/// Two-input crossfader
pub trait Crossfader {
    /// Set the blend position (0.0 = first input, 1.0 = second input).
    /// Returns the position actually applied.
    fn set_position(&mut self, position: f32) -> f32;
    fn process(&self, a: f32, b: f32) -> f32;
}
