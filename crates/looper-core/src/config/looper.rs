//! Engine startup configuration

use serde::{Deserialize, Serialize};

use crate::dsp::FilterMode;
use crate::engine::{Direction, Movement, TriggerMode};
use crate::error::{LooperError, LooperResult};
use crate::types::SAMPLE_RATE;

/// Filter path settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Cutoff in Hz. Below 20Hz the filter path is off.
    /// Default: 0.0 (off)
    pub cutoff: f32,

    /// Base resonance (0.0 - 1.0); rises with the cutoff.
    /// Default: 0.45
    pub resonance: f32,

    /// Default: band pass
    pub mode: FilterMode,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            cutoff: 0.0,
            resonance: 0.45,
            mode: FilterMode::BandPass,
        }
    }
}

/// Looper configuration
///
/// Everything here is the state the engine starts from; all of it except
/// the sample rate can be changed later through the command queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LooperConfig {
    /// Default: 48000
    pub sample_rate: u32,

    /// Warm-up before capture starts, in seconds.
    /// Audio passes through dry meanwhile.
    /// Default: 1.0
    pub startup_seconds: f32,

    /// Fade length in samples for starts, stops and jumps.
    /// Default: 1200 (25ms at 48kHz)
    pub fade_samples: i32,

    /// One-pole coefficient for loop start/length glides.
    /// 1.0 = instant.
    /// Default: 0.0005
    pub position_slew: f32,

    /// One-pole coefficient for read-rate glides.
    /// Default: 0.001
    pub rate_slew: f32,

    /// Go straight from ready to recording once the capture is done.
    /// When disabled, a `Start` command is needed.
    /// Default: true
    pub auto_start: bool,

    pub trigger_mode: TriggerMode,
    pub movement: Movement,
    pub direction: Direction,

    /// Read rate latched when the capture completes.
    /// Default: 1.0
    pub read_rate: f32,

    /// Input gain. Default: 1.0
    pub gain: f32,
    /// Dry/wet balance. Default: 0.5
    pub mix: f32,
    /// Default: 0.0
    pub feedback: f32,
    /// 1.0 = stereo, 0.0 = mono. Default: 1.0
    pub stereo_image: f32,

    pub filter: FilterConfig,

    /// Seed for the drunk walk, per channel it is offset by the channel index
    pub drunk_seed: u64,
}

impl Default for LooperConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            startup_seconds: 1.0,
            fade_samples: 1200,
            position_slew: 0.0005,
            rate_slew: 0.001,
            auto_start: true,
            trigger_mode: TriggerMode::Loop,
            movement: Movement::Normal,
            direction: Direction::Forward,
            read_rate: 1.0,
            gain: 1.0,
            mix: 0.5,
            feedback: 0.0,
            stereo_image: 1.0,
            filter: FilterConfig::default(),
            drunk_seed: 0x5EED,
        }
    }
}

impl LooperConfig {
    /// Warm-up length in samples
    pub fn startup_samples(&self) -> u64 {
        (self.startup_seconds.max(0.0) as f64 * self.sample_rate as f64).round() as u64
    }

    pub fn validate(&self) -> LooperResult<()> {
        if self.sample_rate == 0 {
            return Err(LooperError::InvalidSampleRate(self.sample_rate));
        }
        Ok(())
    }
}
