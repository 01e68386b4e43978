//! Soft-clip saturator
//!
//! Rational approximation of tanh: transparent for small signals, smoothly
//! compressing toward ±1 and hard-limited beyond ±3 so runaway feedback can
//! never leave the nominal range.

use super::Saturator;

/// Input magnitude above which the output is pinned to ±1
const CLIP_KNEE: f32 = 3.0;

/// Soft clip a single sample
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    if x < -CLIP_KNEE {
        -1.0
    } else if x > CLIP_KNEE {
        1.0
    } else {
        x * (27.0 + x * x) / (27.0 + 9.0 * x * x)
    }
}

/// Stateless [`Saturator`] wrapping [`soft_clip`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftClipper;

impl Saturator for SoftClipper {
    #[inline]
    fn process(&self, sample: f32) -> f32 {
        soft_clip(sample)
    }
}
