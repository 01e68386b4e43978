//! Equal-power crossfader for the dry/wet output stage

use super::Crossfader;
use std::f32::consts::FRAC_PI_2;

/// Constant-power crossfade: `a * cos(p·π/2) + b * sin(p·π/2)`
#[derive(Debug, Clone)]
pub struct EqualPowerCrossfade {
    position: f32,
    gain_a: f32,
    gain_b: f32,
}

impl EqualPowerCrossfade {
    pub fn new() -> Self {
        let mut cf = Self {
            position: 0.0,
            gain_a: 1.0,
            gain_b: 0.0,
        };
        cf.set_position(0.5);
        cf
    }

    pub fn position(&self) -> f32 {
        self.position
    }
}

impl Default for EqualPowerCrossfade {
    fn default() -> Self {
        Self::new()
    }
}

impl Crossfader for EqualPowerCrossfade {
    fn set_position(&mut self, position: f32) -> f32 {
        let position = position.clamp(0.0, 1.0);
        if position != self.position {
            self.position = position;
            self.gain_a = (position * FRAC_PI_2).cos();
            self.gain_b = (position * FRAC_PI_2).sin();
        }
        self.position
    }

    #[inline]
    fn process(&self, a: f32, b: f32) -> f32 {
        a * self.gain_a + b * self.gain_b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_endpoints_select_single_input() {
        let mut cf = EqualPowerCrossfade::new();

        cf.set_position(0.0);
        assert_relative_eq!(cf.process(0.8, -0.3), 0.8, epsilon = 1e-6);

        cf.set_position(1.0);
        assert_relative_eq!(cf.process(0.8, -0.3), -0.3, epsilon = 1e-6);
    }

    #[test]
    fn test_center_is_constant_power() {
        let mut cf = EqualPowerCrossfade::new();
        cf.set_position(0.5);

        let ga = cf.process(1.0, 0.0);
        let gb = cf.process(0.0, 1.0);
        assert_relative_eq!(ga * ga + gb * gb, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_position_is_clamped() {
        let mut cf = EqualPowerCrossfade::new();
        assert_eq!(cf.set_position(-2.0), 0.0);
        assert_eq!(cf.set_position(3.0), 1.0);
    }
}
