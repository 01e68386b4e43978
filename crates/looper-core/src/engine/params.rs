//! Parameter smoothing
//!
//! Control values arrive as targets; the audio thread glides toward them one
//! frame at a time so jumps in loop start, length or speed never click.

/// Values closer than this to the target snap onto it (loop positions)
pub const POSITION_SNAP: f64 = 0.5;

/// Values closer than this to the target snap onto it (speed)
pub const RATE_SNAP: f64 = 1e-4;

/// One-pole lowpass gliding toward a target
#[derive(Debug, Clone, Copy)]
pub struct OnePole {
    value: f64,
    target: f64,
    coeff: f64,
    snap: f64,
}

impl OnePole {
    pub fn new(value: f64, coeff: f64, snap: f64) -> Self {
        Self {
            value,
            target: value,
            coeff: coeff.clamp(0.0, 1.0),
            snap,
        }
    }

    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// Jump straight to `value`, discarding any glide in progress
    pub fn set_immediate(&mut self, value: f64) {
        self.value = value;
        self.target = value;
    }

    /// Advance one frame and return the smoothed value
    #[inline]
    pub fn tick(&mut self) -> f64 {
        let diff = self.target - self.value;
        if diff.abs() < self.snap {
            self.value = self.target;
        } else {
            self.value += self.coeff * diff;
        }
        self.value
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[inline]
    pub fn target(&self) -> f64 {
        self.target
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.value == self.target
    }
}

/// Smoothed per-channel targets
///
/// Position and length share one coefficient, speed has its own so the loop
/// can settle at a different pace than playback speed.
#[derive(Debug, Clone, Copy)]
pub struct ChannelTargets {
    pub loop_start: OnePole,
    pub loop_length: OnePole,
    pub read_rate: OnePole,
}

impl ChannelTargets {
    pub fn new(position_coeff: f64, rate_coeff: f64) -> Self {
        Self {
            loop_start: OnePole::new(0.0, position_coeff, POSITION_SNAP),
            loop_length: OnePole::new(0.0, position_coeff, POSITION_SNAP),
            read_rate: OnePole::new(1.0, rate_coeff, RATE_SNAP),
        }
    }

    /// Snap every target onto the given values
    pub fn latch(&mut self, loop_start: i32, loop_length: i32, read_rate: f64) {
        self.loop_start.set_immediate(loop_start as f64);
        self.loop_length.set_immediate(loop_length as f64);
        self.read_rate.set_immediate(read_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_one_pole_converges_and_snaps() {
        let mut p = OnePole::new(0.0, 0.1, POSITION_SNAP);
        p.set_target(1000.0);

        let first = p.tick();
        assert_relative_eq!(first, 100.0);

        let mut frames = 1;
        while !p.is_settled() {
            p.tick();
            frames += 1;
            assert!(frames < 1000);
        }
        assert_eq!(p.value(), 1000.0);
    }

    #[test]
    fn test_unit_coeff_is_instant() {
        let mut p = OnePole::new(1.0, 1.0, RATE_SNAP);
        p.set_target(2.5);
        assert_eq!(p.tick(), 2.5);
    }

    #[test]
    fn test_latch_overrides_glide() {
        let mut t = ChannelTargets::new(0.001, 0.001);
        t.loop_start.set_target(5000.0);
        t.tick_all();
        t.latch(100, 2000, 1.0);
        assert_eq!(t.loop_start.value(), 100.0);
        assert_eq!(t.loop_length.target(), 2000.0);
        assert!(t.read_rate.is_settled());
    }

    #[test]
    fn test_rate_settles_slower_with_smaller_coeff() {
        let mut t = ChannelTargets::new(0.5, 0.01);
        t.loop_start.set_target(100.0);
        t.read_rate.set_target(2.0);
        for _ in 0..20 {
            t.tick_all();
        }
        assert!(t.loop_start.is_settled());
        assert!(!t.read_rate.is_settled());
    }

    impl ChannelTargets {
        fn tick_all(&mut self) {
            self.loop_start.tick();
            self.loop_length.tick();
            self.read_rate.tick();
        }
    }
}
