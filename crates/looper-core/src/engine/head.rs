//! Read/write head over a channel buffer
//!
//! A head tracks a fractional position inside a loop region and moves by
//! `rate` samples per frame in its current direction. It never owns the
//! buffer: the channel looper lends a slice for every read or write.
//!
//! Every change that would otherwise click goes through a short fade:
//! - `In`: start contributing, ramping up from silence (read) or from the
//!   buffered material (write)
//! - `Out`: ramp down, then disable the head (rewinding it unless paused)
//! - `Smooth`: switch-and-ramp from the last emitted value after a jump
//!
//! Fade progress advances by the head's rate, so a fade always covers the
//! same stretch of buffer regardless of playback speed.

use super::boundary::{
    resolve_boundary, wrap_index, Direction, LoopAction, LoopGeometry, Motion, Movement,
};

/// Default fade length in samples (25ms at 48kHz)
pub const DEFAULT_FADE_SAMPLES: i32 = 1200;

/// Smallest fade increment, so a stalled head still completes its fades
pub const MIN_FADE_STEP: f64 = 0.02;

/// Fractional parts below this are treated as exact sample positions
const INTERPOLATION_EPSILON: f64 = 1e-6;

/// What the head does with the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadRole {
    Read,
    Write,
}

/// Active fade kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FadeKind {
    #[default]
    None,
    In,
    Out,
    Smooth,
}

#[derive(Debug, Clone, Copy, Default)]
struct FadeState {
    kind: FadeKind,
    index: f64,
    snapshot: f32,
}

/// A single cursor over a channel buffer
#[derive(Debug, Clone)]
pub struct Head {
    role: HeadRole,
    capacity: i32,
    /// Samples appended so far while capturing
    captured: i32,
    geometry: LoopGeometry,

    pos: f64,
    int_pos: i32,
    rate: f64,
    direction: Direction,
    movement: Movement,

    running: bool,
    looping: bool,
    stopping: bool,
    /// Whether the fade-out in flight rewinds the head when it completes
    rewind_on_stop: bool,

    fade: FadeState,
    fade_samples: i32,
    /// Last value read or written, used as the fade snapshot
    last_value: f32,
}

impl Head {
    pub fn new(role: HeadRole) -> Self {
        Self {
            role,
            capacity: 1,
            captured: 0,
            geometry: LoopGeometry::spanning(1),
            pos: 0.0,
            int_pos: 0,
            rate: 1.0,
            direction: Direction::Forward,
            movement: Movement::Normal,
            running: true,
            looping: true,
            stopping: false,
            rewind_on_stop: true,
            fade: FadeState::default(),
            fade_samples: DEFAULT_FADE_SAMPLES,
            last_value: 0.0,
        }
    }

    /// Bind the head to a buffer of `capacity` samples and reset it
    pub fn init(&mut self, capacity: i32) {
        self.capacity = capacity.max(1);
        self.reset();
    }

    /// Return to the freshly initialized state
    ///
    /// The loop spans the whole capacity until a capture completes.
    pub fn reset(&mut self) {
        self.captured = 0;
        self.geometry = LoopGeometry::spanning(self.capacity);
        self.set_position_raw(0.0);
        self.rate = 1.0;
        self.direction = Direction::Forward;
        self.movement = Movement::Normal;
        self.running = true;
        self.looping = true;
        self.stopping = false;
        self.rewind_on_stop = true;
        self.fade = FadeState::default();
        self.last_value = 0.0;
    }

    // ─────────────────────────────────────────────────────────────
    // Geometry
    // ─────────────────────────────────────────────────────────────

    /// Set the loop start, returning the applied value
    ///
    /// A non-looping head is rewound to its new natural start.
    pub fn set_loop_start(&mut self, start: i32) -> i32 {
        let applied = self.geometry.set_start(start);
        if !self.looping {
            self.reset_position();
        }
        applied
    }

    /// Set the loop length, returning the applied value
    pub fn set_loop_length(&mut self, length: i32) -> i32 {
        self.geometry.set_length(length)
    }

    /// Samples a fade lasts; never longer than the loop itself
    #[inline]
    pub fn samples_to_fade(&self) -> i32 {
        self.fade_samples.min(self.geometry.length).max(1)
    }

    /// Configure the fade length, returning the applied value
    pub fn set_samples_to_fade(&mut self, samples: i32) -> i32 {
        self.fade_samples = samples.max(1);
        self.fade_samples
    }

    // ─────────────────────────────────────────────────────────────
    // Motion
    // ─────────────────────────────────────────────────────────────

    /// Set the speed multiplier, returning the applied value
    pub fn set_rate(&mut self, rate: f64) -> f64 {
        self.rate = rate.max(0.0);
        self.rate
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn toggle_direction(&mut self) -> Direction {
        self.direction = self.direction.flipped();
        self.direction
    }

    pub fn set_movement(&mut self, movement: Movement) {
        self.movement = movement;
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Jump to a position, clamped into the captured region
    pub fn set_position(&mut self, pos: f64) {
        let pos = if pos.is_finite() { pos } else { 0.0 };
        self.set_position_raw(pos.max(0.0).min(self.geometry.frame() as f64));
    }

    /// Rewind to the natural start for the current direction
    pub fn reset_position(&mut self) {
        let origin = self.geometry.origin(self.direction);
        self.set_position_raw(origin as f64);
    }

    #[inline]
    fn set_position_raw(&mut self, pos: f64) {
        self.pos = pos;
        self.int_pos = pos.floor() as i32;
    }

    #[inline]
    fn motion(&self) -> Motion {
        Motion {
            direction: self.direction,
            movement: self.movement,
            looping: self.looping,
            stopping: self.stopping,
            samples_to_fade: self.samples_to_fade(),
        }
    }

    /// Move by one frame and apply the boundary result
    pub fn advance(&mut self) -> LoopAction {
        if !self.running {
            return LoopAction::None;
        }

        let candidate = self.pos + self.rate * self.direction.sign();
        let boundary = resolve_boundary(&self.geometry, &self.motion(), candidate);
        self.set_position_raw(boundary.position);

        match boundary.action {
            LoopAction::Invert => {
                self.toggle_direction();
            }
            LoopAction::Stop => self.stop(true),
            LoopAction::Loop | LoopAction::None => {}
        }
        boundary.action
    }

    /// Valid buffer index for `index` under the current geometry
    #[inline]
    pub fn wrap(&self, index: i32) -> i32 {
        wrap_index(&self.geometry, &self.motion(), index)
    }

    // ─────────────────────────────────────────────────────────────
    // Run state
    // ─────────────────────────────────────────────────────────────

    /// Enable the head, optionally fading in
    pub fn run(&mut self, fade: bool) {
        if fade {
            self.begin_fade(FadeKind::In);
        } else {
            self.running = true;
        }
    }

    /// Disable the head and rewind it, optionally fading out first
    ///
    /// A fading stop while one is already under way is ignored.
    pub fn stop(&mut self, fade: bool) {
        self.halt(fade, true);
    }

    /// Disable the head but keep its position, so `run` resumes there
    pub fn pause(&mut self, fade: bool) {
        self.halt(fade, false);
    }

    fn halt(&mut self, fade: bool, rewind: bool) {
        if fade {
            if !self.stopping {
                self.stopping = true;
                self.rewind_on_stop = rewind;
                self.begin_fade(FadeKind::Out);
            }
        } else {
            self.stopping = false;
            self.running = false;
            self.fade.kind = FadeKind::None;
            if rewind {
                self.reset_position();
            }
        }
    }

    /// Start a switch-and-ramp from the last emitted value
    pub fn smooth(&mut self) {
        self.begin_fade(FadeKind::Smooth);
    }

    fn begin_fade(&mut self, kind: FadeKind) {
        if kind != FadeKind::Out {
            self.stopping = false;
        }
        self.fade = FadeState {
            kind,
            index: 0.0,
            snapshot: self.last_value,
        };
    }

    #[inline]
    fn fade_step(&self) -> f64 {
        self.rate.max(MIN_FADE_STEP)
    }

    // ─────────────────────────────────────────────────────────────
    // Buffer access
    // ─────────────────────────────────────────────────────────────

    /// Interpolated sample at `pos`
    ///
    /// Interpolates toward the neighbour in the direction of travel.
    pub fn read_at(&self, buffer: &[f32], pos: f64) -> f32 {
        let floor = pos.floor();
        let index = self.wrap(floor as i32);
        let value = sample(buffer, index);
        let frac = pos - floor;

        if frac > INTERPOLATION_EPSILON {
            let step = match self.direction {
                Direction::Forward => 1,
                Direction::Backward => -1,
            };
            let next = sample(buffer, self.wrap(index + step));
            return value + (next - value) * frac as f32;
        }

        value
    }

    /// Read at the current position, applying any active fade
    ///
    /// Returns 0 while the head is disabled.
    pub fn read(&mut self, buffer: &[f32]) -> f32 {
        let mut value = self.read_at(buffer, self.pos);
        let span = self.samples_to_fade() as f64;
        let step = self.fade_step();
        let progress = (self.fade.index / span) as f32;
        let fading = self.fade.index < span - 1.0;

        match self.fade.kind {
            FadeKind::In => {
                self.running = true;
                if fading {
                    value *= progress;
                    self.fade.index += step;
                } else {
                    self.fade.kind = FadeKind::None;
                }
            }
            FadeKind::Out => {
                if fading {
                    value *= 1.0 - progress;
                    self.fade.index += step;
                } else {
                    self.halt(false, self.rewind_on_stop);
                }
            }
            FadeKind::Smooth => {
                if fading {
                    value += (self.fade.snapshot - value) * (1.0 - progress);
                    self.fade.index += step;
                } else {
                    self.fade.kind = FadeKind::None;
                }
            }
            FadeKind::None => {}
        }

        self.last_value = if self.running { value } else { 0.0 };
        self.last_value
    }

    /// Write at the current position, blending with the buffer while fading
    pub fn write(&mut self, buffer: &mut [f32], value: f32) {
        let current = self.read_at(buffer, self.pos);
        let span = self.samples_to_fade() as f64;
        let step = self.fade_step();
        let progress = (self.fade.index / span) as f32;
        let fading = self.fade.index < span - 1.0;
        let mut value = value;

        match self.fade.kind {
            FadeKind::In => {
                self.running = true;
                if fading {
                    value = current * (1.0 - progress) + value * progress;
                    self.fade.index += step;
                } else {
                    self.fade.kind = FadeKind::None;
                }
            }
            FadeKind::Out => {
                if fading {
                    value = value * (1.0 - progress) + current * progress;
                    self.fade.index += step;
                } else {
                    self.halt(false, self.rewind_on_stop);
                }
            }
            FadeKind::Smooth => {
                if fading {
                    value += (self.fade.snapshot - value) * (1.0 - progress);
                    self.fade.index += step;
                } else {
                    self.fade.kind = FadeKind::None;
                }
            }
            FadeKind::None => {}
        }

        if self.running {
            let index = self.wrap(self.int_pos) as usize;
            if let Some(slot) = buffer.get_mut(index) {
                *slot = value;
            }
            self.last_value = value;
        }
    }

    /// Append a sample during the initial capture
    ///
    /// Returns `true` once capacity has been reached, including on the call
    /// that fills the last slot.
    pub fn buffer(&mut self, buffer: &mut [f32], value: f32) -> bool {
        if self.captured >= self.capacity {
            return true;
        }
        if let Some(slot) = buffer.get_mut(self.captured as usize) {
            *slot = value;
        }
        self.captured += 1;
        self.set_position_raw(self.captured as f64);
        self.captured >= self.capacity
    }

    /// End the capture: the loop spans everything captured so far
    ///
    /// Returns the captured length.
    pub fn stop_buffering(&mut self) -> i32 {
        let buffered = self.captured.max(1);
        self.init_buffer(buffered);
        buffered
    }

    /// Adopt an already captured length, spanning the loop over it
    pub fn init_buffer(&mut self, buffered: i32) {
        self.captured = buffered.max(1).min(self.capacity);
        self.geometry = LoopGeometry::spanning(self.captured);
        self.reset_position();
    }

    // ─────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────

    pub fn role(&self) -> HeadRole {
        self.role
    }
    pub fn capacity(&self) -> i32 {
        self.capacity
    }
    pub fn captured(&self) -> i32 {
        self.captured
    }
    pub fn geometry(&self) -> &LoopGeometry {
        &self.geometry
    }
    pub fn buffered(&self) -> i32 {
        self.geometry.buffered
    }
    pub fn loop_start(&self) -> i32 {
        self.geometry.start
    }
    pub fn loop_length(&self) -> i32 {
        self.geometry.length
    }
    pub fn loop_end(&self) -> i32 {
        self.geometry.end
    }
    pub fn position(&self) -> f64 {
        self.pos
    }
    pub fn int_position(&self) -> i32 {
        self.int_pos
    }
    pub fn rate(&self) -> f64 {
        self.rate
    }
    pub fn direction(&self) -> Direction {
        self.direction
    }
    pub fn movement(&self) -> Movement {
        self.movement
    }
    pub fn is_running(&self) -> bool {
        self.running
    }
    pub fn is_looping(&self) -> bool {
        self.looping
    }
    pub fn is_stopping(&self) -> bool {
        self.stopping
    }
    pub fn fade_kind(&self) -> FadeKind {
        self.fade.kind
    }
    pub fn is_fading(&self) -> bool {
        self.fade.kind != FadeKind::None
    }
}

#[inline]
fn sample(buffer: &[f32], index: i32) -> f32 {
    buffer.get(index as usize).copied().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const CAPACITY: i32 = 48000;

    /// Head with a fully captured ramp buffer (`buf[i] == i`)
    fn captured_head(role: HeadRole) -> (Head, Vec<f32>) {
        let mut head = Head::new(role);
        head.init(CAPACITY);
        let mut buf = vec![0.0; CAPACITY as usize];
        for i in 0..CAPACITY {
            head.buffer(&mut buf, i as f32);
        }
        head.stop_buffering();
        (head, buf)
    }

    #[test]
    fn test_buffer_reports_capacity_on_last_call() {
        let mut head = Head::new(HeadRole::Write);
        head.init(CAPACITY);
        let mut buf = vec![0.0; CAPACITY as usize];

        for i in 0..CAPACITY - 1 {
            assert!(!head.buffer(&mut buf, 0.5), "call {} reported full", i);
        }
        assert!(head.buffer(&mut buf, 0.5));
        assert!(head.buffer(&mut buf, 0.5));

        assert_eq!(head.stop_buffering(), CAPACITY);
        assert_eq!(head.loop_length(), 48000);
        assert_eq!(head.loop_end(), 47999);
    }

    #[test]
    fn test_stop_buffering_early() {
        let mut head = Head::new(HeadRole::Write);
        head.init(CAPACITY);
        let mut buf = vec![0.0; CAPACITY as usize];

        for _ in 0..1000 {
            head.buffer(&mut buf, 0.25);
        }
        assert_eq!(head.stop_buffering(), 1000);
        assert_eq!(head.buffered(), 1000);
        assert_eq!(head.loop_start(), 0);
        assert_eq!(head.loop_length(), 1000);
        assert_eq!(head.int_position(), 0);
        assert_eq!(buf[999], 0.25);
        assert_eq!(buf[1000], 0.0);
    }

    #[test]
    fn test_forward_loop_scenario() {
        let (mut head, _) = captured_head(HeadRole::Read);
        assert_eq!(head.set_loop_start(1000), 1000);
        assert_eq!(head.set_loop_length(500), 500);
        assert_eq!(head.loop_end(), 1499);

        head.set_position(1499.0);
        assert_eq!(head.advance(), LoopAction::Loop);
        assert_eq!(head.int_position(), 1000);
        assert_eq!(head.direction(), Direction::Forward);
    }

    #[test]
    fn test_pendulum_scenario() {
        let (mut head, _) = captured_head(HeadRole::Read);
        head.set_loop_start(1000);
        head.set_loop_length(500);
        head.set_movement(Movement::Pendulum);

        head.set_position(1499.0);
        assert_eq!(head.advance(), LoopAction::Invert);
        assert_eq!(head.int_position(), 1499);
        assert_eq!(head.direction(), Direction::Backward);
    }

    #[test]
    fn test_inverted_scenario() {
        let (mut head, _) = captured_head(HeadRole::Read);
        head.set_loop_start(47500);
        head.set_loop_length(1000);
        assert_eq!(head.loop_end(), 499);
        assert!(head.geometry().is_inverted());

        head.set_position(47999.0);
        head.advance();
        assert_eq!(head.int_position(), 0);
        assert_eq!(head.direction(), Direction::Forward);
    }

    #[test]
    fn test_advance_then_reverse_restores_position() {
        let (mut head, _) = captured_head(HeadRole::Read);
        head.set_rate(1.37);
        head.set_position(20000.25);

        head.advance();
        head.set_direction(Direction::Backward);
        head.advance();
        assert_relative_eq!(head.position(), 20000.25, epsilon = 1e-9);
    }

    #[test]
    fn test_pendulum_stays_in_region() {
        let (mut head, _) = captured_head(HeadRole::Read);
        head.set_loop_start(3000);
        head.set_loop_length(700);
        head.set_movement(Movement::Pendulum);
        head.reset_position();

        for &rate in &[0.3, 1.0, 2.5, 77.7, 699.0] {
            head.set_rate(rate);
            for _ in 0..5000 {
                head.advance();
                let i = head.int_position();
                assert!((3000..=3699).contains(&i), "rate {} left region at {}", rate, i);
            }
        }
    }

    #[test]
    fn test_out_fade_ends_silent_and_disabled() {
        let (mut head, buf) = captured_head(HeadRole::Read);
        head.set_loop_start(10000);
        head.set_loop_length(5000);
        head.set_samples_to_fade(100);
        head.reset_position();

        head.read(&buf);
        head.stop(true);
        assert!(head.is_stopping());

        let mut last = f32::NAN;
        for _ in 0..200 {
            last = head.read(&buf);
            head.advance();
            if !head.is_running() {
                break;
            }
        }
        assert_eq!(last, 0.0);
        assert!(!head.is_running());
        assert!(!head.is_fading());
        assert_eq!(head.int_position(), 10000);
    }

    #[test]
    fn test_stop_while_stopping_is_noop() {
        let (mut head, buf) = captured_head(HeadRole::Read);
        head.set_samples_to_fade(100);
        head.stop(true);
        for _ in 0..50 {
            head.read(&buf);
            head.advance();
        }
        let pos = head.position();
        head.stop(true);
        assert!(head.is_stopping());
        assert!(head.is_running());
        assert_eq!(head.position(), pos);
    }

    #[test]
    fn test_pause_keeps_position() {
        let (mut head, buf) = captured_head(HeadRole::Read);
        head.set_samples_to_fade(10);
        head.set_position(2000.0);
        head.pause(true);
        assert!(head.is_stopping());

        for _ in 0..30 {
            head.read(&buf);
            head.advance();
        }
        assert!(!head.is_running());
        assert!(!head.is_fading());
        assert_eq!(head.int_position(), 2009);

        head.run(true);
        assert_eq!(head.read(&buf), 0.0);
        assert!(head.is_running());
        for _ in 0..20 {
            head.advance();
            head.read(&buf);
        }
        assert_eq!(head.int_position(), 2029);
        assert_eq!(head.read(&buf), 2029.0);
    }

    #[test]
    fn test_in_fade_ramps_from_silence() {
        let (mut head, _) = captured_head(HeadRole::Read);
        let buf = vec![1.0; CAPACITY as usize];
        head.set_samples_to_fade(10);
        head.stop(false);
        assert_eq!(head.read(&buf), 0.0);

        head.run(true);
        let mut values = Vec::new();
        for _ in 0..12 {
            values.push(head.read(&buf));
            head.advance();
        }
        assert_eq!(values[0], 0.0);
        assert!(values.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(*values.last().unwrap(), 1.0);
        assert!(head.is_running());
        assert!(!head.is_fading());
    }

    #[test]
    fn test_zero_rate_fade_completes() {
        let (mut head, buf) = captured_head(HeadRole::Read);
        head.set_samples_to_fade(4);
        head.set_rate(0.0);
        head.stop(true);
        for _ in 0..1000 {
            head.read(&buf);
        }
        assert!(!head.is_running());
    }

    #[test]
    fn test_smooth_blends_from_snapshot() {
        let (mut head, _) = captured_head(HeadRole::Read);
        let mut buf = vec![0.0; CAPACITY as usize];
        buf[20000..].iter_mut().for_each(|s| *s = 1.0);
        head.set_samples_to_fade(100);
        head.set_position(100.0);
        assert_eq!(head.read(&buf), 0.0);

        head.set_position(30000.0);
        head.smooth();
        let first = head.read(&buf);
        assert_relative_eq!(first, 0.0);
        for _ in 0..200 {
            head.advance();
            head.read(&buf);
        }
        assert_eq!(head.read(&buf), 1.0);
    }

    #[test]
    fn test_read_interpolates_in_direction_of_travel() {
        let (mut head, buf) = captured_head(HeadRole::Read);
        assert_relative_eq!(head.read_at(&buf, 100.25), 100.25);
        assert_eq!(head.read_at(&buf, 100.0), 100.0);

        head.set_direction(Direction::Backward);
        assert_relative_eq!(head.read_at(&buf, 100.25), 99.75);
    }

    #[test]
    fn test_write_fade_in_blends_with_buffer() {
        let (mut head, _) = captured_head(HeadRole::Write);
        let mut buf = vec![1.0; CAPACITY as usize];
        head.set_samples_to_fade(10);
        head.stop(false);
        head.run(true);

        head.write(&mut buf, 0.0);
        assert_eq!(buf[0], 1.0);
        for _ in 0..20 {
            head.advance();
            head.write(&mut buf, 0.0);
        }
        assert_eq!(buf[20], 0.0);
        assert!(buf[5] < 1.0 && buf[5] > 0.0);
    }

    #[test]
    fn test_write_smooth_ramps_from_last_written() {
        let (mut head, _) = captured_head(HeadRole::Write);
        let mut buf = vec![0.5; CAPACITY as usize];
        head.set_samples_to_fade(10);

        head.write(&mut buf, 1.0);
        head.advance();
        head.smooth();
        for _ in 0..30 {
            head.write(&mut buf, 0.0);
            head.advance();
        }

        assert_eq!(buf[0], 1.0);
        assert_eq!(buf[1], 1.0);
        assert_relative_eq!(buf[5], 0.6, epsilon = 1e-6);
        assert!(buf[1..=10].windows(2).all(|w| w[1] < w[0]));
        assert_eq!(buf[10], 0.0);
        assert_eq!(buf[30], 0.0);
        assert_eq!(buf[31], 0.5);
        assert!(!head.is_fading());
    }

    #[test]
    fn test_write_fade_out_keeps_buffer_content() {
        let (mut head, _) = captured_head(HeadRole::Write);
        let mut buf = vec![0.5; CAPACITY as usize];
        head.set_samples_to_fade(10);
        head.stop(true);

        for _ in 0..30 {
            head.write(&mut buf, 1.0);
            head.advance();
        }

        assert_eq!(buf[0], 1.0);
        assert!(buf[8] > 0.5 && buf[8] < 1.0);
        assert!(buf[..9].windows(2).all(|w| w[1] < w[0]));
        // Nothing is written once the fade has completed
        assert!(buf[9..].iter().all(|&s| s == 0.5));
        assert!(!head.is_running());
        assert_eq!(head.int_position(), 0);
    }

    #[test]
    fn test_pendulum_interpolation_mirrors_at_edges() {
        let (mut head, buf) = captured_head(HeadRole::Read);
        head.set_loop_start(1000);
        head.set_loop_length(500);
        head.set_movement(Movement::Pendulum);

        // The neighbour past an edge is the reflected sample, not the far end
        assert_relative_eq!(head.read_at(&buf, 1499.5), 1499.0);
        head.set_direction(Direction::Backward);
        assert_relative_eq!(head.read_at(&buf, 1000.5), 1000.0);

        head.set_loop_start(47500);
        head.set_loop_length(1000);
        assert!(head.geometry().is_inverted());
        head.set_direction(Direction::Forward);
        assert_relative_eq!(head.read_at(&buf, 499.5), 499.0);
        head.set_direction(Direction::Backward);
        assert_relative_eq!(head.read_at(&buf, 47500.5), 47500.0);

        // Inside the region interpolation is unchanged
        assert_relative_eq!(head.read_at(&buf, 47600.5), 47599.5);
    }

    #[test]
    fn test_stopped_write_head_leaves_buffer() {
        let (mut head, _) = captured_head(HeadRole::Write);
        let mut buf = vec![0.5; CAPACITY as usize];
        head.stop(false);
        head.write(&mut buf, -1.0);
        assert!(buf.iter().all(|&s| s == 0.5));
    }

    #[test]
    fn test_set_loop_start_rewinds_non_looping_head() {
        let (mut head, _) = captured_head(HeadRole::Read);
        head.set_looping(false);
        head.set_position(123.0);
        head.set_loop_start(5000);
        assert_eq!(head.int_position(), 5000);
    }

    #[test]
    fn test_non_looping_head_fades_out_before_end() {
        let (mut head, buf) = captured_head(HeadRole::Read);
        head.set_loop_start(0);
        head.set_loop_length(1000);
        head.set_samples_to_fade(50);
        head.set_looping(false);
        head.reset_position();

        let mut frames = 0;
        while head.is_running() && frames < 5000 {
            head.read(&buf);
            head.advance();
            frames += 1;
        }
        assert!(!head.is_running());
        // Fade-out starts 50 samples before the end and lasts 50 samples
        assert!(frames <= 1000, "stopped after {} frames", frames);
        assert_eq!(head.int_position(), 0);
    }

    #[test]
    fn test_rate_clamped_non_negative() {
        let mut head = Head::new(HeadRole::Read);
        assert_eq!(head.set_rate(-3.0), 0.0);
        assert_eq!(head.set_rate(f64::NAN), 0.0);
        assert_eq!(head.set_rate(2.0), 2.0);
    }
}
