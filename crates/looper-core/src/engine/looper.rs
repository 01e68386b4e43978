//! Per-channel looper: a read head and a write head over one buffer
//!
//! The channel looper borrows the host's buffer for its whole lifetime and
//! lends it to the heads call by call. It owns the channel-level state the
//! heads don't know about: trigger mode and gate, write enable, the drunk
//! walk and the point where the two heads will meet.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::boundary::{Direction, LoopAction, Movement};
use super::head::{FadeKind, Head, HeadRole};
use crate::error::{LooperError, LooperResult};

/// Slowest read/write speed multiplier
pub const MIN_RATE: f64 = 0.02;

/// Fastest read/write speed multiplier
pub const MAX_RATE: f64 = 50.0;

/// Mean time between random reversals of a drunk head at unity rate
pub const DRUNK_MEAN_SECONDS: f64 = 2.0;

/// How the read head responds to start/stop/trigger events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// Free-running loop
    #[default]
    Loop,
    /// Plays only while the gate is held, dry pass-through otherwise
    Gate,
    /// One-shot from the loop start on every trigger
    Trigger,
}

/// One channel of the looper
pub struct ChannelLooper<'a> {
    buffer: &'a mut [f32],
    sample_rate: f64,

    read: Head,
    write: Head,

    trigger_mode: TriggerMode,
    movement: Movement,
    direction: Direction,
    read_rate: f64,
    write_rate: f64,

    gate_open: bool,
    /// A restart fade is in flight
    restarting: bool,

    head_distance: i32,
    cross_point: Option<i32>,

    rng: ChaCha8Rng,
}

impl<'a> ChannelLooper<'a> {
    /// Create a looper over a host-provided buffer
    ///
    /// `seed` drives the drunk walk so runs are reproducible.
    pub fn new(buffer: &'a mut [f32], sample_rate: u32, seed: u64) -> LooperResult<Self> {
        if buffer.is_empty() {
            return Err(LooperError::EmptyBuffer);
        }
        if buffer.len() > i32::MAX as usize {
            return Err(LooperError::BufferTooLarge(buffer.len()));
        }
        if sample_rate == 0 {
            return Err(LooperError::InvalidSampleRate(sample_rate));
        }

        let capacity = buffer.len() as i32;
        let mut read = Head::new(HeadRole::Read);
        let mut write = Head::new(HeadRole::Write);
        read.init(capacity);
        write.init(capacity);

        log::debug!(
            "ChannelLooper: {} samples ({:.2}s) at {}Hz",
            capacity,
            capacity as f64 / sample_rate as f64,
            sample_rate
        );

        let mut looper = Self {
            buffer,
            sample_rate: sample_rate as f64,
            read,
            write,
            trigger_mode: TriggerMode::Loop,
            movement: Movement::Normal,
            direction: Direction::Forward,
            read_rate: 1.0,
            write_rate: 1.0,
            gate_open: false,
            restarting: false,
            head_distance: 0,
            cross_point: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        looper.reset();
        Ok(looper)
    }

    /// Forget the capture and return to the initial state
    ///
    /// Buffer contents are left alone; see [`ChannelLooper::clear_buffer`].
    pub fn reset(&mut self) {
        self.read.reset();
        self.write.reset();
        self.trigger_mode = TriggerMode::Loop;
        self.movement = Movement::Normal;
        self.direction = Direction::Forward;
        self.read_rate = 1.0;
        self.write_rate = 1.0;
        self.gate_open = false;
        self.restarting = false;
        self.update_derived();
    }

    /// Zero the whole buffer
    pub fn clear_buffer(&mut self) {
        self.buffer.fill(0.0);
    }

    // ─────────────────────────────────────────────────────────────
    // Capture
    // ─────────────────────────────────────────────────────────────

    /// Append a sample to the capture; `true` once the buffer is full
    pub fn buffer(&mut self, value: f32) -> bool {
        self.write.buffer(self.buffer, value)
    }

    /// End the capture and span the loop over what was recorded
    pub fn stop_buffering(&mut self) -> i32 {
        let buffered = self.write.stop_buffering();
        self.read.init_buffer(buffered);
        self.update_derived();
        log::debug!("ChannelLooper: captured {} samples", buffered);
        buffered
    }

    // ─────────────────────────────────────────────────────────────
    // Parameters
    // ─────────────────────────────────────────────────────────────

    /// Set the loop start on both heads, returning the applied value
    pub fn set_loop_start(&mut self, start: i32) -> i32 {
        let applied = self.read.set_loop_start(start);
        self.write.set_loop_start(applied);
        self.update_derived();
        applied
    }

    /// Set the loop length on both heads, returning the applied value
    pub fn set_loop_length(&mut self, length: i32) -> i32 {
        let applied = self.read.set_loop_length(length);
        self.write.set_loop_length(applied);
        self.update_derived();
        applied
    }

    /// Move the loop end, keeping the start; returns the applied end
    ///
    /// An end before the start wraps through the buffer end, giving an
    /// inverted loop.
    pub fn set_loop_end(&mut self, end: i32) -> i32 {
        let buffered = self.buffered();
        let end = end.clamp(0, buffered - 1);
        let length = (end - self.loop_start()).rem_euclid(buffered) + 1;
        self.set_loop_length(length);
        self.loop_end()
    }

    /// Jump the read head, clamped into the captured region
    pub fn set_read_position(&mut self, pos: f64) {
        self.read.set_position(pos);
        self.update_derived();
    }

    /// Jump the write head, clamped into the captured region
    pub fn set_write_position(&mut self, pos: f64) {
        self.write.set_position(pos);
        self.update_derived();
    }

    pub fn set_read_rate(&mut self, rate: f64) -> f64 {
        self.read_rate = clamp_rate(rate);
        self.read.set_rate(self.read_rate);
        self.update_derived();
        self.read_rate
    }

    pub fn set_write_rate(&mut self, rate: f64) -> f64 {
        self.write_rate = clamp_rate(rate);
        self.write.set_rate(self.write_rate);
        self.update_derived();
        self.write_rate
    }

    pub fn set_movement(&mut self, movement: Movement) {
        self.movement = movement;
        self.read.set_movement(movement);
        self.write.set_movement(movement);
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
        self.read.set_direction(direction);
        self.write.set_direction(direction);
        self.update_derived();
    }

    pub fn toggle_direction(&mut self) -> Direction {
        self.set_direction(self.direction.flipped());
        self.direction
    }

    pub fn set_samples_to_fade(&mut self, samples: i32) -> i32 {
        self.write.set_samples_to_fade(samples);
        self.read.set_samples_to_fade(samples)
    }

    /// Switch trigger mode
    ///
    /// Only a `Trigger` read head is one-shot; the transport action that goes
    /// with a mode change is up to the caller.
    pub fn set_trigger_mode(&mut self, mode: TriggerMode) {
        self.trigger_mode = mode;
        self.read.set_looping(mode != TriggerMode::Trigger);
        self.restarting = false;
    }

    /// Freeze amount: at 0.5 and above the write head fades out, below it
    /// fades back in
    pub fn set_writing(&mut self, amount: f32) {
        let frozen = amount >= 0.5;
        let writing = self.write.is_running() && !self.write.is_stopping();

        if frozen && writing {
            self.write.stop(true);
        } else if !frozen && !writing && self.write.fade_kind() != FadeKind::In {
            self.write.run(true);
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Transport
    // ─────────────────────────────────────────────────────────────

    /// Start playback; `true` when the read head is already playing
    pub fn start(&mut self) -> bool {
        if self.read.is_running() && !self.read.is_stopping() {
            return true;
        }
        self.read.run(true);
        false
    }

    /// Stop playback; `true` when the read head is already stopped
    pub fn stop(&mut self) -> bool {
        if !self.read.is_running() {
            self.restarting = false;
            return true;
        }
        self.read.stop(true);
        false
    }

    /// Restart playback
    ///
    /// With `reset_position` the read head jumps back to the loop's natural
    /// start, ramping from its last value if it was playing. Without it a
    /// stopped head resumes where it is. Returns `true` when a restart is
    /// already in progress or nothing needs to change.
    pub fn restart(&mut self, reset_position: bool) -> bool {
        if self.restarting {
            return true;
        }

        if reset_position {
            let playing = self.read.is_running() && !self.read.is_stopping();
            self.read.reset_position();
            if playing {
                self.read.smooth();
            } else {
                self.read.run(true);
            }
        } else {
            if self.read.is_running() && !self.read.is_stopping() {
                return true;
            }
            self.read.run(true);
        }

        self.restarting = true;
        self.update_derived();
        false
    }

    /// Force a restart from the loop start, whatever the current state
    pub fn trigger(&mut self) {
        self.restarting = false;
        self.restart(true);
    }

    /// Gate input; only acts in [`TriggerMode::Gate`]
    ///
    /// Closing the gate pauses the read head where it is; opening it fades
    /// back in from there.
    pub fn set_gate(&mut self, open: bool) {
        if open == self.gate_open {
            return;
        }
        self.gate_open = open;
        if self.trigger_mode != TriggerMode::Gate {
            return;
        }
        self.restarting = false;
        if open {
            self.restart(false);
        } else if self.read.is_running() {
            self.read.pause(true);
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Per-frame processing
    // ─────────────────────────────────────────────────────────────

    /// Read the wet signal
    ///
    /// In gate mode a closed (stopped) read head passes `dry` through.
    pub fn read(&mut self, dry: f32) -> f32 {
        if self.trigger_mode == TriggerMode::Gate && !self.read.is_running() && !self.read.is_fading()
        {
            return dry;
        }
        self.read.read(self.buffer)
    }

    pub fn write(&mut self, value: f32) {
        self.write.write(self.buffer, value);
    }

    /// Move the read head one frame
    pub fn advance_read(&mut self) -> LoopAction {
        let action = self.read.advance();

        let mut reversed = false;
        if self.movement == Movement::Drunk && self.read.is_running() {
            let chance = self.read.rate() / (self.sample_rate * DRUNK_MEAN_SECONDS);
            if self.rng.random::<f64>() < chance {
                self.read.toggle_direction();
                reversed = true;
            }
        }

        if action != LoopAction::None || reversed {
            self.update_cross_point();
        }
        action
    }

    /// Move the write head one frame
    pub fn advance_write(&mut self) -> LoopAction {
        let action = self.write.advance();
        if action != LoopAction::None {
            self.update_cross_point();
        }
        action
    }

    /// End-of-frame bookkeeping
    ///
    /// Tracks head separation, finishes restarts whose fade has completed and
    /// re-targets the cross point once the heads have met. Returns `true`
    /// while either head is still fading.
    pub fn handle_fade(&mut self) -> bool {
        self.head_distance = self.write.int_position() - self.read.int_position();

        if self.restarting && !self.read.is_fading() {
            self.restarting = false;
        }

        if let Some(point) = self.cross_point {
            let reach = self.read.rate().ceil().max(1.0) as i32;
            if (self.read.int_position() - point).abs() <= reach {
                self.update_cross_point();
            }
        }

        self.read.is_fading() || self.write.is_fading()
    }

    fn update_derived(&mut self) {
        self.head_distance = self.write.int_position() - self.read.int_position();
        self.update_cross_point();
    }

    /// Predict where the read head will next meet the write head
    ///
    /// Both heads are projected onto the loop as offsets from its start; with
    /// relative velocity `v` the read head covers the gap in `gap / |v|`
    /// frames. Heads moving in lock-step never meet.
    fn update_cross_point(&mut self) {
        let geometry = *self.read.geometry();
        let length = geometry.length as f64;
        if length <= 0.0 {
            self.cross_point = None;
            return;
        }

        let offset = |pos: f64| {
            let floor = pos.floor();
            geometry.offset_of(floor as i32) as f64 + (pos - floor)
        };
        let read_offset = offset(self.read.position());
        let write_offset = offset(self.write.position());

        let read_velocity = self.read.rate() * self.read.direction().sign();
        let write_velocity = self.write.rate() * self.write.direction().sign();
        let velocity = read_velocity - write_velocity;
        if velocity.abs() < f64::EPSILON {
            self.cross_point = None;
            return;
        }

        let gap = if velocity > 0.0 {
            (write_offset - read_offset).rem_euclid(length)
        } else {
            (read_offset - write_offset).rem_euclid(length)
        };
        let frames = gap / velocity.abs();
        let meet = (read_offset + read_velocity * frames).rem_euclid(length);
        let index = (geometry.start as f64 + meet).floor() as i32;
        self.cross_point = Some(index.rem_euclid(geometry.buffered));
    }

    // ─────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
    pub fn buffered(&self) -> i32 {
        self.read.buffered()
    }
    pub fn captured(&self) -> i32 {
        self.write.captured()
    }
    pub fn loop_start(&self) -> i32 {
        self.read.loop_start()
    }
    pub fn loop_length(&self) -> i32 {
        self.read.loop_length()
    }
    pub fn loop_end(&self) -> i32 {
        self.read.loop_end()
    }
    pub fn read_position(&self) -> f64 {
        self.read.position()
    }
    pub fn write_position(&self) -> i32 {
        self.write.int_position()
    }
    pub fn read_rate(&self) -> f64 {
        self.read_rate
    }
    pub fn write_rate(&self) -> f64 {
        self.write_rate
    }
    pub fn movement(&self) -> Movement {
        self.movement
    }
    /// Current direction of the read head (a drunk walk may have flipped it)
    pub fn direction(&self) -> Direction {
        self.read.direction()
    }
    pub fn trigger_mode(&self) -> TriggerMode {
        self.trigger_mode
    }
    pub fn is_gate_open(&self) -> bool {
        self.gate_open
    }
    pub fn is_playing(&self) -> bool {
        self.read.is_running()
    }
    pub fn is_writing(&self) -> bool {
        self.write.is_running()
    }
    /// Write position minus read position, in samples
    pub fn head_distance(&self) -> i32 {
        self.head_distance
    }
    /// Where the read head will next meet the write head
    pub fn cross_point(&self) -> Option<i32> {
        self.cross_point
    }
    pub fn read_head(&self) -> &Head {
        &self.read
    }
    pub fn write_head(&self) -> &Head {
        &self.write
    }
    pub fn buffer_data(&self) -> &[f32] {
        self.buffer
    }

    pub fn buffer_seconds(&self) -> f32 {
        (self.buffered() as f64 / self.sample_rate) as f32
    }
    pub fn loop_start_seconds(&self) -> f32 {
        (self.loop_start() as f64 / self.sample_rate) as f32
    }
    pub fn loop_length_seconds(&self) -> f32 {
        (self.loop_length() as f64 / self.sample_rate) as f32
    }
    pub fn read_position_seconds(&self) -> f32 {
        (self.read_position() / self.sample_rate) as f32
    }
}

#[inline]
fn clamp_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        return 1.0;
    }
    rate.clamp(MIN_RATE, MAX_RATE)
}
