//! Stereo looper engine
//!
//! Two [`ChannelLooper`]s driven in lock-step through a phase state machine:
//!
//! ```text
//! Startup ──► Buffering ──► Ready ──► Recording ⇄ Frozen
//!                ▲                        │
//!                └──────── reset ─────────┘
//! ```
//!
//! - **Startup**: sample-counted warm-up, dry pass-through
//! - **Buffering**: both channels capture their input until full (or told
//!   to stop), dry pass-through
//! - **Ready**: the captured region becomes the loop; moves on to
//!   recording on `Start` or right away with `auto_start`
//! - **Recording / Frozen**: the full signal path; freeze at 0.5 and above
//!   stops writing and routes the filter onto the loop output
//!
//! Nothing in the per-frame path allocates, locks or logs.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::atomics::LooperAtomics;
use super::boundary::{Direction, Movement, MIN_LOOP_LENGTH};
use super::command::LooperCommand;
use super::looper::{ChannelLooper, TriggerMode, MAX_RATE, MIN_RATE};
use super::params::ChannelTargets;
use crate::config::LooperConfig;
use crate::dsp::{
    Crossfader, EqualPowerCrossfade, FilterMode, ResonantFilter, Saturator, SoftClipper, Svf,
};
use crate::error::{LooperError, LooperResult};
use crate::types::{Channel, ChannelSelect, StereoSample, NUM_CHANNELS};

/// Cutoff below which the filter path is bypassed
pub const FILTER_ACTIVE_HZ: f32 = 20.0;

/// Highest input gain accepted
pub const MAX_GAIN: f32 = 4.0;

/// Freeze amount at which writing stops
pub const FREEZE_THRESHOLD: f32 = 0.5;

/// Engine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LooperPhase {
    Startup = 0,
    Buffering = 1,
    Ready = 2,
    Recording = 3,
    Frozen = 4,
}

impl LooperPhase {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => LooperPhase::Buffering,
            2 => LooperPhase::Ready,
            3 => LooperPhase::Recording,
            4 => LooperPhase::Frozen,
            _ => LooperPhase::Startup,
        }
    }

    /// Recording or frozen
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, LooperPhase::Recording | LooperPhase::Frozen)
    }
}

/// One-shot requests waiting for the next frame
#[derive(Debug, Clone, Copy, Default)]
struct PendingRequests {
    clear: bool,
    reset: bool,
    stop_buffering: bool,
    /// Leave the ready phase
    begin: bool,
    start: bool,
    stop: bool,
    restart: bool,
    write_rate: [Option<f64>; NUM_CHANNELS],
}

/// Dual-channel looper engine
///
/// Generic over its DSP collaborators; [`StereoLooper::new`] uses the
/// built-in filter, crossfader and soft clipper.
pub struct StereoLooper<'a, F = Svf, C = EqualPowerCrossfade, S = SoftClipper>
where
    F: ResonantFilter,
    C: Crossfader,
    S: Saturator,
{
    loopers: [ChannelLooper<'a>; NUM_CHANNELS],
    phase: LooperPhase,
    sample_rate: u32,

    startup_samples: u64,
    startup_counter: u64,
    auto_start: bool,
    default_read_rate: f64,

    // Levels
    gain: f32,
    mix: f32,
    feedback: f32,
    stereo_image: f32,
    freeze: f32,
    dry_level: f32,

    // Filter path
    filter_cutoff: f32,
    filter_resonance: f32,
    filter_mode: FilterMode,
    feedback_filters: [F; NUM_CHANNELS],
    output_filters: [F; NUM_CHANNELS],

    crossfade: C,
    saturator: S,

    targets: [ChannelTargets; NUM_CHANNELS],
    pending: PendingRequests,

    atomics: Arc<LooperAtomics>,
}

impl<'a> StereoLooper<'a> {
    /// Create an engine over two host-provided channel buffers
    pub fn new(
        left: &'a mut [f32],
        right: &'a mut [f32],
        config: &LooperConfig,
    ) -> LooperResult<Self> {
        Self::with_dsp(
            left,
            right,
            config,
            Svf::new(),
            EqualPowerCrossfade::new(),
            SoftClipper,
        )
    }
}

impl<'a, F, C, S> StereoLooper<'a, F, C, S>
where
    F: ResonantFilter + Clone,
    C: Crossfader,
    S: Saturator,
{
    /// Create an engine with custom DSP collaborators
    ///
    /// `filter` is cloned for the feedback and output paths of each channel.
    pub fn with_dsp(
        left: &'a mut [f32],
        right: &'a mut [f32],
        config: &LooperConfig,
        filter: F,
        crossfade: C,
        saturator: S,
    ) -> LooperResult<Self> {
        config.validate()?;
        if left.len() != right.len() {
            return Err(LooperError::BufferLengthMismatch {
                left: left.len(),
                right: right.len(),
            });
        }

        let seeds = Channel::ALL.map(|ch| config.drunk_seed.wrapping_add(ch.index() as u64));
        for ch in Channel::ALL {
            log::debug!("StereoLooper: {} channel drunk seed {:#x}", ch.name(), seeds[ch.index()]);
        }
        let loopers = [
            ChannelLooper::new(left, config.sample_rate, seeds[0])?,
            ChannelLooper::new(right, config.sample_rate, seeds[1])?,
        ];

        let init_filter = || {
            let mut f = filter.clone();
            f.init(config.sample_rate as f32);
            f
        };
        let feedback_filters = [init_filter(), init_filter()];
        let output_filters = [init_filter(), init_filter()];

        let position_coeff = config.position_slew as f64;
        let rate_coeff = config.rate_slew as f64;

        let mut engine = Self {
            loopers,
            phase: LooperPhase::Startup,
            sample_rate: config.sample_rate,
            startup_samples: config.startup_samples(),
            startup_counter: 0,
            auto_start: config.auto_start,
            default_read_rate: clamp_read_rate(config.read_rate),
            gain: 1.0,
            mix: 0.5,
            feedback: 0.0,
            stereo_image: 1.0,
            freeze: 0.0,
            dry_level: 1.0,
            filter_cutoff: 0.0,
            filter_resonance: config.filter.resonance,
            filter_mode: config.filter.mode,
            feedback_filters,
            output_filters,
            crossfade,
            saturator,
            targets: [
                ChannelTargets::new(position_coeff, rate_coeff),
                ChannelTargets::new(position_coeff, rate_coeff),
            ],
            pending: PendingRequests::default(),
            atomics: Arc::new(LooperAtomics::new()),
        };

        engine.set_gain(config.gain);
        engine.set_mix(config.mix);
        engine.set_feedback(config.feedback);
        engine.set_stereo_image(config.stereo_image);
        engine.set_filter_resonance(config.filter.resonance);
        engine.set_filter_cutoff(config.filter.cutoff);
        engine.set_samples_to_fade(config.fade_samples);
        engine.set_movement(ChannelSelect::Both, config.movement);
        engine.set_direction(ChannelSelect::Both, config.direction);
        engine.set_trigger_mode(config.trigger_mode);
        // Nothing is playing yet, the mode's transport action is moot
        engine.pending = PendingRequests::default();
        engine.publish_state();

        log::info!(
            "StereoLooper: {} samples per channel at {}Hz, warm-up {} samples",
            engine.loopers[0].capacity(),
            config.sample_rate,
            engine.startup_samples
        );

        Ok(engine)
    }

    // ─────────────────────────────────────────────────────────────
    // Command handling
    // ─────────────────────────────────────────────────────────────

    /// Drain the command queue; call once per block before processing
    pub fn process_commands(&mut self, rx: &mut rtrb::Consumer<LooperCommand>) {
        while let Ok(cmd) = rx.pop() {
            self.apply_command(cmd);
        }
    }

    /// Apply a single command
    pub fn apply_command(&mut self, cmd: LooperCommand) {
        match cmd {
            LooperCommand::SetGain(v) => {
                self.set_gain(v);
            }
            LooperCommand::SetMix(v) => {
                self.set_mix(v);
            }
            LooperCommand::SetFeedback(v) => {
                self.set_feedback(v);
            }
            LooperCommand::SetStereoImage(v) => {
                self.set_stereo_image(v);
            }
            LooperCommand::SetFreeze(v) => {
                self.set_freeze(v);
            }
            LooperCommand::SetFilterCutoff(v) => {
                self.set_filter_cutoff(v);
            }
            LooperCommand::SetFilterResonance(v) => {
                self.set_filter_resonance(v);
            }
            LooperCommand::SetFilterMode(mode) => self.filter_mode = mode,
            LooperCommand::SetLoopStart { channel, samples } => {
                self.set_loop_start(channel, samples);
            }
            LooperCommand::SetLoopLength { channel, samples } => {
                self.set_loop_length(channel, samples);
            }
            LooperCommand::SetReadRate { channel, rate } => {
                self.set_read_rate(channel, rate);
            }
            LooperCommand::SetMovement { channel, movement } => {
                self.set_movement(channel, movement)
            }
            LooperCommand::SetDirection { channel, direction } => {
                self.set_direction(channel, direction)
            }
            LooperCommand::SetTriggerMode(mode) => self.set_trigger_mode(mode),
            LooperCommand::SetGate(open) => {
                for looper in self.loopers.iter_mut() {
                    looper.set_gate(open);
                }
            }
            LooperCommand::SetSamplesToFade(samples) => {
                self.set_samples_to_fade(samples);
            }
            LooperCommand::ClearBuffer => {
                log::info!("StereoLooper: clear buffer requested");
                self.pending.clear = true;
            }
            LooperCommand::ResetLooper => {
                log::info!("StereoLooper: reset requested in {:?}", self.phase);
                self.pending.reset = true;
            }
            LooperCommand::StopBuffering => {
                if self.phase == LooperPhase::Buffering {
                    log::info!("StereoLooper: stop buffering requested");
                    self.pending.stop_buffering = true;
                }
            }
            LooperCommand::Start => {
                if self.phase == LooperPhase::Ready {
                    log::info!("StereoLooper: start recording requested");
                    self.pending.begin = true;
                } else {
                    self.request_start();
                }
            }
            LooperCommand::Stop => self.request_stop(),
            LooperCommand::Restart => self.request_restart(),
            LooperCommand::SetWriteRate { channel, rate } => {
                let rate = clamp_read_rate(rate);
                for ch in Channel::ALL {
                    if channel.includes(ch) {
                        self.pending.write_rate[ch.index()] = Some(rate);
                    }
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Control surface
    // ─────────────────────────────────────────────────────────────

    pub fn set_gain(&mut self, gain: f32) -> f32 {
        self.gain = clamp_unit_scaled(gain, MAX_GAIN);
        self.gain
    }

    pub fn set_mix(&mut self, mix: f32) -> f32 {
        self.mix = self.crossfade.set_position(clamp_unit_scaled(mix, 1.0));
        self.mix
    }

    pub fn set_feedback(&mut self, feedback: f32) -> f32 {
        self.feedback = clamp_unit_scaled(feedback, 1.0);
        self.feedback
    }

    pub fn set_stereo_image(&mut self, image: f32) -> f32 {
        self.stereo_image = clamp_unit_scaled(image, 1.0);
        self.stereo_image
    }

    /// Set the freeze amount, switching between recording and frozen
    pub fn set_freeze(&mut self, freeze: f32) -> f32 {
        self.freeze = clamp_unit_scaled(freeze, 1.0);

        if self.phase.is_running() {
            self.phase = if self.freeze >= FREEZE_THRESHOLD {
                LooperPhase::Frozen
            } else {
                LooperPhase::Recording
            };
            for looper in self.loopers.iter_mut() {
                looper.set_writing(self.freeze);
            }
        }
        self.freeze
    }

    /// Set the filter cutoff; resonance and drive follow it
    pub fn set_filter_cutoff(&mut self, cutoff: f32) -> f32 {
        self.filter_cutoff = if cutoff.is_finite() { cutoff.max(0.0) } else { 0.0 };
        self.update_filters();
        self.filter_cutoff
    }

    pub fn set_filter_resonance(&mut self, resonance: f32) -> f32 {
        self.filter_resonance = clamp_unit_scaled(resonance, 1.0);
        self.update_filters();
        self.filter_resonance
    }

    pub fn set_filter_mode(&mut self, mode: FilterMode) {
        self.filter_mode = mode;
    }

    fn update_filters(&mut self) {
        let cutoff = self.filter_cutoff;
        let drive = cutoff * 0.0001;
        let resonance = self.filter_resonance + cutoff * 0.0005;
        for filter in self
            .feedback_filters
            .iter_mut()
            .chain(self.output_filters.iter_mut())
        {
            filter.set_frequency(cutoff.max(FILTER_ACTIVE_HZ));
            filter.set_drive(drive);
            filter.set_resonance(resonance);
        }
    }

    /// Loop start target in samples, clamped to the captured region
    pub fn set_loop_start(&mut self, channel: ChannelSelect, samples: f32) {
        for ch in Channel::ALL {
            if channel.includes(ch) {
                let max = (self.loopers[ch.index()].buffered() - 1).max(0) as f64;
                let target = finite_or(samples as f64, 0.0).max(0.0).min(max);
                self.targets[ch.index()].loop_start.set_target(target);
            }
        }
    }

    /// Loop length target in samples, clamped to the captured region
    pub fn set_loop_length(&mut self, channel: ChannelSelect, samples: f32) {
        for ch in Channel::ALL {
            if channel.includes(ch) {
                let buffered = self.loopers[ch.index()].buffered();
                let min = MIN_LOOP_LENGTH.min(buffered) as f64;
                let target = finite_or(samples as f64, buffered as f64)
                    .max(min)
                    .min(buffered as f64);
                self.targets[ch.index()].loop_length.set_target(target);
            }
        }
    }

    pub fn set_read_rate(&mut self, channel: ChannelSelect, rate: f32) {
        let rate = clamp_read_rate(rate);
        for ch in Channel::ALL {
            if channel.includes(ch) {
                self.targets[ch.index()].read_rate.set_target(rate);
            }
        }
    }

    pub fn set_movement(&mut self, channel: ChannelSelect, movement: Movement) {
        for ch in Channel::ALL {
            if channel.includes(ch) {
                self.loopers[ch.index()].set_movement(movement);
            }
        }
    }

    pub fn set_direction(&mut self, channel: ChannelSelect, direction: Direction) {
        for ch in Channel::ALL {
            if channel.includes(ch) {
                self.loopers[ch.index()].set_direction(direction);
            }
        }
    }

    /// Switch trigger mode on both channels
    ///
    /// Gate mode silences the dry path (a closed gate passes the input
    /// through the loopers instead) and follows the current gate; trigger
    /// mode stops playback until the next trigger; loop mode starts it.
    pub fn set_trigger_mode(&mut self, mode: TriggerMode) {
        for looper in self.loopers.iter_mut() {
            looper.set_trigger_mode(mode);
        }
        match mode {
            TriggerMode::Gate => {
                self.dry_level = 0.0;
                if self.loopers[0].is_gate_open() {
                    self.request_restart();
                } else {
                    self.request_stop();
                }
            }
            TriggerMode::Trigger => {
                self.dry_level = 1.0;
                self.request_stop();
            }
            TriggerMode::Loop => {
                self.dry_level = 1.0;
                self.request_start();
            }
        }
    }

    // Transport requests: the most recent one cancels any opposing request
    // still being retried.

    fn request_start(&mut self) {
        self.pending.start = true;
        self.pending.stop = false;
    }

    fn request_stop(&mut self) {
        self.pending.stop = true;
        self.pending.start = false;
        self.pending.restart = false;
    }

    fn request_restart(&mut self) {
        self.pending.restart = true;
        self.pending.stop = false;
    }

    pub fn set_samples_to_fade(&mut self, samples: i32) -> i32 {
        let mut applied = samples;
        for looper in self.loopers.iter_mut() {
            applied = looper.set_samples_to_fade(samples);
        }
        applied
    }

    // ─────────────────────────────────────────────────────────────
    // Processing
    // ─────────────────────────────────────────────────────────────

    /// Process a block of frames in place, then publish state for the UI
    pub fn process_block(&mut self, frames: &mut [StereoSample]) {
        for frame in frames.iter_mut() {
            *frame = self.process_frame(*frame);
        }
        self.publish_state();
    }

    /// Process one stereo frame
    pub fn process_frame(&mut self, input: StereoSample) -> StereoSample {
        let dry = [
            self.saturator.process(input.left * self.gain),
            self.saturator.process(input.right * self.gain),
        ];

        match self.phase {
            LooperPhase::Startup => {
                self.startup_counter += 1;
                if self.startup_counter >= self.startup_samples {
                    self.startup_counter = 0;
                    self.phase = LooperPhase::Buffering;
                }
                StereoSample::new(dry[0], dry[1])
            }
            LooperPhase::Buffering => {
                self.apply_clear_and_reset();
                let done_left = self.loopers[0].buffer(dry[0]);
                let done_right = self.loopers[1].buffer(dry[1]);
                if (done_left && done_right) || self.pending.stop_buffering {
                    self.finish_buffering();
                }
                StereoSample::new(dry[0], dry[1])
            }
            LooperPhase::Ready => {
                self.apply_clear_and_reset();
                if self.phase == LooperPhase::Ready {
                    self.latch_targets();
                    if self.auto_start || self.pending.begin {
                        self.begin_recording();
                    }
                }
                StereoSample::new(dry[0], dry[1])
            }
            LooperPhase::Recording | LooperPhase::Frozen => self.process_running(dry),
        }
    }

    fn process_running(&mut self, dry: [f32; NUM_CHANNELS]) -> StereoSample {
        self.apply_clear_and_reset();
        if !self.phase.is_running() {
            return StereoSample::new(dry[0], dry[1]);
        }
        self.apply_transport();
        self.update_parameters();

        let filter_active = self.filter_cutoff >= FILTER_ACTIVE_HZ;
        let mut wet = [0.0f32; NUM_CHANNELS];

        for ch in 0..NUM_CHANNELS {
            let scaled_dry = dry[ch] * self.dry_level;
            let mut channel_wet = self.loopers[ch].read(dry[ch]);
            let mut feedback = channel_wet * self.feedback;

            if filter_active {
                if self.freeze > 0.0 {
                    let filtered = filter(&mut self.output_filters[ch], self.filter_mode, channel_wet);
                    channel_wet = self.mix_signals(channel_wet, filtered * self.freeze);
                }
                if self.freeze < 1.0 {
                    let filtered =
                        filter(&mut self.feedback_filters[ch], self.filter_mode, scaled_dry);
                    feedback = self.mix_signals(feedback, filtered * (1.0 - self.freeze));
                }
            }

            let recorded = self.mix_signals(scaled_dry, feedback);
            self.loopers[ch].write(recorded);
            wet[ch] = channel_wet;
        }

        for looper in self.loopers.iter_mut() {
            looper.advance_read();
        }
        for looper in self.loopers.iter_mut() {
            looper.advance_write();
        }
        for looper in self.loopers.iter_mut() {
            looper.handle_fade();
        }

        let mono = (wet[0] + wet[1]) * 0.5;
        let image = self.stereo_image;
        let wet_left = wet[0] * image + mono * (1.0 - image);
        let wet_right = wet[1] * image + mono * (1.0 - image);

        StereoSample::new(
            self.crossfade.process(dry[0] * self.dry_level, wet_left),
            self.crossfade.process(dry[1] * self.dry_level, wet_right),
        )
    }

    #[inline]
    fn mix_signals(&self, a: f32, b: f32) -> f32 {
        self.saturator.process(a + b)
    }

    fn apply_clear_and_reset(&mut self) {
        if self.pending.clear {
            self.pending.clear = false;
            for looper in self.loopers.iter_mut() {
                looper.clear_buffer();
            }
        }
        if self.pending.reset {
            self.reset();
        }
    }

    /// Drop the capture and go back to buffering
    fn reset(&mut self) {
        let mode = self.loopers[0].trigger_mode();
        let movement = self.loopers[0].movement();
        for looper in self.loopers.iter_mut() {
            looper.reset();
            looper.set_trigger_mode(mode);
            looper.set_movement(movement);
        }
        for filter in self
            .feedback_filters
            .iter_mut()
            .chain(self.output_filters.iter_mut())
        {
            filter.reset();
        }
        let write_rate = self.pending.write_rate;
        self.pending = PendingRequests {
            write_rate,
            ..PendingRequests::default()
        };
        self.phase = LooperPhase::Buffering;
    }

    fn finish_buffering(&mut self) {
        self.pending.stop_buffering = false;
        for looper in self.loopers.iter_mut() {
            looper.stop_buffering();
        }
        self.phase = LooperPhase::Ready;
        self.latch_targets();
    }

    /// The captured region becomes the loop at the default read rate
    fn latch_targets(&mut self) {
        let rate = self.default_read_rate;
        for (looper, targets) in self.loopers.iter_mut().zip(self.targets.iter_mut()) {
            looper.set_read_rate(rate);
            targets.latch(looper.loop_start(), looper.loop_length(), rate);
        }
    }

    fn begin_recording(&mut self) {
        self.pending.begin = false;
        self.phase = LooperPhase::Recording;
        self.set_freeze(self.freeze);
    }

    /// Start/stop/restart and write-rate requests
    fn apply_transport(&mut self) {
        if self.pending.restart {
            self.pending.restart = false;
            for looper in self.loopers.iter_mut() {
                if looper.trigger_mode() == TriggerMode::Gate {
                    looper.restart(false);
                } else {
                    looper.trigger();
                }
            }
        }

        if self.pending.start {
            let done_left = self.loopers[0].start();
            let done_right = self.loopers[1].start();
            if done_left && done_right {
                self.pending.start = false;
            }
        }

        if self.pending.stop {
            let done_left = self.loopers[0].stop();
            let done_right = self.loopers[1].stop();
            if done_left && done_right {
                self.pending.stop = false;
            }
        }

        for (looper, rate) in self
            .loopers
            .iter_mut()
            .zip(self.pending.write_rate.iter_mut())
        {
            if let Some(rate) = rate.take() {
                looper.set_write_rate(rate);
            }
        }
    }

    /// Glide every channel toward its targets
    fn update_parameters(&mut self) {
        for (looper, targets) in self.loopers.iter_mut().zip(self.targets.iter_mut()) {
            let length = targets.loop_length.tick().round() as i32;
            if length != looper.loop_length() {
                looper.set_loop_length(length);
            }

            let start = targets.loop_start.tick().round() as i32;
            if start != looper.loop_start() {
                looper.set_loop_start(start);
            }

            let rate = targets.read_rate.tick();
            if rate != looper.read_rate() {
                looper.set_read_rate(rate);
            }
        }
    }

    /// Publish a snapshot for lock-free readers
    pub fn publish_state(&self) {
        let atomics = &self.atomics;
        atomics.phase.store(self.phase as u8, Ordering::Relaxed);
        atomics
            .freeze
            .store(self.freeze.to_bits(), Ordering::Relaxed);

        for (looper, published) in self.loopers.iter().zip(atomics.channels.iter()) {
            published
                .read_position
                .store(looper.read_position().max(0.0) as u64, Ordering::Relaxed);
            published
                .write_position
                .store(looper.write_position().max(0) as u64, Ordering::Relaxed);
            published
                .loop_start
                .store(looper.loop_start().max(0) as u64, Ordering::Relaxed);
            published
                .loop_length
                .store(looper.loop_length().max(0) as u64, Ordering::Relaxed);
            published
                .buffered
                .store(looper.buffered().max(0) as u64, Ordering::Relaxed);
            published
                .read_rate
                .store((looper.read_rate() as f32).to_bits(), Ordering::Relaxed);
            published
                .forward
                .store(looper.direction() == Direction::Forward, Ordering::Relaxed);
            published.playing.store(looper.is_playing(), Ordering::Relaxed);
        }
    }
}

impl<'a, F, C, S> StereoLooper<'a, F, C, S>
where
    F: ResonantFilter,
    C: Crossfader,
    S: Saturator,
{
    /// Lock-free state handle for a UI thread
    pub fn atomics(&self) -> Arc<LooperAtomics> {
        Arc::clone(&self.atomics)
    }

    pub fn phase(&self) -> LooperPhase {
        self.phase
    }
    pub fn is_running(&self) -> bool {
        self.phase.is_running()
    }
    pub fn is_frozen(&self) -> bool {
        self.phase == LooperPhase::Frozen
    }
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
    pub fn gain(&self) -> f32 {
        self.gain
    }
    pub fn mix(&self) -> f32 {
        self.mix
    }
    pub fn feedback(&self) -> f32 {
        self.feedback
    }
    pub fn stereo_image(&self) -> f32 {
        self.stereo_image
    }
    pub fn freeze(&self) -> f32 {
        self.freeze
    }
    pub fn dry_level(&self) -> f32 {
        self.dry_level
    }
    pub fn filter_cutoff(&self) -> f32 {
        self.filter_cutoff
    }
    pub fn filter_mode(&self) -> FilterMode {
        self.filter_mode
    }
    pub fn trigger_mode(&self) -> TriggerMode {
        self.loopers[0].trigger_mode()
    }
    pub fn looper(&self, channel: Channel) -> &ChannelLooper<'a> {
        &self.loopers[channel.index()]
    }
}

#[inline]
fn filter<F: ResonantFilter>(filter: &mut F, mode: FilterMode, value: f32) -> f32 {
    filter.process(value);
    filter.output(mode)
}

#[inline]
fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Clamp into `[0, max]`, mapping NaN to 0
#[inline]
fn clamp_unit_scaled(value: f32, max: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max)
}

#[inline]
fn clamp_read_rate(rate: f32) -> f64 {
    if rate.is_nan() {
        return 1.0;
    }
    (rate as f64).clamp(MIN_RATE, MAX_RATE)
}
