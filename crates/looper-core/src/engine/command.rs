//! Lock-free command queue for the looper engine
//!
//! The control thread pushes [`LooperCommand`]s into a bounded `rtrb`
//! ringbuffer; the audio thread drains it at the start of every block with
//! [`StereoLooper::process_commands`](super::StereoLooper::process_commands).
//!
//! Two kinds of commands travel through the queue:
//! - **Parameters** (levels, loop targets, modes) are clamped and stored
//!   as targets right away; smoothing takes care of the rest.
//! - **One-shots** (clear, reset, start...) raise a pending flag that the
//!   next processed frame consumes. Repeating a one-shot before it has been
//!   consumed is the same as sending it once.
//!
//! # Usage
//!
//! ```ignore
//! let (mut tx, mut rx) = command_channel();
//!
//! // Control thread (never blocks)
//! tx.push(LooperCommand::SetFreeze(1.0))?;
//!
//! // Audio thread, once per block
//! looper.process_commands(&mut rx);
//! looper.process_block(&mut frames);
//! ```

use super::boundary::{Direction, Movement};
use super::looper::TriggerMode;
use crate::dsp::FilterMode;
use crate::types::ChannelSelect;

/// Commands sent from the control thread to the audio thread
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LooperCommand {
    // ─────────────────────────────────────────────────────────────
    // Levels
    // ─────────────────────────────────────────────────────────────
    /// Input gain before the soft clipper
    SetGain(f32),
    /// Dry/wet balance (0.0 = dry, 1.0 = wet)
    SetMix(f32),
    /// Amount of the wet signal fed back into the buffer
    SetFeedback(f32),
    /// 1.0 = full stereo, 0.0 = mono
    SetStereoImage(f32),
    /// At 0.5 and above the loop is frozen (writing stops)
    SetFreeze(f32),

    // ─────────────────────────────────────────────────────────────
    // Filter
    // ─────────────────────────────────────────────────────────────
    /// Cutoff in Hz; below 20Hz the filter path is bypassed
    SetFilterCutoff(f32),
    SetFilterResonance(f32),
    SetFilterMode(FilterMode),

    // ─────────────────────────────────────────────────────────────
    // Per-channel loop targets (smoothed)
    // ─────────────────────────────────────────────────────────────
    SetLoopStart { channel: ChannelSelect, samples: f32 },
    SetLoopLength { channel: ChannelSelect, samples: f32 },
    SetReadRate { channel: ChannelSelect, rate: f32 },

    // ─────────────────────────────────────────────────────────────
    // Modes
    // ─────────────────────────────────────────────────────────────
    SetMovement { channel: ChannelSelect, movement: Movement },
    SetDirection { channel: ChannelSelect, direction: Direction },
    /// Also queues the transport action that goes with the mode
    SetTriggerMode(TriggerMode),
    /// Gate input for [`TriggerMode::Gate`]
    SetGate(bool),
    SetSamplesToFade(i32),

    // ─────────────────────────────────────────────────────────────
    // One-shots
    // ─────────────────────────────────────────────────────────────
    /// Zero both channel buffers
    ClearBuffer,
    /// Drop the capture and start buffering again
    ResetLooper,
    /// End the initial capture early
    StopBuffering,
    /// Leave the ready phase, or resume playback while running
    Start,
    Stop,
    /// Restart playback from the loop start
    Restart,
    /// Change the write head speed; the last value before the drain wins
    SetWriteRate { channel: ChannelSelect, rate: f32 },
}

/// Command queue capacity
///
/// Commands are small and drained every block; this leaves plenty of room
/// for a burst of knob movements between two audio callbacks.
pub const COMMAND_QUEUE_CAPACITY: usize = 256;

/// Create a new command channel (producer/consumer pair)
///
/// The producer belongs to the control thread, the consumer to the audio
/// thread. The channel holds up to [`COMMAND_QUEUE_CAPACITY`] commands; a
/// full queue is reported to the producer by `push`.
pub fn command_channel() -> (rtrb::Producer<LooperCommand>, rtrb::Consumer<LooperCommand>) {
    rtrb::RingBuffer::new(COMMAND_QUEUE_CAPACITY)
}

/// Command sender for the control thread
///
/// Wraps the lock-free producer; never blocks.
pub struct CommandSender {
    producer: rtrb::Producer<LooperCommand>,
}

impl CommandSender {
    pub fn new(producer: rtrb::Producer<LooperCommand>) -> Self {
        Self { producer }
    }

    /// Queue a command
    ///
    /// Returns `Err(cmd)` if the queue is full (command is returned).
    pub fn send(&mut self, cmd: LooperCommand) -> Result<(), LooperCommand> {
        self.producer.push(cmd).map_err(|e| match e {
            rtrb::PushError::Full(value) => value,
        })
    }

    /// Check if the queue has space for more commands
    pub fn has_space(&self) -> bool {
        self.producer.slots() > 0
    }
}
