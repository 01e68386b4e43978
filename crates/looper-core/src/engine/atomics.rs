//! Lock-free looper state for UI access
//!
//! The audio thread publishes a snapshot once per block; a UI thread holding
//! an `Arc<LooperAtomics>` can read it at any time without touching the
//! engine. All operations use `Ordering::Relaxed` since only visibility is
//! needed, not synchronization with other memory operations.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};

use super::stereo::LooperPhase;
use crate::types::{Channel, NUM_CHANNELS};

/// Published state of one channel
pub struct ChannelAtomics {
    /// Read head position in samples
    pub read_position: AtomicU64,
    /// Write head position in samples
    pub write_position: AtomicU64,
    pub loop_start: AtomicU64,
    pub loop_length: AtomicU64,
    /// Captured length in samples
    pub buffered: AtomicU64,
    /// Read rate as `f32` bits
    pub read_rate: AtomicU32,
    pub forward: AtomicBool,
    pub playing: AtomicBool,
}

impl ChannelAtomics {
    pub fn new() -> Self {
        Self {
            read_position: AtomicU64::new(0),
            write_position: AtomicU64::new(0),
            loop_start: AtomicU64::new(0),
            loop_length: AtomicU64::new(0),
            buffered: AtomicU64::new(0),
            read_rate: AtomicU32::new(1.0f32.to_bits()),
            forward: AtomicBool::new(true),
            playing: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn read_position(&self) -> u64 {
        self.read_position.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_position(&self) -> u64 {
        self.write_position.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn loop_start(&self) -> u64 {
        self.loop_start.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn loop_length(&self) -> u64 {
        self.loop_length.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn buffered(&self) -> u64 {
        self.buffered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn read_rate(&self) -> f32 {
        f32::from_bits(self.read_rate.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn is_forward(&self) -> bool {
        self.forward.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }
}

impl Default for ChannelAtomics {
    fn default() -> Self {
        Self::new()
    }
}

/// Published state of the whole looper
pub struct LooperAtomics {
    /// Engine phase (see [`LooperPhase`])
    pub phase: AtomicU8,
    /// Freeze amount as `f32` bits
    pub freeze: AtomicU32,
    pub channels: [ChannelAtomics; NUM_CHANNELS],
}

impl LooperAtomics {
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(LooperPhase::Startup as u8),
            freeze: AtomicU32::new(0.0f32.to_bits()),
            channels: [ChannelAtomics::new(), ChannelAtomics::new()],
        }
    }

    /// Get the engine phase (lock-free)
    #[inline]
    pub fn phase(&self) -> LooperPhase {
        LooperPhase::from_u8(self.phase.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn freeze(&self) -> f32 {
        f32::from_bits(self.freeze.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn channel(&self, channel: Channel) -> &ChannelAtomics {
        &self.channels[channel.index()]
    }
}

impl Default for LooperAtomics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let atomics = LooperAtomics::new();
        assert_eq!(atomics.phase(), LooperPhase::Startup);
        assert_eq!(atomics.freeze(), 0.0);
        assert_eq!(atomics.channel(Channel::Left).read_rate(), 1.0);
        assert!(atomics.channel(Channel::Right).is_forward());
    }

    #[test]
    fn test_phase_round_trip() {
        let atomics = LooperAtomics::new();
        atomics
            .phase
            .store(LooperPhase::Frozen as u8, Ordering::Relaxed);
        assert_eq!(atomics.phase(), LooperPhase::Frozen);
    }
}
