//! Common types for the looper core
//!
//! Fundamental audio types shared by the engine, the DSP collaborators and the
//! offline renderer: stereo frames, frame buffers and channel addressing.

use std::ops::{Index, IndexMut};

/// Default sample rate (48kHz). Hosts pass their actual rate to the engine.
pub const SAMPLE_RATE: u32 = 48000;

/// Number of looper channels (left and right)
pub const NUM_CHANNELS: usize = 2;

/// Audio sample type
pub type Sample = f32;

/// One of the two looper channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Channel {
    Left = 0,
    Right = 1,
}

impl Channel {
    /// Both channels in processing order
    pub const ALL: [Channel; NUM_CHANNELS] = [Channel::Left, Channel::Right];

    /// Convert from index (0-1) to Channel
    pub fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(Channel::Left),
            1 => Some(Channel::Right),
            _ => None,
        }
    }

    /// Index into per-channel arrays
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            Channel::Left => "Left",
            Channel::Right => "Right",
        }
    }
}

/// Channel addressing for control-surface setters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelSelect {
    Left,
    Right,
    Both,
}

impl ChannelSelect {
    /// Whether this selection addresses the given channel
    #[inline]
    pub fn includes(self, channel: Channel) -> bool {
        match self {
            ChannelSelect::Both => true,
            ChannelSelect::Left => channel == Channel::Left,
            ChannelSelect::Right => channel == Channel::Right,
        }
    }
}

impl From<Channel> for ChannelSelect {
    fn from(channel: Channel) -> Self {
        match channel {
            Channel::Left => ChannelSelect::Left,
            Channel::Right => ChannelSelect::Right,
        }
    }
}

/// A single stereo frame (left and right channels)
///
/// `#[repr(C)]` keeps the layout [left, right] so `&[StereoSample]` can be
/// viewed as interleaved `&[f32]` without copying.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StereoSample {
    pub left: Sample,
    pub right: Sample,
}

impl StereoSample {
    #[inline]
    pub fn new(left: Sample, right: Sample) -> Self {
        Self { left, right }
    }

    #[inline]
    pub fn silence() -> Self {
        Self::default()
    }

    /// Same value in both channels
    #[inline]
    pub fn mono(value: Sample) -> Self {
        Self { left: value, right: value }
    }

    /// Read one channel of the frame
    #[inline]
    pub fn get(&self, channel: Channel) -> Sample {
        match channel {
            Channel::Left => self.left,
            Channel::Right => self.right,
        }
    }

    /// Peak amplitude (max of abs(left), abs(right))
    #[inline]
    pub fn peak(&self) -> Sample {
        self.left.abs().max(self.right.abs())
    }
}

impl std::ops::Add for StereoSample {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            left: self.left + other.left,
            right: self.right + other.right,
        }
    }
}

impl std::ops::Mul<Sample> for StereoSample {
    type Output = Self;

    #[inline]
    fn mul(self, factor: Sample) -> Self {
        Self {
            left: self.left * factor,
            right: self.right * factor,
        }
    }
}

/// A buffer of stereo frames
///
/// Used by block processing and the offline renderer. The per-channel loop
/// storage is NOT a `StereoBuffer`: each channel owns a plain `[f32]` so the
/// two channels can be borrowed independently.
#[derive(Debug, Clone, Default)]
pub struct StereoBuffer {
    samples: Vec<StereoSample>,
}

impl StereoBuffer {
    /// Create a buffer filled with silence
    pub fn silence(len: usize) -> Self {
        Self {
            samples: vec![StereoSample::silence(); len],
        }
    }

    /// Create a buffer from interleaved samples [L, R, L, R, ...]
    pub fn from_interleaved(interleaved: &[Sample]) -> Self {
        assert!(interleaved.len() % 2 == 0, "Interleaved buffer must have even length");
        let samples = interleaved
            .chunks_exact(2)
            .map(|chunk| StereoSample::new(chunk[0], chunk[1]))
            .collect();
        Self { samples }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[StereoSample] {
        &self.samples
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [StereoSample] {
        &mut self.samples
    }

    /// Zero-copy view of the frames as interleaved f32 [L, R, L, R, ...]
    #[inline]
    pub fn as_interleaved(&self) -> &[Sample] {
        bytemuck::cast_slice(&self.samples)
    }

    /// Peak amplitude in the buffer
    pub fn peak(&self) -> Sample {
        self.samples.iter().map(|s| s.peak()).fold(0.0, Sample::max)
    }
}

impl Index<usize> for StereoBuffer {
    type Output = StereoSample;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.samples[index]
    }
}

impl IndexMut<usize> for StereoBuffer {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.samples[index]
    }
}
